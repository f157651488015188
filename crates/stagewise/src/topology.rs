//! Where this rank sits in the pipeline.

use crate::error::{PipelineError, Result};

/// Stage-identity oracle provided by the surrounding process group.
pub trait Topology: Send + Sync {
    fn is_first_stage(&self) -> Result<bool>;

    fn is_last_stage(&self) -> Result<bool>;

    fn pipeline_degree(&self) -> Result<usize>;
}

/// Topology of a fixed `rank` in a pipeline of `degree` stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticTopology {
    rank: usize,
    degree: usize,
}

impl StaticTopology {
    pub fn new(rank: usize, degree: usize) -> Result<Self> {
        if rank >= degree {
            return Err(PipelineError::Topology(format!(
                "rank {rank} out of bounds for pipeline of degree {degree}"
            )));
        }
        Ok(Self { rank, degree })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

impl Topology for StaticTopology {
    fn is_first_stage(&self) -> Result<bool> {
        Ok(self.rank == 0)
    }

    fn is_last_stage(&self) -> Result<bool> {
        Ok(self.rank + 1 == self.degree)
    }

    fn pipeline_degree(&self) -> Result<usize> {
        Ok(self.degree)
    }
}

/// Validated snapshot of a [`Topology`], taken once when a scheduler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePosition {
    first: bool,
    last: bool,
    degree: usize,
}

impl StagePosition {
    pub fn query<T>(topology: &T) -> Result<Self>
    where T: Topology + ?Sized
    {
        let first = topology.is_first_stage()?;
        let last = topology.is_last_stage()?;
        let degree = topology.pipeline_degree()?;

        if degree == 0 {
            return Err(PipelineError::Topology("pipeline degree reported as 0".to_string()));
        }
        if degree > 1 && first && last {
            return Err(PipelineError::Topology(format!(
                "rank reports itself both first and last stage of a {degree}-stage pipeline"
            )));
        }
        if degree == 1 && !(first && last) {
            return Err(PipelineError::Topology(
                "the only stage of a single-stage pipeline must be both first and last".to_string()
            ));
        }
        Ok(Self { first, last, degree })
    }

    pub fn is_first(&self) -> bool {
        self.first
    }

    pub fn is_last(&self) -> bool {
        self.last
    }

    pub fn degree(&self) -> usize {
        self.degree
    }
}
