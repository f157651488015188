//! Splitting a batch into contiguous micro-batches.

use std::ops::Range;
use crate::error::{PipelineError, Result};

/// Contiguous, non-overlapping row ranges covering `[0, batch_size)`.
///
/// Every range is `micro_batch_size` long except possibly the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicroBatchPlan {
    batch_size: usize,
    micro_batch_size: usize,
}

impl MicroBatchPlan {
    pub fn new(batch_size: usize, micro_batch_size: usize) -> Result<Self> {
        if micro_batch_size == 0 {
            return Err(PipelineError::Configuration(
                "micro-batch size must be at least 1".to_string()
            ));
        }
        Ok(Self { batch_size, micro_batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn micro_batch_size(&self) -> usize {
        self.micro_batch_size
    }

    /// Number of micro-batches, counting a short tail.
    pub fn len(&self) -> usize {
        self.batch_size.div_ceil(self.micro_batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.batch_size == 0
    }

    /// Whether `range` is shorter than a full micro-batch.
    pub fn is_short(&self, range: &Range<usize>) -> bool {
        range.len() != self.micro_batch_size
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.batch_size)
            .step_by(self.micro_batch_size)
            .map(|start| start..(start + self.micro_batch_size).min(self.batch_size))
    }
}
