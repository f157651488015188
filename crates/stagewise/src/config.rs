//! # Pipeline configuration
//!
//! Everything the scheduler needs to know about the surrounding system is
//! gathered into one [`PipelineConfig`], built once and handed to
//! [`BatchScheduler::new`](crate::scheduler::BatchScheduler::new).
//!
//! The struct is serde-friendly so an engine can load it next to the rest of
//! its settings. The chunking threshold keeps the conventional integer form on
//! the wire, where `-1` disables chunking:
//!
//! ```rust
//! use stagewise::config::{ChunkThreshold, PipelineConfig};
//!
//! let config: PipelineConfig = serde_json::from_str(r#"{
//!     "pipeline_degree": 4,
//!     "chunk_threshold": 512,
//!     "hidden_size": 4096,
//!     "vocab_size": 32000
//! }"#).unwrap();
//!
//! assert_eq!(config.chunk_threshold.tokens(), Some(512));
//! assert_eq!(ChunkThreshold::try_from(-1).unwrap(), ChunkThreshold::Disabled);
//! ```

use std::num::NonZeroUsize;
use serde::{Deserialize, Serialize};
use crate::error::{PipelineError, Result};

/// Raw threshold value that turns micro-batch chunking off.
pub const CHUNKING_DISABLED: i64 = -1;

/// Element type of an allocated tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F16,
    BF16,
    #[default]
    F32,
    F64,
}

/// Width of the residual stream flowing between stages.
///
/// With [`ResidualWidth::Fp32`] the hand-off buffers are always `f32`,
/// whatever the parameter dtype is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualWidth {
    #[default]
    Params,
    Fp32,
}

/// Where buffers get allocated. Resolved to a concrete backend device once,
/// see [`Backend::resolve_device`](crate::backend::Backend::resolve_device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSelection {
    #[default]
    Cpu,
    Cuda(usize),
    Metal(usize),
}

/// Upper bound on `batch_size * seq_len` before a step is split into
/// micro-batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ChunkThreshold {
    #[default]
    Disabled,
    Tokens(NonZeroUsize),
}

impl ChunkThreshold {
    /// An enabled threshold of `tokens` tokens. Zero is rejected.
    pub fn new(tokens: usize) -> Result<Self> {
        NonZeroUsize::new(tokens)
            .map(ChunkThreshold::Tokens)
            .ok_or_else(|| PipelineError::Configuration(
                "chunk threshold must be positive".to_string()
            ))
    }

    pub fn tokens(&self) -> Option<usize> {
        match self {
            ChunkThreshold::Disabled => None,
            ChunkThreshold::Tokens(n) => Some(n.get()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ChunkThreshold::Tokens(_))
    }
}

impl TryFrom<i64> for ChunkThreshold {
    type Error = PipelineError;

    fn try_from(raw: i64) -> Result<Self> {
        if raw == CHUNKING_DISABLED {
            return Ok(ChunkThreshold::Disabled);
        }
        if raw <= 0 {
            return Err(PipelineError::Configuration(format!(
                "chunk threshold must be positive or {CHUNKING_DISABLED}, got {raw}"
            )));
        }
        let tokens = usize::try_from(raw).map_err(|_| PipelineError::Configuration(
            format!("chunk threshold {raw} does not fit in usize")
        ))?;
        ChunkThreshold::new(tokens)
    }
}

impl From<ChunkThreshold> for i64 {
    fn from(threshold: ChunkThreshold) -> Self {
        match threshold {
            ChunkThreshold::Disabled => CHUNKING_DISABLED,
            ChunkThreshold::Tokens(n) => i64::try_from(n.get()).unwrap_or(i64::MAX),
        }
    }
}

fn default_pipeline_degree() -> usize {
    1
}

/// Static description of the pipeline this rank belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of pipeline stages.
    #[serde(default = "default_pipeline_degree")]
    pub pipeline_degree: usize,

    #[serde(default)]
    pub chunk_threshold: ChunkThreshold,

    /// Hidden dimension of the activations handed between stages.
    pub hidden_size: usize,

    /// Padded vocabulary size, the last dimension of the logits.
    pub vocab_size: usize,

    #[serde(default)]
    pub residual_width: ResidualWidth,

    #[serde(default)]
    pub param_dtype: DType,

    #[serde(default)]
    pub device: DeviceSelection,
}

impl PipelineConfig {
    /// A single-stage, unchunked, `f32` configuration on the CPU.
    pub fn new(hidden_size: usize, vocab_size: usize) -> Self {
        Self {
            pipeline_degree: default_pipeline_degree(),
            chunk_threshold: ChunkThreshold::Disabled,
            hidden_size,
            vocab_size,
            residual_width: ResidualWidth::default(),
            param_dtype: DType::default(),
            device: DeviceSelection::default(),
        }
    }

    pub fn with_pipeline_degree(mut self, pipeline_degree: usize) -> Self {
        self.pipeline_degree = pipeline_degree;
        self
    }

    pub fn with_chunk_threshold(mut self, chunk_threshold: ChunkThreshold) -> Self {
        self.chunk_threshold = chunk_threshold;
        self
    }

    pub fn with_residual_width(mut self, residual_width: ResidualWidth) -> Self {
        self.residual_width = residual_width;
        self
    }

    pub fn with_param_dtype(mut self, param_dtype: DType) -> Self {
        self.param_dtype = param_dtype;
        self
    }

    pub fn with_device(mut self, device: DeviceSelection) -> Self {
        self.device = device;
        self
    }

    /// Dtype of the buffers that receive activations from the previous stage.
    pub fn handoff_dtype(&self) -> DType {
        match self.residual_width {
            ResidualWidth::Fp32 => DType::F32,
            ResidualWidth::Params => self.param_dtype,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline_degree == 0 {
            return Err(PipelineError::Configuration(
                "pipeline degree must be at least 1".to_string()
            ));
        }
        if self.hidden_size == 0 {
            return Err(PipelineError::Configuration(
                "hidden size must be positive".to_string()
            ));
        }
        if self.vocab_size == 0 {
            return Err(PipelineError::Configuration(
                "vocab size must be positive".to_string()
            ));
        }
        Ok(())
    }
}
