use std::fmt::Debug;

/// Every failure the scheduler can surface.
///
/// None of these are retried at this layer: a failing micro-batch aborts the
/// whole step and the error is handed back to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("dtype mismatch for {what}: expected {expected}, got {actual}")]
    DTypeMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    #[error("topology error: {0}")]
    Topology(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("tensor error: {0}")]
    Tensor(String),
}

impl PipelineError {
    pub(crate) fn shape_mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn dtype_mismatch<D: Debug>(what: &'static str, expected: D, actual: D) -> Self {
        Self::DTypeMismatch {
            what,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }
}

#[cfg(feature = "candle")]
impl From<candle_core::Error> for PipelineError {
    fn from(err: candle_core::Error) -> Self {
        Self::Tensor(err.to_string())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
