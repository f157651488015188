//! Receive buffers for activations arriving from the previous stage.

use crate::backend::Backend;
use crate::config::DType;
use crate::error::{PipelineError, Result};
use crate::tensor::constant::{HANDOFF_BATCH_DIM, HANDOFF_HIDDEN_DIM, HANDOFF_SEQ_DIM};

/// A `(seq, batch, hidden)` tensor the transport receives into.
#[derive(Debug, Clone)]
pub struct HandoffBuffer<B> {
    tensor: B,
}

impl<B> HandoffBuffer<B>
where B: Backend
{
    pub fn new(tensor: B) -> Self {
        Self { tensor }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.tensor.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.tensor.numel() == 0
    }

    pub fn tensor(&self) -> &B {
        &self.tensor
    }

    pub fn tensor_mut(&mut self) -> &mut B {
        &mut self.tensor
    }

    pub fn into_inner(self) -> B {
        self.tensor
    }

    /// Fail unless this buffer can hold activations for `batch_size` rows of
    /// width `hidden_size`. The sequence dimension is left to the caller,
    /// it may legitimately differ from the tokens' length.
    pub fn check_fits(&self, batch_size: usize, hidden_size: usize) -> Result<()> {
        let shape = self.shape();
        let fits = shape.len() == 3
            && shape[HANDOFF_BATCH_DIM] == batch_size
            && shape[HANDOFF_HIDDEN_DIM] == hidden_size;
        if fits {
            Ok(())
        } else {
            let seq = shape.get(HANDOFF_SEQ_DIM).copied().unwrap_or(0);
            Err(PipelineError::shape_mismatch("handoff buffer", &[seq, batch_size, hidden_size], &shape))
        }
    }
}

/// Decides whether this stage needs a receive buffer, and of what shape and dtype.
#[derive(Debug, Clone)]
pub struct BufferAllocator<B: Backend> {
    first_stage: bool,
    hidden_size: usize,
    dtype: DType,
    device: B::Device,
}

impl<B> BufferAllocator<B>
where B: Backend
{
    /// `dtype` is the already-resolved hand-off dtype,
    /// see [`PipelineConfig::handoff_dtype`](crate::config::PipelineConfig::handoff_dtype).
    pub fn new(first_stage: bool, hidden_size: usize, dtype: DType, device: B::Device) -> Self {
        Self { first_stage, hidden_size, dtype, device }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// `None` on the first stage, which has no predecessor to receive from.
    pub fn allocate(&self, batch_size: usize, sequence_length: usize) -> Result<Option<HandoffBuffer<B>>> {
        if self.first_stage {
            return Ok(None);
        }
        let shape = [sequence_length, batch_size, self.hidden_size];
        let tensor = B::empty(&shape, self.dtype, &self.device)?;
        Ok(Some(HandoffBuffer::new(tensor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock_tensor::MockTensor;

    #[test]
    fn test_first_stage_never_allocates() {
        let allocator = BufferAllocator::<MockTensor>::new(true, 8, DType::F32, ());
        for (b, s) in [(0, 0), (1, 1), (2, 5), (64, 2048)] {
            assert!(allocator.allocate(b, s).unwrap().is_none());
        }
    }

    #[test]
    fn test_allocates_seq_major_shape() {
        let allocator = BufferAllocator::<MockTensor>::new(false, 8, DType::BF16, ());
        let buffer = allocator.allocate(2, 5).unwrap().unwrap();
        assert_eq!(buffer.shape(), vec![5, 2, 8]);
        assert_eq!(buffer.tensor().dtype, DType::BF16);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_zero_rows_allocates_empty_buffer() {
        let allocator = BufferAllocator::<MockTensor>::new(false, 8, DType::F32, ());
        let buffer = allocator.allocate(0, 5).unwrap().unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_check_fits() {
        let buffer = HandoffBuffer::new(MockTensor::filled(vec![5, 4, 8], 0.));
        assert!(buffer.check_fits(4, 8).is_ok());

        let err = buffer.check_fits(2, 8).unwrap_err();
        match err {
            PipelineError::ShapeMismatch { expected, actual, .. } => {
                assert_eq!(expected, vec![5, 2, 8]);
                assert_eq!(actual, vec![5, 4, 8]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(buffer.check_fits(4, 16).is_err());
    }

    #[test]
    fn test_check_fits_ignores_sequence_dim() {
        let buffer = HandoffBuffer::new(MockTensor::filled(vec![9, 4, 8], 0.));
        assert!(buffer.check_fits(4, 8).is_ok());

        let flat = HandoffBuffer::new(MockTensor::filled(vec![4, 8], 0.));
        match flat.check_fits(4, 8).unwrap_err() {
            PipelineError::ShapeMismatch { expected, .. } => assert_eq!(expected, vec![4, 4, 8]),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
