//! Terminal-stage logits assembled one micro-batch at a time.

use std::ops::Range;
use crate::backend::Backend;
use crate::config::DType;
use crate::error::{PipelineError, Result};
use crate::tensor::operations::{assign_batch_rows, batch_size};

/// Logits are always gathered in `f32`, whatever the model computes in.
pub const LOGITS_DTYPE: DType = DType::F32;

/// A `(batch, seq, vocab)` tensor filled by disjoint row ranges.
#[derive(Debug)]
pub struct LogitsBuffer<B> {
    tensor: B,
}

impl<B> LogitsBuffer<B>
where B: Backend
{
    pub fn new(batch_size: usize, sequence_length: usize, vocab_size: usize, device: &B::Device) -> Result<Self> {
        let tensor = B::empty(&[batch_size, sequence_length, vocab_size], LOGITS_DTYPE, device)?;
        Ok(Self { tensor })
    }

    pub fn shape(&self) -> Vec<usize> {
        self.tensor.shape()
    }

    /// Copy one micro-batch's logits into rows `range`.
    pub fn write_rows(&mut self, range: &Range<usize>, logits: &B) -> Result<()> {
        if batch_size(logits) != range.len() {
            let mut expected = self.tensor.shape();
            if let Some(rows) = expected.first_mut() {
                *rows = range.len();
            }
            return Err(PipelineError::shape_mismatch("micro-batch logits", &expected, &logits.shape()));
        }
        let logits = logits.to_dtype(LOGITS_DTYPE)?;
        self.tensor = assign_batch_rows(&self.tensor, range.start, &logits)?;
        Ok(())
    }

    pub fn into_inner(self) -> B {
        self.tensor
    }
}
