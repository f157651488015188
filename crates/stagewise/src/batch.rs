//! The unit of work handed to the scheduler.

use std::ops::Range;
use crate::backend::Backend;
use crate::error::{PipelineError, Result};
use crate::tensor::operations::{batch_size, sequence_length, slice_batch};

/// Attention mask accompanying a batch.
#[derive(Debug, Clone)]
pub enum AttentionMask<B> {
    /// One mask broadcast over every sample; never sliced.
    Shared(B),
    /// One mask per sample, leading dimension is the batch dimension.
    PerSample(B),
}

impl<B> AttentionMask<B> {
    pub fn tensor(&self) -> &B {
        match self {
            AttentionMask::Shared(mask) | AttentionMask::PerSample(mask) => mask,
        }
    }
}

/// A rectangular batch: `tokens` of shape `(batch, seq, ..)` with position ids
/// sharing the same batch and sequence dimensions.
#[derive(Debug, Clone)]
pub struct Batch<B> {
    tokens: B,
    position_ids: B,
    attention_mask: Option<AttentionMask<B>>,
}

impl<B> Batch<B>
where B: Backend
{
    pub fn new(tokens: B, position_ids: B, attention_mask: Option<AttentionMask<B>>) -> Result<Self> {
        let token_shape = tokens.shape();
        if token_shape.len() < 2 {
            return Err(PipelineError::shape_mismatch("tokens (batch, seq, ..)", &[0, 0], &token_shape));
        }
        let position_shape = position_ids.shape();
        if position_shape.len() < 2 || position_shape[..2] != token_shape[..2] {
            return Err(PipelineError::shape_mismatch("position ids", &token_shape[..2], &position_shape));
        }
        if let Some(AttentionMask::PerSample(mask)) = &attention_mask {
            if batch_size(mask) != token_shape[0] {
                return Err(PipelineError::shape_mismatch("per-sample attention mask", &token_shape[..1], &mask.shape()));
            }
        }
        Ok(Self { tokens, position_ids, attention_mask })
    }

    pub fn tokens(&self) -> &B {
        &self.tokens
    }

    pub fn position_ids(&self) -> &B {
        &self.position_ids
    }

    pub fn attention_mask(&self) -> Option<&AttentionMask<B>> {
        self.attention_mask.as_ref()
    }

    pub fn batch_size(&self) -> usize {
        batch_size(&self.tokens)
    }

    pub fn sequence_length(&self) -> usize {
        sequence_length(&self.tokens)
    }

    /// Rows `range` of this batch. Shared masks are carried over untouched.
    pub fn narrow(&self, range: &Range<usize>) -> Result<Self> {
        let attention_mask = match &self.attention_mask {
            None => None,
            Some(AttentionMask::Shared(mask)) => Some(AttentionMask::Shared(mask.clone())),
            Some(AttentionMask::PerSample(mask)) => Some(AttentionMask::PerSample(slice_batch(mask, range)?)),
        };
        Ok(Self {
            tokens: slice_batch(&self.tokens, range)?,
            position_ids: slice_batch(&self.position_ids, range)?,
            attention_mask,
        })
    }
}
