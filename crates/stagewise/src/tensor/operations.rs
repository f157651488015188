use std::ops::Range;
use crate::backend::Backend;
use crate::error::{PipelineError, Result};
use super::constant::{BATCH_DIM, SEQ_DIM};

/// Size of the batch dimension, `0` for a rank-0 tensor
pub(crate) fn batch_size<B>(tensor: &B) -> usize
where B: Backend
{
    tensor.shape().get(BATCH_DIM).copied().unwrap_or(0)
}

/// Size of the sequence dimension, `0` if the tensor has none
pub(crate) fn sequence_length<B>(tensor: &B) -> usize
where B: Backend
{
    tensor.shape().get(SEQ_DIM).copied().unwrap_or(0)
}

/// Take rows `range` of `tensor` along the batch dimension.
pub(crate) fn slice_batch<B>(tensor: &B, range: &Range<usize>) -> Result<B>
where B: Backend
{
    tensor.slice(BATCH_DIM, range.start, range.len())
}

/// Write `rows` into `tensor` starting at batch row `start`.
pub(crate) fn assign_batch_rows<B>(tensor: &B, start: usize, rows: &B) -> Result<B>
where B: Backend
{
    let shape = tensor.shape();
    let row_shape = rows.shape();
    let mut expected = shape.clone();
    if let Some(first) = expected.first_mut() {
        *first = batch_size(rows);
    }
    if row_shape != expected || start + batch_size(rows) > batch_size(tensor) {
        return Err(PipelineError::shape_mismatch("batch rows", &expected, &row_shape));
    }
    tensor.slice_assign(BATCH_DIM, start, rows)
}
