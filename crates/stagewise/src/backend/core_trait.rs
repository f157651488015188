use std::fmt::Debug;
use crate::config::{DType, DeviceSelection};
use crate::error::Result;

/// The backend trait that must be fulfilled by any tensor type the scheduler drives.
///
/// Only the handful of operations needed to slice a batch, allocate hand-off
/// buffers and assemble logits are required. Everything else a model does with
/// its tensors stays behind the model's own forward.
pub trait Backend: Debug + Clone + Send + Sync + 'static {
    /// Element type as the backend reports it
    type DType: Debug + Copy + PartialEq + Send + Sync;

    /// Device handle tensors are allocated on
    type Device: Debug + Clone + Send + Sync + 'static;

    /// Resolve a configured device selection into a backend device
    fn resolve_device(selection: &DeviceSelection) -> Result<Self::Device>;

    /// Allocate a tensor of `shape`; the contents are unspecified
    fn empty(shape: &[usize], dtype: DType, device: &Self::Device) -> Result<Self>;

    /// Return the shape of this tensor
    fn shape(&self) -> Vec<usize>;

    /// Return the element type of this tensor
    fn dtype(&self) -> Self::DType;

    /// Return the total number of elements
    fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    /// Slice a given `dim` from `start` to `start + len`
    fn slice(&self, dim: usize, start: usize, len: usize) -> Result<Self>;

    /// Return a copy of this tensor where `src` overwrites the `dim` range starting at `start`
    fn slice_assign(&self, dim: usize, start: usize, src: &Self) -> Result<Self>;

    /// Cast to `dtype`
    fn to_dtype(&self, dtype: DType) -> Result<Self>;
}
