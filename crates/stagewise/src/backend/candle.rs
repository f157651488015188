use candle_core::{DType as CandleDType, Device, Tensor};
use super::Backend;
use crate::config::{DType, DeviceSelection};
use crate::error::{PipelineError, Result};

fn candle_dtype(dtype: DType) -> CandleDType {
    match dtype {
        DType::F16 => CandleDType::F16,
        DType::BF16 => CandleDType::BF16,
        DType::F32 => CandleDType::F32,
        DType::F64 => CandleDType::F64,
    }
}

impl Backend for Tensor {
    type DType = CandleDType;
    type Device = Device;

    fn resolve_device(selection: &DeviceSelection) -> Result<Self::Device> {
        let device = match selection {
            DeviceSelection::Cpu => Device::Cpu,
            DeviceSelection::Cuda(ordinal) => Device::new_cuda(*ordinal)?,
            DeviceSelection::Metal(ordinal) => Device::new_metal(*ordinal)?,
        };
        Ok(device)
    }

    fn empty(shape: &[usize], dtype: DType, device: &Self::Device) -> Result<Self> {
        // candle has no uninitialised constructor, zeros is the cheapest option
        Ok(Tensor::zeros(shape.to_vec(), candle_dtype(dtype), device)?)
    }

    fn shape(&self) -> Vec<usize> {
        self.dims().to_vec()
    }

    fn dtype(&self) -> Self::DType {
        self.dtype()
    }

    fn slice(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        Ok(self.narrow(dim, start, len)?)
    }

    fn slice_assign(&self, dim: usize, start: usize, src: &Self) -> Result<Self> {
        let dims = self.dims();
        let src_dims = src.dims();
        if dim >= dims.len() || src_dims.len() != dims.len() {
            return Err(PipelineError::shape_mismatch("slice assignment source", dims, src_dims));
        }
        let len = src_dims[dim];
        let other_dims_match = dims.iter().zip(src_dims.iter())
            .enumerate()
            .all(|(i, (a, b))| i == dim || a == b);
        if !other_dims_match || start + len > dims[dim] {
            return Err(PipelineError::shape_mismatch("slice assignment source", dims, src_dims));
        }
        if src.dtype() != self.dtype() {
            return Err(PipelineError::dtype_mismatch("slice assignment source", self.dtype(), src.dtype()));
        }

        // Stitch head, source and tail back together along `dim`
        let mut parts = Vec::with_capacity(3);
        if start > 0 {
            parts.push(self.narrow(dim, 0, start)?);
        }
        parts.push(src.clone());
        let tail = dims[dim] - start - len;
        if tail > 0 {
            parts.push(self.narrow(dim, start + len, tail)?);
        }
        Ok(Tensor::cat(parts.as_slice(), dim)?)
    }

    fn to_dtype(&self, dtype: DType) -> Result<Self> {
        Ok(self.to_dtype(candle_dtype(dtype))?)
    }
}
