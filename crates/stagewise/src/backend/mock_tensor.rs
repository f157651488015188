use std::fmt;
use crate::backend::Backend;
use crate::config::{DType, DeviceSelection};
use crate::error::{PipelineError, Result};

// A simple dense tensor for testing, row-major f32 storage
#[derive(Clone, Debug, PartialEq)]
pub struct MockTensor {
    pub(crate) shape: Vec<usize>,
    pub(crate) data: Vec<f32>,
    pub(crate) dtype: DType,
}

impl MockTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len(), "data does not fill shape");
        Self { shape, data, dtype: DType::F32 }
    }

    pub fn filled(shape: Vec<usize>, value: f32) -> Self {
        let len = shape.iter().product();
        Self::new(shape, vec![value; len])
    }

    /// Tensor whose element at flat index `i` is `i`
    pub fn arange(shape: Vec<usize>) -> Self {
        let len: usize = shape.iter().product();
        Self::new(shape, (0..len).map(|i| i as f32).collect())
    }

    // (outer, dim size, inner) split around `dim`
    fn split_at(&self, dim: usize) -> (usize, usize, usize) {
        let outer = self.shape[..dim].iter().product();
        let inner = self.shape[dim + 1..].iter().product();
        (outer, self.shape[dim], inner)
    }
}

impl fmt::Display for MockTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MockTensor({:?}, {:?})", self.shape, self.dtype)
    }
}

impl Backend for MockTensor {
    type DType = DType;
    type Device = ();

    fn resolve_device(selection: &DeviceSelection) -> Result<Self::Device> {
        match selection {
            DeviceSelection::Cpu => Ok(()),
            other => Err(PipelineError::Configuration(format!("mock tensors live on the cpu, not {other:?}"))),
        }
    }

    fn empty(shape: &[usize], dtype: DType, _device: &Self::Device) -> Result<Self> {
        let mut tensor = MockTensor::filled(shape.to_vec(), f32::NAN);
        tensor.dtype = dtype;
        Ok(tensor)
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn dtype(&self) -> Self::DType {
        self.dtype
    }

    fn slice(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        if dim >= self.shape.len() || start + len > self.shape[dim] {
            return Err(PipelineError::Tensor(format!(
                "cannot slice {start}..{} of dim {dim} in {:?}", start + len, self.shape
            )));
        }
        let (outer, size, inner) = self.split_at(dim);
        let mut data = Vec::with_capacity(outer * len * inner);
        for o in 0..outer {
            let base = o * size * inner;
            data.extend_from_slice(&self.data[base + start * inner..base + (start + len) * inner]);
        }
        let mut shape = self.shape.clone();
        shape[dim] = len;
        Ok(MockTensor { shape, data, dtype: self.dtype })
    }

    fn slice_assign(&self, dim: usize, start: usize, src: &Self) -> Result<Self> {
        let mut expected = self.shape.clone();
        if dim >= expected.len() || src.shape.len() != expected.len() {
            return Err(PipelineError::shape_mismatch("slice assignment source", &expected, &src.shape));
        }
        let len = src.shape[dim];
        expected[dim] = len;
        if expected != src.shape || start + len > self.shape[dim] {
            return Err(PipelineError::shape_mismatch("slice assignment source", &expected, &src.shape));
        }
        if src.dtype != self.dtype {
            return Err(PipelineError::dtype_mismatch("slice assignment source", self.dtype, src.dtype));
        }
        let (outer, size, inner) = self.split_at(dim);
        let mut out = self.clone();
        for o in 0..outer {
            let dst = o * size * inner + start * inner;
            let from = o * len * inner;
            out.data[dst..dst + len * inner].copy_from_slice(&src.data[from..from + len * inner]);
        }
        Ok(out)
    }

    fn to_dtype(&self, dtype: DType) -> Result<Self> {
        Ok(MockTensor { dtype, ..self.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_inner_dim() {
        let tensor = MockTensor::arange(vec![2, 3]);
        let sliced = tensor.slice(1, 1, 2).unwrap();
        assert_eq!(sliced.shape, vec![2, 2]);
        assert_eq!(sliced.data, vec![1., 2., 4., 5.]);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let tensor = MockTensor::arange(vec![2, 3]);
        assert!(tensor.slice(0, 1, 2).is_err());
    }

    #[test]
    fn test_slice_assign_rows() {
        let base = MockTensor::filled(vec![3, 2], 0.);
        let src = MockTensor::filled(vec![1, 2], 7.);
        let out = base.slice_assign(0, 2, &src).unwrap();
        assert_eq!(out.data, vec![0., 0., 0., 0., 7., 7.]);
    }
}
