use crate::error::{ClassifyError, Result};
use crate::tensor::bytes::{bytes_to_f32s, f32s_to_bytes};

/// A dense `f32` array with an explicit shape.
///
/// `data.len()` always equals the product of `shape`; constructors check it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Wraps `data` with `shape`, failing with `ShapeMismatch` when the
    /// element count disagrees.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Tensor> {
        let expected = element_count(&shape);
        if data.len() != expected {
            return Err(ClassifyError::ShapeMismatch {
                context: "tensor construction",
                expected,
                actual: data.len(),
            });
        }
        Ok(Tensor { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> Tensor {
        let n = element_count(&shape);
        Tensor { shape, data: vec![0.0; n] }
    }

    /// A rank-1 tensor over `values`.
    pub fn vector(values: Vec<f32>) -> Tensor {
        Tensor { shape: vec![values.len()], data: values }
    }

    /// Reinterprets a native-endian byte buffer as a tensor of `shape`.
    pub fn from_bytes(shape: Vec<usize>, bytes: &[u8]) -> Result<Tensor> {
        Tensor::new(shape, bytes_to_f32s(bytes)?)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        f32s_to_bytes(&self.data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Scores of a single-sample classifier output.
    ///
    /// Accepts `[N]` or `[1, .., 1, N]`; any leading dimension larger than
    /// one means a batch, which a single-request pipeline never produces.
    pub fn class_scores(&self) -> Result<&[f32]> {
        let Some((&classes, leading)) = self.shape.split_last() else {
            return Err(ClassifyError::EmptyPrediction);
        };
        let batch = element_count(leading);
        if batch != 1 {
            return Err(ClassifyError::ShapeMismatch {
                context: "classifier output batch",
                expected: 1,
                actual: batch,
            });
        }
        debug_assert_eq!(classes, self.data.len());
        Ok(&self.data)
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}
