use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, error::{ClassifyError, Result}, math::matrix::Matrix};

/// Fully-connected layer: `a = activator(x * W + b)`.
///
/// `weights` is `(input_size, size)`, `biases` is `(1, size)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Layer {
    /// He-initialized weights and zero biases.
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            size,
            weights: Matrix::he(input_size, size),
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Checks the stored matrices agree with `size`.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.biases.validate()?;
        if self.weights.cols != self.size {
            return Err(ClassifyError::ShapeMismatch {
                context: "layer weight columns",
                expected: self.size,
                actual: self.weights.cols,
            });
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(ClassifyError::ShapeMismatch {
                context: "layer biases",
                expected: self.size,
                actual: self.biases.rows * self.biases.cols,
            });
        }
        Ok(())
    }

    /// Forward pass for one sample. Does not mutate the layer, so a loaded
    /// model can serve concurrent requests.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut z = self.weights.left_mul(input)?;
        for (v, b) in z.iter_mut().zip(&self.biases.data[0]) {
            *v += b;
        }
        self.activator.apply(&mut z);
        Ok(z)
    }
}
