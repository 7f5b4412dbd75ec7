use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{ClassifyError, Result};

/// Row-major dense matrix as stored in model files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal(rng: &mut ThreadRng) -> f64 {
        // Both draws in (0, 1] so ln never sees 0.
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Shape: (rows, cols). `rows` is the fan-in, since layers multiply a
    /// row-vector input from the left.
    pub fn he(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let std_dev = (2.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for v in row.iter_mut() {
                *v = Matrix::sample_standard_normal(&mut rng) * std_dev;
            }
        }
        res
    }

    /// Checks that `data` really is `rows x cols`. Model files are external
    /// input, so a ragged matrix has to be caught before any arithmetic.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(ClassifyError::ShapeMismatch {
                context: "matrix rows",
                expected: self.rows,
                actual: self.data.len(),
            });
        }
        if let Some(row) = self.data.iter().find(|r| r.len() != self.cols) {
            return Err(ClassifyError::ShapeMismatch {
                context: "matrix columns",
                expected: self.cols,
                actual: row.len(),
            });
        }
        Ok(())
    }

    /// Row-vector product `input * self`.
    ///
    /// `input.len()` must equal `rows`; the result has `cols` entries.
    pub fn left_mul(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.rows {
            return Err(ClassifyError::ShapeMismatch {
                context: "layer input",
                expected: self.rows,
                actual: input.len(),
            });
        }
        let mut out = vec![0.0; self.cols];
        for (x, row) in input.iter().zip(&self.data) {
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        Ok(out)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
