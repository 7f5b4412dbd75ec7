//! The inference engine boundary.
//!
//! The pipeline treats model evaluation as an opaque call that takes named
//! input tensors and returns named output tensors, the same shape of API an
//! ONNX-style session exposes. [`DenseEngine`] is the in-crate
//! implementation over a JSON dense network; anything else can be plugged in
//! by implementing [`InferenceEngine`].

pub mod dense;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tensor::Tensor;

pub use dense::DenseEngine;

/// Tensors keyed by slot name.
pub type TensorMap = HashMap<String, Tensor>;

pub const DEFAULT_INPUT_NAME: &str = "inputs";
pub const DEFAULT_OUTPUT_NAME: &str = "predictions";

/// Names of the model slots the pipeline writes to and reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoBinding {
    pub input: String,
    pub output: String,
}

impl Default for IoBinding {
    fn default() -> Self {
        IoBinding {
            input: DEFAULT_INPUT_NAME.to_owned(),
            output: DEFAULT_OUTPUT_NAME.to_owned(),
        }
    }
}

/// An opaque forward computation.
///
/// Implementations must not keep per-request state: one engine instance is
/// shared by every request against the loaded model.
pub trait InferenceEngine: Send + Sync {
    /// Runs one evaluation over the bound inputs.
    fn evaluate(&self, inputs: &TensorMap) -> Result<TensorMap>;

    /// Slot names this engine expects, when it knows them.
    fn binding(&self) -> Option<IoBinding> {
        None
    }
}
