use serde::{Deserialize, Serialize};

use crate::preprocess::TargetOrder;

/// Spatial size and plane order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInput {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub channel_order: TargetOrder,
}

/// Optional annotations attached to a saved model.
/// All fields are Option<> so bare models (weights only) still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input: Option<ImageInput>,
    /// Human-readable class labels for the output layer.
    pub output_labels: Option<Vec<String>>,
    /// Name of the input slot the model binds (defaults to `"inputs"`).
    pub input_name: Option<String>,
    /// Name of the output slot the model produces (defaults to `"predictions"`).
    pub output_name: Option<String>,
}
