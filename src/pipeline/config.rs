use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::preprocess::TargetOrder;

/// File-level configuration of a classification pipeline.
///
/// Every field is optional. Unset values fall back to the model file's
/// metadata and then to built-in defaults (244x244 RGB, `"inputs"` ->
/// `"predictions"`, top-1). Command-line flags override the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// JSON dense model to evaluate.
    pub model_path: Option<PathBuf>,
    /// Label file (JSON array or one label per line). Overrides the model's
    /// `output_labels`.
    pub labels_path: Option<PathBuf>,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub channel_order: Option<TargetOrder>,
    pub input_name: Option<String>,
    pub output_name: Option<String>,
    /// How many ranked classes front ends display.
    pub top_k: Option<usize>,
}

impl PipelineConfig {
    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `PipelineConfig` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
