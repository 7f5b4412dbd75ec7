//! Error types for the classification pipeline.
//!
//! Errors fall into two groups. Input errors (`InvalidImage`,
//! `UnsupportedFormat`, `Decode`, `Busy`) are recovered at the request
//! boundary and reported as "no result". Everything else is a contract
//! violation between pipeline stages and aborts the request.

use thiserror::Error;

/// Every failure the pipeline can report.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The pixel buffer is zero-sized or its byte count does not match its
    /// declared dimensions.
    #[error("invalid image: {message}")]
    InvalidImage { message: String },

    /// Channel order or bit depth is not one the normalizer understands.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The model produced no scores at all.
    #[error("empty prediction: the model returned no scores")]
    EmptyPrediction,

    /// A positional score has no label in the label table.
    #[error("label index {index} out of range for a table of {labels} labels")]
    LabelIndexOutOfRange { index: usize, labels: usize },

    /// A buffer or tensor did not have the element count its shape implies.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The inference engine failed or broke its output contract.
    #[error("inference engine: {message}")]
    Engine { message: String },

    /// Invalid pipeline, model or label configuration.
    #[error("configuration: {message}")]
    Config { message: String },

    /// Another request is already in flight on this pipeline.
    #[error("pipeline busy: a request is already in flight")]
    Busy,

    #[error("image decode: {0}")]
    Decode(#[from] image::ImageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClassifyError {
    pub fn invalid_image(message: impl Into<String>) -> Self {
        ClassifyError::InvalidImage { message: message.into() }
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        ClassifyError::UnsupportedFormat { message: message.into() }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        ClassifyError::Engine { message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ClassifyError::Config { message: message.into() }
    }

    /// True for errors caused by the request's input rather than by a
    /// defect in the model, engine or pipeline wiring.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ClassifyError::InvalidImage { .. }
                | ClassifyError::UnsupportedFormat { .. }
                | ClassifyError::Decode(_)
                | ClassifyError::Busy
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ClassifyError>;
