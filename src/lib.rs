pub mod error;
pub mod logging;
pub mod pixel;
pub mod tensor;
pub mod preprocess;
pub mod postprocess;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod engine;
pub mod pipeline;

// Convenience re-exports
pub use error::{ClassifyError, Result};
pub use logging::init_tracing;
pub use pixel::{ChannelOrder, PixelBuffer};
pub use tensor::Tensor;
pub use preprocess::{Normalizer, NormalizerConfig, TargetOrder};
pub use postprocess::{ClassLabelTable, ClassificationResult, ResultExtractor};
pub use activation::ActivationFunction;
pub use network::{ImageInput, ModelMetadata, Network};
pub use engine::{DenseEngine, InferenceEngine, IoBinding, TensorMap};
pub use pipeline::{Pipeline, PipelineConfig};
