pub mod normalizer;

pub use normalizer::{Normalizer, NormalizerConfig, TargetOrder, DEFAULT_TARGET_SIZE};
