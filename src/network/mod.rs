pub mod metadata;
pub mod network;

pub use metadata::{ImageInput, ModelMetadata};
pub use network::Network;
