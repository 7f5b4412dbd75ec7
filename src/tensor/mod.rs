pub mod bytes;
pub mod tensor;

pub use bytes::{bytes_to_f32s, f32s_to_bytes};
pub use tensor::Tensor;
