pub mod orientation;
pub mod pixel_buffer;

pub use pixel_buffer::{ChannelOrder, PixelBuffer};
