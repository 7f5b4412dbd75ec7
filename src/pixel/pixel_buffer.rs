use std::path::Path;
use std::str::FromStr;

use image::{DynamicImage, ImageError, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{ClassifyError, Result};
use crate::pixel::orientation::{apply_orientation, read_exif_orientation};

/// Byte layout of one pixel in a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Bgra,
    Rgba,
    Bgr,
    Rgb,
}

impl ChannelOrder {
    /// Bytes one pixel occupies at 8 bits per channel.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            ChannelOrder::Bgra | ChannelOrder::Rgba => 4,
            ChannelOrder::Bgr | ChannelOrder::Rgb => 3,
        }
    }

    /// Offsets of the red, green and blue bytes within one pixel.
    /// Alpha, when present, is never referenced.
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            ChannelOrder::Bgra | ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgba | ChannelOrder::Rgb => [0, 1, 2],
        }
    }
}

impl FromStr for ChannelOrder {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bgra" => Ok(ChannelOrder::Bgra),
            "rgba" => Ok(ChannelOrder::Rgba),
            "bgr" => Ok(ChannelOrder::Bgr),
            "rgb" => Ok(ChannelOrder::Rgb),
            other => Err(ClassifyError::unsupported_format(format!(
                "unknown channel order '{other}'"
            ))),
        }
    }
}

/// A decoded image: a flat, row-major byte buffer with known dimensions and
/// channel layout.
///
/// Fields are private so the `bytes.len() == width * height * bytes_per_pixel`
/// invariant established by [`PixelBuffer::new`] cannot be broken afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channel_order: ChannelOrder,
    bytes_per_pixel: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Validates and wraps a decoded buffer.
    ///
    /// # Errors
    /// - `InvalidImage` when either dimension is zero or the byte count does
    ///   not match `width * height * bytes_per_pixel`.
    /// - `UnsupportedFormat` when `bytes_per_pixel` is not the 8-bit size of
    ///   `channel_order` (e.g. a 16-bit RGBA buffer).
    pub fn new(
        width: u32,
        height: u32,
        channel_order: ChannelOrder,
        bytes_per_pixel: u32,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ClassifyError::invalid_image(format!(
                "zero-sized image ({width}x{height})"
            )));
        }
        if bytes_per_pixel != channel_order.bytes_per_pixel() {
            return Err(ClassifyError::unsupported_format(format!(
                "{bytes_per_pixel} bytes per pixel is not a supported depth for {channel_order:?}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(bytes_per_pixel as usize))
            .ok_or_else(|| ClassifyError::invalid_image("image dimensions overflow"))?;
        if bytes.len() != expected {
            return Err(ClassifyError::invalid_image(format!(
                "{width}x{height} {channel_order:?} needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(PixelBuffer { width, height, channel_order, bytes_per_pixel, bytes })
    }

    /// Adapts an image decoded by the `image` crate. Any source depth or
    /// colour type is converted to 8-bit RGBA first.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        PixelBuffer::new(width, height, ChannelOrder::Rgba, 4, rgba.into_raw())
    }

    /// Decodes an encoded PNG/JPEG/BMP/GIF byte stream and turns it upright
    /// according to its EXIF orientation tag.
    pub fn decode(encoded: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(encoded)?;
        let img = apply_orientation(img, read_exif_orientation(encoded));
        PixelBuffer::from_dynamic_image(&img)
    }

    /// Reads and decodes an image file. A file that cannot be read is
    /// reported as a decode failure, like any other unusable input.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let encoded = std::fs::read(path).map_err(ImageError::IoError)?;
        PixelBuffer::decode(&encoded)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Red, green and blue bytes of the pixel at row-major index `i`.
    pub fn rgb_at(&self, i: usize) -> [u8; 3] {
        let base = i * self.bytes_per_pixel as usize;
        let [r, g, b] = self.channel_order.rgb_offsets();
        [self.bytes[base + r], self.bytes[base + g], self.bytes[base + b]]
    }

    /// Reorders the buffer into packed 8-bit RGB, dropping alpha.
    pub fn to_rgb_image(&self) -> RgbImage {
        let width = self.width;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb(self.rgb_at((y * width + x) as usize))
        })
    }
}
