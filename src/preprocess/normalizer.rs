//! Pixel normalization: decoded image bytes to a model input tensor.
//!
//! The output is always `[1, 3, H, W]`, channel-planar, with every element
//! in `[0, 1]`. Resampling happens on the 8-bit image before any scaling so
//! interpolation never runs over already-normalized floats.

use image::imageops::{self, FilterType};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifyError, Result};
use crate::pixel::{ChannelOrder, PixelBuffer};
use crate::tensor::Tensor;

/// Input size the fall-detection models were exported with.
pub const DEFAULT_TARGET_SIZE: u32 = 244;

/// Plane order of the normalized tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOrder {
    #[default]
    Rgb,
    Bgr,
}

impl TargetOrder {
    /// Index into an `[r, g, b]` pixel for each output plane.
    fn plane_sources(self) -> [usize; 3] {
        match self {
            TargetOrder::Rgb => [0, 1, 2],
            TargetOrder::Bgr => [2, 1, 0],
        }
    }
}

/// Model-fixed normalization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub target_width: u32,
    pub target_height: u32,
    #[serde(default)]
    pub channel_order: TargetOrder,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            target_width: DEFAULT_TARGET_SIZE,
            target_height: DEFAULT_TARGET_SIZE,
            channel_order: TargetOrder::Rgb,
        }
    }
}

/// Converts any valid [`PixelBuffer`] into the tensor a model expects.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Fails with `Config` when either target dimension is zero.
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        if config.target_width == 0 || config.target_height == 0 {
            return Err(ClassifyError::config(format!(
                "target size must be non-zero, got {}x{}",
                config.target_width, config.target_height
            )));
        }
        Ok(Normalizer { config })
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Shape of every tensor this normalizer produces.
    pub fn output_shape(&self) -> [usize; 4] {
        [
            1,
            3,
            self.config.target_height as usize,
            self.config.target_width as usize,
        ]
    }

    /// Normalizes a raw decoder hand-off, validating it first.
    pub fn normalize_raw(
        &self,
        width: u32,
        height: u32,
        channel_order: ChannelOrder,
        bytes: Vec<u8>,
    ) -> Result<Tensor> {
        let image = PixelBuffer::new(width, height, channel_order, channel_order.bytes_per_pixel(), bytes)?;
        self.normalize(&image)
    }

    pub fn normalize(&self, image: &PixelBuffer) -> Result<Tensor> {
        let (tw, th) = (self.config.target_width, self.config.target_height);

        let mut rgb = image.to_rgb_image();
        if rgb.dimensions() != (tw, th) {
            debug!(
                from_width = image.width(),
                from_height = image.height(),
                to_width = tw,
                to_height = th,
                "resizing before normalization"
            );
            rgb = imageops::resize(&rgb, tw, th, FilterType::Triangle);
        }

        let plane_len = tw as usize * th as usize;
        let sources = self.config.channel_order.plane_sources();
        let mut data = vec![0.0f32; 3 * plane_len];

        data.par_chunks_mut(plane_len)
            .enumerate()
            .for_each(|(plane, out)| {
                let src = sources[plane];
                for (value, pixel) in out.iter_mut().zip(rgb.pixels()) {
                    *value = pixel.0[src] as f32 / 255.0;
                }
            });

        Tensor::new(self.output_shape().to_vec(), data)
    }
}
