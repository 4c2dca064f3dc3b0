//! Fixed preprocessing: decode, RGB, resize, scale to `[0, 1]`, normalize.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::{Array3, ArrayViewMut3};
use thiserror::Error;

use crate::config::PrepConfig;

const CHANNELS: usize = 3;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Target image size must be at least 1")]
    ZeroSize,
    #[error("Standard deviation for channel {channel} must be positive, got {value}")]
    InvalidStd { channel: usize, value: f32 },
    #[error("Output view has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: [usize; 3],
        actual: [usize; 3],
    },
}

/// Image to `[3, size, size]` channel-major tensor conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTransform {
    size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl ImageTransform {
    pub fn new(size: u32, mean: [f32; 3], std: [f32; 3]) -> Result<Self, TransformError> {
        if size == 0 {
            return Err(TransformError::ZeroSize);
        }
        for (channel, &value) in std.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(TransformError::InvalidStd { channel, value });
            }
        }
        Ok(Self { size, mean, std })
    }

    pub fn from_config(config: &PrepConfig) -> Result<Self, TransformError> {
        Self::new(config.image_size, config.mean, config.std)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Shape of one transformed image.
    pub fn output_shape(&self) -> [usize; 3] {
        let side = self.size as usize;
        [CHANNELS, side, side]
    }

    pub fn apply(&self, image: &DynamicImage) -> Array3<f32> {
        let side = self.size as usize;
        let mut out = Array3::<f32>::zeros((CHANNELS, side, side));
        self.fill(&self.resized_rgb(image), out.view_mut());
        out
    }

    /// Transform `image` straight into a preallocated `[3, size, size]` view.
    pub fn apply_into(
        &self,
        image: &DynamicImage,
        out: ArrayViewMut3<'_, f32>,
    ) -> Result<(), TransformError> {
        let expected = self.output_shape();
        let actual = [out.shape()[0], out.shape()[1], out.shape()[2]];
        if actual != expected {
            return Err(TransformError::ShapeMismatch { expected, actual });
        }
        self.fill(&self.resized_rgb(image), out);
        Ok(())
    }

    pub fn load(&self, path: &Path) -> Result<Array3<f32>, TransformError> {
        Ok(self.apply(&decode(path)?))
    }

    pub fn load_into(&self, path: &Path, out: ArrayViewMut3<'_, f32>) -> Result<(), TransformError> {
        self.apply_into(&decode(path)?, out)
    }

    fn resized_rgb(&self, image: &DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        if rgb.width() == self.size && rgb.height() == self.size {
            return rgb;
        }
        imageops::resize(&rgb, self.size, self.size, FilterType::Triangle)
    }

    fn fill(&self, rgb: &RgbImage, mut out: ArrayViewMut3<'_, f32>) {
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for channel in 0..CHANNELS {
                let scaled = f32::from(pixel.0[channel]) / 255.0;
                out[[channel, y as usize, x as usize]] =
                    (scaled - self.mean[channel]) / self.std[channel];
            }
        }
    }
}

fn decode(path: &Path) -> Result<DynamicImage, TransformError> {
    image::open(path).map_err(|source| TransformError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
