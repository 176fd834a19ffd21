//! Smart compression: bound image dimensions and re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use octovault_core::config::CompressionConfig;
use octovault_core::{VaultError, VaultResult};

/// Resizes images so neither edge exceeds `max_dimension`, then re-encodes
/// them as JPEG at `quality`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    max_dimension: u32,
    quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 80,
        }
    }
}

impl From<&CompressionConfig> for ImageNormalizer {
    fn from(config: &CompressionConfig) -> Self {
        Self::new(config.max_dimension, config.jpeg_quality)
    }
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Normalize one image. `name` is only used to label the error.
    pub fn normalize(&self, name: &str, image_data: &[u8]) -> VaultResult<Vec<u8>> {
        let failed = |reason: String| VaultError::Normalization {
            name: name.to_string(),
            reason,
        };

        let img = image::load_from_memory(image_data).map_err(|e| failed(e.to_string()))?;

        let (width, height) = img.dimensions();
        let (new_width, new_height) = fit_within(width, height, self.max_dimension);
        let img = if (new_width, new_height) != (width, height) {
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        } else {
            img
        };

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

        let mut output = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut output, self.quality))
            .map_err(|e| failed(e.to_string()))?;

        Ok(output)
    }
}

/// Scale `(width, height)` so the longer edge equals `max` when either edge exceeds it.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = |short: u32, long: u32| -> u32 {
        let scaled = (short as f64 * max as f64 / long as f64).round() as u32;
        scaled.max(1)
    };

    if width > height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}
