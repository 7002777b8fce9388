//! Image preprocessing for saliency model inference
//!
//! Images are letterboxed onto a square canvas (aspect ratio preserved, white
//! padding, content centered) and converted to a normalized NCHW tensor.

use crate::error::{BgSwapError, Result};
use image::{DynamicImage, ImageBuffer, RgbImage};
use ndarray::Array4;
use serde::{Deserialize, Serialize};

/// ImageNet channel means, used by U2-Net style models
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Model input preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Side of the square input tensor
    pub target_size: u32,
    /// Per-channel mean subtracted after scaling to 0..1
    pub normalization_mean: [f32; 3],
    /// Per-channel divisor applied after mean subtraction
    pub normalization_std: [f32; 3],
    /// Min-max rescale the prediction before converting it to a mask
    pub rescale_output: bool,
}

impl PreprocessingConfig {
    /// U2-Net family: 320x320 input, ImageNet normalization
    #[must_use]
    pub fn u2net() -> Self {
        Self {
            target_size: 320,
            normalization_mean: IMAGENET_MEAN,
            normalization_std: IMAGENET_STD,
            rescale_output: true,
        }
    }

    /// ISNet family: 1024x1024 input, mean 0.5 / std 1.0
    #[must_use]
    pub fn isnet() -> Self {
        Self {
            target_size: 1024,
            normalization_mean: [0.5; 3],
            normalization_std: [1.0; 3],
            rescale_output: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(BgSwapError::invalid_config(
                "Model input size must be greater than zero",
            ));
        }
        if self.normalization_std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(BgSwapError::invalid_config(format!(
                "Normalization std must be finite and non-zero, got {:?}",
                self.normalization_std
            )));
        }
        Ok(())
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self::u2net()
    }
}

/// Letterbox geometry shared by preprocessing and mask extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Scale from source to canvas coordinates
    pub scale: f32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl Letterbox {
    /// Geometry of fitting `source` into a `target_size` square
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn compute(source: (u32, u32), target_size: u32) -> Self {
        let (orig_width, orig_height) = source;
        let target = target_size as f32;
        let scale = target.min((target / orig_width as f32).min(target / orig_height as f32));

        let scaled_width = ((orig_width as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((orig_height as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            scaled_width,
            scaled_height,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
        }
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Letterbox the image onto a white square canvas of `target_size`
    pub fn letterbox(image: &DynamicImage, target_size: u32) -> Result<RgbImage> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BgSwapError::processing(
                "Cannot preprocess an image with zero dimensions",
            ));
        }
        let rgb_image = image.to_rgb8();
        let geometry = Letterbox::compute(rgb_image.dimensions(), target_size);

        let resized = image::imageops::resize(
            &rgb_image,
            geometry.scaled_width,
            geometry.scaled_height,
            image::imageops::FilterType::Triangle,
        );

        let mut canvas = ImageBuffer::from_pixel(target_size, target_size, image::Rgb([255, 255, 255]));
        image::imageops::replace(
            &mut canvas,
            &resized,
            i64::from(geometry.offset_x),
            i64::from(geometry.offset_y),
        );
        Ok(canvas)
    }

    /// Preprocess an image into a normalized `[1, 3, size, size]` tensor
    ///
    /// # Errors
    /// - `InvalidConfig` for a zero input size or zero std
    /// - `Processing` for an empty image
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        config: &PreprocessingConfig,
    ) -> Result<Array4<f32>> {
        config.validate()?;
        let canvas = Self::letterbox(image, config.target_size)?;
        Ok(Self::canvas_to_tensor(&canvas, config))
    }

    fn canvas_to_tensor(canvas: &RgbImage, config: &PreprocessingConfig) -> Array4<f32> {
        let (width, height) = canvas.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in canvas.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = (f32::from(pixel[channel]) / 255.0
                    - config.normalization_mean[channel])
                    / config.normalization_std[channel];
            }
        }
        tensor
    }
}
