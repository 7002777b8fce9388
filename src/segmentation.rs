//! Subject/background segmentation abstraction
//!
//! Background removal depends on exactly one capability: turn an image into
//! the same image with an alpha channel marking the subject. [`Segmenter`]
//! is that capability. Closures implement it, which is how tests substitute
//! deterministic stubs.
//!
//! Tensor-based models plug in one level lower through [`InferenceBackend`];
//! [`ModelSegmenter`] handles letterboxing, normalization and mapping the
//! predicted mask back onto the source image.

use crate::{
    error::Result,
    utils::{postprocessing::MaskPostprocessor, preprocessing::ImagePreprocessor, PreprocessingConfig},
};
use image::DynamicImage;
use instant::Instant;
use ndarray::Array4;
use tracing::{debug, instrument};

/// Subject/background segmentation: single image in, single RGBA image out
pub trait Segmenter: Send + Sync {
    /// Return the image with its background made transparent
    ///
    /// # Errors
    /// - `Model` when the backend fails or is unavailable
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Segmenter for F
where
    F: Fn(&DynamicImage) -> Result<DynamicImage> + Send + Sync,
{
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage> {
        self(image)
    }
}

/// Tensor inference backend for saliency models
pub trait InferenceBackend: Send + Sync {
    /// Run inference on an NCHW input tensor, returning a `[1, 1, H, W]` prediction
    ///
    /// # Errors
    /// - `Model` on inference failures
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Input preparation expected by the model
    fn preprocessing_config(&self) -> &PreprocessingConfig;

    /// Backend name used in logs
    fn name(&self) -> &str;
}

/// [`Segmenter`] built from a tensor inference backend
#[derive(Debug)]
pub struct ModelSegmenter<B> {
    backend: B,
}

impl<B: InferenceBackend> ModelSegmenter<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: InferenceBackend> Segmenter for ModelSegmenter<B> {
    #[instrument(skip(self, image), fields(backend = self.backend.name(), width = image.width(), height = image.height()))]
    fn segment(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let config = self.backend.preprocessing_config();
        let start = Instant::now();

        let tensor = ImagePreprocessor::preprocess_for_inference(image, config)?;
        let prediction = self.backend.infer(&tensor)?;
        let mask = MaskPostprocessor::tensor_to_mask(
            &prediction,
            (image.width(), image.height()),
            config.rescale_output,
        )?;

        let mut rgba = image.to_rgba8();
        mask.apply_to_image(&mut rgba)?;

        debug!(
            foreground_ratio = mask.foreground_ratio(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Segmentation finished"
        );
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn name(&self) -> &str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BgSwapError;
    use image::{Rgba, RgbaImage};

    /// Predicts a centered square covering the middle half of the tensor
    struct CenterSquareBackend {
        config: PreprocessingConfig,
    }

    impl InferenceBackend for CenterSquareBackend {
        fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
            let size = input.shape()[2];
            Ok(Array4::from_shape_fn((1, 1, size, size), |(_, _, y, x)| {
                let inside = (size / 4..3 * size / 4).contains(&x) && (size / 4..3 * size / 4).contains(&y);
                if inside { 1.0 } else { 0.0 }
            }))
        }

        fn preprocessing_config(&self) -> &PreprocessingConfig {
            &self.config
        }

        fn name(&self) -> &str {
            "center-square"
        }
    }

    struct FailingBackend(PreprocessingConfig);

    impl InferenceBackend for FailingBackend {
        fn infer(&self, _input: &Array4<f32>) -> Result<Array4<f32>> {
            Err(BgSwapError::model("backend unavailable"))
        }

        fn preprocessing_config(&self) -> &PreprocessingConfig {
            &self.0
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn small_config() -> PreprocessingConfig {
        PreprocessingConfig {
            target_size: 32,
            rescale_output: false,
            ..PreprocessingConfig::u2net()
        }
    }

    #[test]
    fn test_closure_segmenter() {
        let segmenter = |image: &DynamicImage| -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
        };
        let image = DynamicImage::new_rgb8(2, 2);
        let out = segmenter.segment(&image).unwrap();
        assert!(out.color().has_alpha());
        assert_eq!(Segmenter::name(&segmenter), "custom");
    }

    #[test]
    fn test_model_segmenter_applies_predicted_alpha() {
        let segmenter = ModelSegmenter::new(CenterSquareBackend {
            config: small_config(),
        });
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([200, 10, 10, 255])));

        let out = segmenter.segment(&image).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (64, 64));
        assert_eq!(out.get_pixel(32, 32).0, [200, 10, 10, 255]);
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 0, 0]);
        assert_eq!(segmenter.name(), "center-square");
    }

    #[test]
    fn test_model_segmenter_propagates_model_errors() {
        let segmenter = ModelSegmenter::new(FailingBackend(small_config()));
        let err = segmenter.segment(&DynamicImage::new_rgb8(8, 8)).unwrap_err();
        assert!(matches!(err, BgSwapError::Model(_)));
    }
}
