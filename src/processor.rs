//! Background processor
//!
//! `BackgroundProcessor` pairs a [`ProcessorConfig`] with a segmenter and runs
//! either pipeline from any [`ImageSource`]. It is what the CLI drives, and
//! hosts embedding the library can use it the same way.

use crate::{
    config::ProcessorConfig,
    error::Result,
    handler::{ImageHandler, ImageSource},
    pipeline::{add_new_background_gen_mask, remove_background_gen_mask},
    segmentation::Segmenter,
    types::MaskedImage,
};
use image::DynamicImage;
use instant::Instant;
use log::debug;
use std::path::Path;
use tracing::{info as trace_info, span, Level};

pub struct BackgroundProcessor {
    config: ProcessorConfig,
    segmenter: Box<dyn Segmenter>,
}

impl std::fmt::Debug for BackgroundProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundProcessor")
            .field("config", &self.config)
            .field("segmenter", &self.segmenter.name())
            .finish()
    }
}

impl BackgroundProcessor {
    /// Create a processor from a validated configuration
    ///
    /// # Errors
    /// - `InvalidConfig` when the configuration fails validation
    pub fn new(config: ProcessorConfig, segmenter: Box<dyn Segmenter>) -> Result<Self> {
        config.validate()?;
        debug!("Processor created with segmenter '{}'", segmenter.name());
        Ok(Self { config, segmenter })
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Remove the background of `image`, returning it with its subject mask
    ///
    /// # Errors
    /// Segmenter errors are returned as-is.
    pub fn remove_background(&self, image: DynamicImage) -> Result<MaskedImage> {
        let _span = span!(
            Level::INFO,
            "remove_background",
            segmenter = self.segmenter.name(),
            width = image.width(),
            height = image.height()
        )
        .entered();
        let start = Instant::now();

        let result = remove_background_gen_mask(
            image,
            self.config.removal_mask_threshold,
            self.segmenter.as_ref(),
        )?;

        trace_info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            subject_pixels = result.subject_pixel_count(),
            "Background removal finished"
        );
        Ok(result)
    }

    /// Composite `subject` onto `background`, returning it with its subject mask
    ///
    /// # Errors
    /// - `InvalidConfig` when the placement is out of range
    pub fn add_background(&self, subject: DynamicImage, background: &DynamicImage) -> Result<MaskedImage> {
        let _span = span!(
            Level::INFO,
            "add_background",
            solid = self.config.composite.use_solid_color,
            background_width = background.width(),
            background_height = background.height()
        )
        .entered();
        let start = Instant::now();

        let result = add_new_background_gen_mask(subject, background, &self.config.composite)?;

        trace_info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            subject_pixels = result.subject_pixel_count(),
            "Background composite finished"
        );
        Ok(result)
    }

    /// Load `source`, then remove its background
    pub fn remove_background_from(&self, source: ImageSource) -> Result<MaskedImage> {
        let image = ImageHandler::open(source)?.into_image();
        self.remove_background(image)
    }

    /// Load both sources, then composite
    pub fn add_background_from(&self, subject: ImageSource, background: ImageSource) -> Result<MaskedImage> {
        let subject = ImageHandler::open(subject)?.into_image();
        let background = ImageHandler::open(background)?;
        self.add_background(subject, background.image())
    }

    /// Save a result using the configured output format and quality
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        result: &MaskedImage,
        image_path: P,
        mask_path: Q,
    ) -> Result<()> {
        result.save(
            image_path,
            mask_path,
            self.config.output_format,
            self.config.jpeg_quality,
        )
    }
}
