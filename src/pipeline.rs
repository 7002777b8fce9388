//! Image-plus-mask pipelines
//!
//! Both pipelines return the processed image together with a binary mask of
//! where the subject ended up. Masks are derived from alpha, so the mask
//! branch of the composite pipeline is always rendered over a fully
//! transparent canvas regardless of the visible fill.

use crate::{
    config::CompositeOptions,
    error::Result,
    handler::ImageHandler,
    segmentation::Segmenter,
    types::{BackgroundFill, MaskedImage, SolidColor},
};
use image::DynamicImage;
use instant::Instant;
use tracing::{debug, instrument};

/// Remove the background and derive the subject mask
///
/// Returns the background-removed image and a mask where alpha above
/// `mask_threshold` is subject.
///
/// # Errors
/// Segmenter errors are returned as-is.
#[instrument(skip(image, segmenter), fields(width = image.width(), height = image.height(), segmenter = segmenter.name()))]
pub fn remove_background_gen_mask(
    image: DynamicImage,
    mask_threshold: u8,
    segmenter: &dyn Segmenter,
) -> Result<MaskedImage> {
    let start = Instant::now();

    let mut subject = ImageHandler::new(image);
    subject.remove_background(segmenter)?;

    let mut mask = subject.copy();
    mask.convert_to_mask(mask_threshold);

    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Background removed");
    Ok(MaskedImage::new(subject.into_image(), mask.into_image()))
}

/// Composite a subject onto a new background and derive the subject mask
///
/// The visible output uses the background image, or a solid fill when
/// `options.use_solid_color` is set. The mask always comes from compositing
/// onto transparent white, so it marks only the subject's own pixels.
///
/// # Errors
/// - `InvalidConfig` when a placement fraction is outside 0.0..=1.0
#[instrument(skip_all, fields(
    subject_width = subject.width(),
    subject_height = subject.height(),
    background_width = background.width(),
    background_height = background.height(),
))]
pub fn add_new_background_gen_mask(
    subject: DynamicImage,
    background: &DynamicImage,
    options: &CompositeOptions,
) -> Result<MaskedImage> {
    options.validate()?;
    let start = Instant::now();

    let mut composite = ImageHandler::new(subject);
    let mut mask = composite.copy();

    composite.add_background(background, &options.placement, options.visible_fill())?;
    mask.add_background(
        background,
        &options.placement,
        BackgroundFill::Solid(SolidColor::TRANSPARENT_WHITE),
    )?
    .convert_to_mask(options.mask_threshold);

    debug!(
        solid = options.use_solid_color,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Background composited"
    );
    Ok(MaskedImage::new(composite.into_image(), mask.into_image()))
}
