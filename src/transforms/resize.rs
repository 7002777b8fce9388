//! Aspect-preserving and exact resizing

use crate::error::{BgSwapError, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Resampling filter used by every resize in the crate
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Largest dimensions with the source's aspect ratio that fit in `bounds`
///
/// The result may be larger than the source when the bounds are. Each
/// dimension is at least one pixel.
#[must_use]
pub fn fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (width, height) = source;
    let (max_width, max_height) = bounds;
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );

    let new_width = (f64::from(width) * scale).round() as u32;
    let new_height = (f64::from(height) * scale).round() as u32;

    (
        new_width.clamp(1, max_width.max(1)),
        new_height.clamp(1, max_height.max(1)),
    )
}

fn check_target(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BgSwapError::invalid_config(format!(
            "Resize target must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Shrink the image to fit within `width` x `height`, keeping its aspect ratio
///
/// Images that already fit are returned unchanged; this never upscales.
pub fn thumbnail(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    check_target(width, height)?;
    let (src_width, src_height) = image.dimensions();

    if src_width <= width && src_height <= height {
        return Ok(image.clone());
    }

    let (new_width, new_height) = fit_dimensions((src_width, src_height), (width, height));
    Ok(image.resize_exact(new_width, new_height, RESIZE_FILTER))
}

/// Scale the image, up or down, to the largest size fitting `width` x `height`
pub fn scale_to_fit(image: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    check_target(width, height)?;
    let dimensions = image.dimensions();
    let (new_width, new_height) = fit_dimensions(dimensions, (width, height));

    if (new_width, new_height) == dimensions {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(new_width, new_height, RESIZE_FILTER))
}

/// Resize to the requested box
///
/// With `preserve_aspect_ratio` this has thumbnail semantics; otherwise the
/// image is stretched to exactly `width` x `height`.
pub fn resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
    preserve_aspect_ratio: bool,
) -> Result<DynamicImage> {
    if preserve_aspect_ratio {
        thumbnail(image, width, height)
    } else {
        check_target(width, height)?;
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }
        Ok(image.resize_exact(width, height, RESIZE_FILTER))
    }
}
