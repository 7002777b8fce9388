//! Binary mask derivation from an alpha channel

use image::{DynamicImage, Rgba, RgbaImage};

/// Mask pixel for subject coverage: opaque black
pub const SUBJECT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Mask pixel for background: transparent white
pub const BACKGROUND_PIXEL: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Classify every pixel by its alpha value
///
/// Alpha `<= threshold` becomes [`BACKGROUND_PIXEL`], anything above becomes
/// [`SUBJECT_PIXEL`]. All color information is discarded, so this must be the
/// last transform applied to an image.
#[must_use]
pub fn alpha_to_mask(image: &RgbaImage, threshold: u8) -> RgbaImage {
    let mut mask = image.clone();
    for pixel in mask.pixels_mut() {
        *pixel = if pixel[3] <= threshold {
            BACKGROUND_PIXEL
        } else {
            SUBJECT_PIXEL
        };
    }
    mask
}

/// [`alpha_to_mask`] over an RGBA coercion of any image
#[must_use]
pub fn convert_to_mask(image: &DynamicImage, threshold: u8) -> DynamicImage {
    DynamicImage::ImageRgba8(alpha_to_mask(&image.to_rgba8(), threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_ramp() -> RgbaImage {
        RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8, y as u8, 7, (y * 16 + x) as u8]))
    }

    #[test]
    fn test_threshold_boundary() {
        let mask = alpha_to_mask(&alpha_ramp(), 25);
        for (src, out) in alpha_ramp().pixels().zip(mask.pixels()) {
            let expected = if src[3] <= 25 { BACKGROUND_PIXEL } else { SUBJECT_PIXEL };
            assert_eq!(*out, expected);
        }
        assert_eq!(*mask.get_pixel(9, 1), BACKGROUND_PIXEL); // alpha 25
        assert_eq!(*mask.get_pixel(10, 1), SUBJECT_PIXEL); // alpha 26
    }

    #[test]
    fn test_threshold_zero_keeps_only_transparent_pixels_white() {
        let mask = alpha_to_mask(&alpha_ramp(), 0);
        assert_eq!(*mask.get_pixel(0, 0), BACKGROUND_PIXEL);
        assert_eq!(
            mask.pixels().filter(|p| **p == BACKGROUND_PIXEL).count(),
            1
        );
    }

    #[test]
    fn test_threshold_max_makes_everything_white() {
        let mask = alpha_to_mask(&alpha_ramp(), u8::MAX);
        assert!(mask.pixels().all(|p| *p == BACKGROUND_PIXEL));
    }

    #[test]
    fn test_images_without_alpha_are_all_subject() {
        let rgb = DynamicImage::new_rgb8(3, 2);
        let mask = convert_to_mask(&rgb, 25).to_rgba8();
        assert!(mask.pixels().all(|p| *p == SUBJECT_PIXEL));
    }
}
