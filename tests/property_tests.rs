//! Property-based tests for bgswap
//!
//! These tests use proptest to verify invariants that should hold for all
//! inputs to the image handler and pipelines.

use bgswap::{
    add_new_background_gen_mask,
    transforms::{alpha_to_mask, enhance, fit_dimensions, thumbnail, BACKGROUND_PIXEL, SUBJECT_PIXEL},
    CompositeOptions, EnhanceFactors, ImageHandler, Placement, SolidColor,
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use proptest::prelude::*;

/// Strategy for generating small but valid image dimensions
fn image_dimensions() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=24, 1u32..=24)
}

/// Strategy for generating RGBA pixel values
fn rgba_pixel() -> impl Strategy<Value = Rgba<u8>> {
    (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b, a)| Rgba([r, g, b, a]))
}

/// Strategy for generating a small RGBA image with arbitrary pixels
fn rgba_image() -> impl Strategy<Value = RgbaImage> {
    image_dimensions().prop_flat_map(|(width, height)| {
        prop::collection::vec(rgba_pixel(), (width * height) as usize).prop_map(move |pixels| {
            let mut image = RgbaImage::new(width, height);
            for (dst, src) in image.pixels_mut().zip(pixels) {
                *dst = src;
            }
            image
        })
    })
}

/// Strategy for in-range placement fractions
fn fraction() -> impl Strategy<Value = f32> {
    (0u32..=100).prop_map(|v| v as f32 / 100.0)
}

proptest! {
    #[test]
    fn copy_then_mutate_leaves_original_untouched(image in rgba_image(), threshold in any::<u8>()) {
        let original = ImageHandler::new(DynamicImage::ImageRgba8(image.clone()));
        let mut copy = original.copy();
        copy.convert_to_mask(threshold);
        copy.resize(1, 1, false).unwrap();

        prop_assert_eq!(original.image().to_rgba8(), image);
    }

    #[test]
    fn mask_follows_alpha_threshold(image in rgba_image(), threshold in any::<u8>()) {
        let mask = alpha_to_mask(&image, threshold);
        prop_assert_eq!(mask.dimensions(), image.dimensions());

        for (src, out) in image.pixels().zip(mask.pixels()) {
            if src[3] <= threshold {
                prop_assert_eq!(*out, BACKGROUND_PIXEL);
            } else {
                prop_assert_eq!(*out, SUBJECT_PIXEL);
            }
        }
    }

    #[test]
    fn thumbnail_never_exceeds_bounds_or_original(
        (width, height) in (1u32..=64, 1u32..=64),
        (box_width, box_height) in (1u32..=64, 1u32..=64),
    ) {
        let image = DynamicImage::new_rgba8(width, height);
        let (new_width, new_height) = thumbnail(&image, box_width, box_height).unwrap().dimensions();

        prop_assert!(new_width >= 1 && new_height >= 1);
        prop_assert!(new_width <= box_width.max(1) && new_height <= box_height.max(1));
        prop_assert!(new_width <= width && new_height <= height);
    }

    #[test]
    fn fit_preserves_aspect_within_rounding(
        (width, height) in (1u32..=500, 1u32..=500),
        (box_width, box_height) in (1u32..=500, 1u32..=500),
    ) {
        let (new_width, new_height) = fit_dimensions((width, height), (box_width, box_height));
        let lhs = i64::from(new_width) * i64::from(height);
        let rhs = i64::from(new_height) * i64::from(width);
        prop_assert!((lhs - rhs).abs() <= i64::from(width) + i64::from(height));
    }

    #[test]
    fn unit_enhance_factors_are_identity(image in rgba_image()) {
        let source = DynamicImage::ImageRgba8(image.clone());
        let factors = EnhanceFactors::new().color(1.0).contrast(1.0).brightness(1.0).sharpness(1.0);
        let result = enhance(&source, &factors).unwrap();
        prop_assert_eq!(result.to_rgba8(), image);
    }

    #[test]
    fn composite_mask_marks_exactly_the_opaque_subject(
        subject_pixel in (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgba([r, g, b, 255])),
        (left, top) in (fraction(), fraction()),
    ) {
        let subject = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, subject_pixel));
        let background = DynamicImage::ImageRgba8(RgbaImage::from_pixel(32, 32, Rgba([1, 2, 3, 255])));
        let options = CompositeOptions::builder()
            .placement(Placement::original().with_center(Some(left), Some(top)))
            .solid_color(Some(SolidColor::rgb(9, 9, 9)))
            .build()
            .unwrap();

        let result = add_new_background_gen_mask(subject, &background, &options).unwrap();
        let image = result.image.to_rgba8();
        let mask = result.mask.to_rgba8();

        for (out, m) in image.pixels().zip(mask.pixels()) {
            if *m == SUBJECT_PIXEL {
                prop_assert_eq!(*out, subject_pixel);
            } else {
                prop_assert_eq!(*m, BACKGROUND_PIXEL);
                prop_assert_eq!(out.0, [9, 9, 9, 255]);
            }
        }
    }
}
