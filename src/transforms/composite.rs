//! Compositing a subject onto a background
//!
//! The subject's alpha channel is the paste mask: every output channel,
//! alpha included, is `(src * a + dst * (255 - a)) / 255` where `a` is the
//! subject pixel's alpha. Fully opaque subject pixels replace the background
//! and fully transparent ones leave it untouched.

use super::resize::scale_to_fit;
use crate::{
    error::Result,
    types::{BackgroundFill, Placement},
};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use tracing::debug;

/// Box the subject is fitted into for a given size fraction
#[must_use]
pub fn subject_box(background: (u32, u32), size_fraction: f32) -> (u32, u32) {
    let (bg_width, bg_height) = background;
    let scale = |extent: u32| ((f64::from(extent) * f64::from(size_fraction)).round() as u32).max(1);
    (scale(bg_width), scale(bg_height))
}

/// Top-left paste coordinate for a subject of the given size
///
/// When both center fractions are present the subject is centered on
/// `(left * bg_width, top * bg_height)`, truncating towards zero; otherwise
/// it is pasted at the origin. The result may be negative.
#[must_use]
pub fn paste_origin(background: (u32, u32), subject: (u32, u32), placement: &Placement) -> (i64, i64) {
    let Some((left, top)) = placement.center() else {
        return (0, 0);
    };
    let (bg_width, bg_height) = background;
    let (subject_width, subject_height) = subject;

    let x = f64::from(left) * f64::from(bg_width) - f64::from(subject_width) / 2.0;
    let y = f64::from(top) * f64::from(bg_height) - f64::from(subject_height) / 2.0;
    (x.trunc() as i64, y.trunc() as i64)
}

#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(src) * a + u32::from(dst) * (255 - a) + 127) / 255) as u8
}

/// Paste `subject` onto `canvas` at `(x, y)` using the subject's alpha as mask
///
/// Parts of the subject falling outside the canvas are clipped.
pub fn paste_with_alpha(canvas: &mut RgbaImage, subject: &RgbaImage, x: i64, y: i64) {
    let (canvas_width, canvas_height) = canvas.dimensions();
    let (subject_width, subject_height) = subject.dimensions();

    // Overlap in subject coordinates
    let sx_start = (-x).clamp(0, i64::from(subject_width));
    let sy_start = (-y).clamp(0, i64::from(subject_height));
    let sx_end = (i64::from(canvas_width) - x).clamp(0, i64::from(subject_width));
    let sy_end = (i64::from(canvas_height) - y).clamp(0, i64::from(subject_height));

    for sy in sy_start..sy_end {
        for sx in sx_start..sx_end {
            let src = subject.get_pixel(sx as u32, sy as u32);
            let alpha = src[3];
            if alpha == 0 {
                continue;
            }

            let dst = canvas.get_pixel_mut((x + sx) as u32, (y + sy) as u32);
            *dst = if alpha == u8::MAX {
                *src
            } else {
                Rgba([
                    blend_channel(src[0], dst[0], alpha),
                    blend_channel(src[1], dst[1], alpha),
                    blend_channel(src[2], dst[2], alpha),
                    blend_channel(src[3], dst[3], alpha),
                ])
            };
        }
    }
}

/// Composite `subject` onto a copy of `background`, or onto a solid fill of the
/// same dimensions
///
/// The subject is first scaled (aspect preserved, upscaling allowed) to fit
/// the box given by `placement.size_fraction`, then positioned by
/// `placement`'s center fractions. `background` is never modified.
pub fn add_background(
    subject: &DynamicImage,
    background: &DynamicImage,
    placement: &Placement,
    fill: BackgroundFill,
) -> Result<DynamicImage> {
    placement.validate()?;
    let bg_dimensions = background.dimensions();

    let mut canvas = match fill {
        BackgroundFill::Image => background.to_rgba8(),
        BackgroundFill::Solid(color) => {
            RgbaImage::from_pixel(bg_dimensions.0, bg_dimensions.1, color.to_pixel())
        },
    };

    let subject = match placement.size_fraction {
        Some(fraction) => {
            let (box_width, box_height) = subject_box(bg_dimensions, fraction);
            scale_to_fit(subject, box_width, box_height)?.to_rgba8()
        },
        None => subject.to_rgba8(),
    };

    let (x, y) = paste_origin(bg_dimensions, subject.dimensions(), placement);
    debug!(
        subject_width = subject.width(),
        subject_height = subject.height(),
        x,
        y,
        "Pasting subject onto background"
    );

    paste_with_alpha(&mut canvas, &subject, x, y);
    Ok(DynamicImage::ImageRgba8(canvas))
}
