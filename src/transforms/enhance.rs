//! Color, contrast, brightness and sharpness enhancement
//!
//! Every enhancer interpolates between the image and a "degenerate" version
//! of it: `out = degenerate + factor * (image - degenerate)`. A factor of 1.0
//! returns the image unchanged, 0.0 returns the degenerate image and larger
//! factors extrapolate away from it. Alpha is never touched.
//!
//! | property   | degenerate image                         |
//! |------------|------------------------------------------|
//! | color      | per-pixel luma grey                      |
//! | contrast   | flat grey at the image's mean luma       |
//! | brightness | black                                    |
//! | sharpness  | 3x3 smoothed copy, border pixels as-is   |

use crate::error::{BgSwapError, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// 3x3 smoothing kernel used as the sharpness degenerate (weights sum to 13)
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_KERNEL_SUM: u32 = 13;

/// Optional enhancement factors, applied in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnhanceFactors {
    /// Color saturation (0.0 gives greyscale)
    pub color: Option<f32>,
    /// Contrast (0.0 gives flat mean grey)
    pub contrast: Option<f32>,
    /// Brightness (0.0 gives black)
    pub brightness: Option<f32>,
    /// Sharpness (0.0 gives a smoothed image)
    pub sharpness: Option<f32>,
}

impl EnhanceFactors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn color(mut self, factor: f32) -> Self {
        self.color = Some(factor);
        self
    }

    #[must_use]
    pub fn contrast(mut self, factor: f32) -> Self {
        self.contrast = Some(factor);
        self
    }

    #[must_use]
    pub fn brightness(mut self, factor: f32) -> Self {
        self.brightness = Some(factor);
        self
    }

    #[must_use]
    pub fn sharpness(mut self, factor: f32) -> Self {
        self.sharpness = Some(factor);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.contrast.is_none()
            && self.brightness.is_none()
            && self.sharpness.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, factor) in [
            ("color factor", self.color),
            ("contrast factor", self.contrast),
            ("brightness factor", self.brightness),
            ("sharpness factor", self.sharpness),
        ] {
            if let Some(f) = factor {
                if !f.is_finite() {
                    return Err(BgSwapError::invalid_config(format!(
                        "Invalid {name}: {f} (must be finite)"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// ITU-R 601 luma of an RGB triple
#[inline]
fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b))
        .round()
        .clamp(0.0, 255.0) as u8
}

#[inline]
fn interpolate(degenerate: u8, value: u8, factor: f32) -> u8 {
    let d = f32::from(degenerate);
    (d + factor * (f32::from(value) - d)).round().clamp(0.0, 255.0) as u8
}

/// Blend every pixel with its degenerate RGB value, keeping alpha
fn blend_with<F>(image: &RgbaImage, factor: f32, degenerate: F) -> RgbaImage
where
    F: Fn(u32, u32, &Rgba<u8>) -> [u8; 3],
{
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let [dr, dg, db] = degenerate(x, y, &*pixel);
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([
            interpolate(dr, r, factor),
            interpolate(dg, g, factor),
            interpolate(db, b, factor),
            a,
        ]);
    }
    out
}

/// Scale color saturation
#[must_use]
pub fn adjust_color(image: &RgbaImage, factor: f32) -> RgbaImage {
    blend_with(image, factor, |_, _, p| {
        let l = luma(p);
        [l, l, l]
    })
}

/// Scale contrast around the mean luma
#[must_use]
pub fn adjust_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return image.clone();
    }
    let total: u64 = image.pixels().map(|p| u64::from(luma(p))).sum();
    let mean = ((total as f64 / count as f64) + 0.5) as u8;

    blend_with(image, factor, |_, _, _| [mean, mean, mean])
}

/// Scale brightness towards or away from black
#[must_use]
pub fn adjust_brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    blend_with(image, factor, |_, _, _| [0, 0, 0])
}

/// Smooth RGB with the 3x3 kernel; the one-pixel border is copied
fn smooth(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut out = image.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = [0u32; 3];
            for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
                for (kx, &weight) in row.iter().enumerate() {
                    let p = image.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1);
                    for (sum, &channel) in acc.iter_mut().zip(&p.0[..3]) {
                        *sum += weight * u32::from(channel);
                    }
                }
            }
            let alpha = image.get_pixel(x, y)[3];
            let [r, g, b] =
                acc.map(|sum| ((sum + SMOOTH_KERNEL_SUM / 2) / SMOOTH_KERNEL_SUM).min(255) as u8);
            out.put_pixel(x, y, Rgba([r, g, b, alpha]));
        }
    }
    out
}

/// Scale sharpness relative to a smoothed copy
#[must_use]
pub fn adjust_sharpness(image: &RgbaImage, factor: f32) -> RgbaImage {
    let smoothed = smooth(image);
    blend_with(image, factor, |x, y, _| {
        let p = smoothed.get_pixel(x, y);
        [p[0], p[1], p[2]]
    })
}

/// Apply every present factor in the order color, contrast, brightness, sharpness
///
/// With no factors the image is returned unchanged.
pub fn enhance(image: &DynamicImage, factors: &EnhanceFactors) -> Result<DynamicImage> {
    factors.validate()?;
    if factors.is_empty() {
        return Ok(image.clone());
    }

    let mut rgba = image.to_rgba8();
    if let Some(f) = factors.color {
        rgba = adjust_color(&rgba, f);
    }
    if let Some(f) = factors.contrast {
        rgba = adjust_contrast(&rgba, f);
    }
    if let Some(f) = factors.brightness {
        rgba = adjust_brightness(&rgba, f);
    }
    if let Some(f) = factors.sharpness {
        rgba = adjust_sharpness(&rgba, f);
    }
    Ok(DynamicImage::ImageRgba8(rgba))
}
