//! Core types shared by the transforms, the handler and the pipelines

use crate::{
    config::OutputFormat,
    error::{BgSwapError, Result},
    services::ImageIOService,
};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Solid RGBA fill color
///
/// Parses from `#rgb`, `#rrggbb` and `#rrggbbaa` hex strings (the leading `#` is
/// optional) and serializes back to `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SolidColor(pub [u8; 4]);

impl SolidColor {
    /// Fully transparent white, used to isolate the subject on the mask branch
    pub const TRANSPARENT_WHITE: Self = Self([255, 255, 255, 0]);

    /// Opaque black
    pub const BLACK: Self = Self([0, 0, 0, 255]);

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[must_use]
    pub fn to_pixel(self) -> Rgba<u8> {
        Rgba(self.0)
    }

    #[must_use]
    pub fn alpha(self) -> u8 {
        self.0[3]
    }
}

impl Default for SolidColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for SolidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl FromStr for SolidColor {
    type Err = BgSwapError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(BgSwapError::invalid_config(format!(
                "Invalid color '{s}': expected #rgb, #rrggbb or #rrggbbaa"
            )));
        }
        let channel = |range: std::ops::Range<usize>| -> Result<u8> {
            hex.get(range)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| BgSwapError::invalid_config(format!("Invalid color '{s}'")))
        };

        match hex.len() {
            3 => {
                // #rgb expands each nibble: 0xf -> 0xff
                let r = channel(0..1)?;
                let g = channel(1..2)?;
                let b = channel(2..3)?;
                Ok(Self::rgb(r * 17, g * 17, b * 17))
            },
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(BgSwapError::invalid_config(format!(
                "Invalid color '{s}': expected #rgb, #rrggbb or #rrggbbaa"
            ))),
        }
    }
}

impl TryFrom<String> for SolidColor {
    type Error = BgSwapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SolidColor> for String {
    fn from(color: SolidColor) -> Self {
        color.to_string()
    }
}

/// What the subject is composited onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundFill {
    /// The supplied background image
    #[default]
    Image,
    /// A solid color at the background's dimensions
    Solid(SolidColor),
}

/// Size and position of the subject relative to the background
///
/// All fractions are relative to the background's width and height. The
/// position fractions locate the subject's center and only take effect when
/// both are present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    /// Subject size as a fraction of the background (fit within the box)
    ///
    /// Any `Some` value counts as given, including `0.0`, which shrinks the
    /// subject to a single pixel. `None` keeps the subject's original size.
    pub size_fraction: Option<f32>,
    /// Horizontal center of the subject as a fraction of background width
    pub left_fraction: Option<f32>,
    /// Vertical center of the subject as a fraction of background height
    pub top_fraction: Option<f32>,
}

impl Placement {
    /// Keep the subject's size and paste it at the top-left corner
    #[must_use]
    pub fn original() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(size_fraction: f32, left_fraction: f32, top_fraction: f32) -> Self {
        Self {
            size_fraction: Some(size_fraction),
            left_fraction: Some(left_fraction),
            top_fraction: Some(top_fraction),
        }
    }

    #[must_use]
    pub fn with_size(mut self, size_fraction: Option<f32>) -> Self {
        self.size_fraction = size_fraction;
        self
    }

    #[must_use]
    pub fn with_center(mut self, left_fraction: Option<f32>, top_fraction: Option<f32>) -> Self {
        self.left_fraction = left_fraction;
        self.top_fraction = top_fraction;
        self
    }

    /// Center position when both fractions are present
    #[must_use]
    pub fn center(&self) -> Option<(f32, f32)> {
        self.left_fraction.zip(self.top_fraction)
    }

    /// Check every present fraction is finite and within 0.0-1.0
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("size fraction", self.size_fraction),
            ("left fraction", self.left_fraction),
            ("top fraction", self.top_fraction),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(BgSwapError::config_value_error(
                        name,
                        v,
                        "0.0-1.0",
                        Some(0.5),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Per-pixel subject coverage produced by a segmentation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Coverage values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Use the mask as the alpha channel of an RGBA image
    ///
    /// Pixels with zero coverage become fully transparent black.
    pub fn apply_to_image(&self, image: &mut RgbaImage) -> Result<()> {
        if image.dimensions() != self.dimensions {
            let (iw, ih) = image.dimensions();
            let (mw, mh) = self.dimensions;
            return Err(BgSwapError::processing(format!(
                "Image and mask dimensions do not match: image {iw}x{ih}, mask {mw}x{mh}"
            )));
        }

        for (pixel, &alpha) in image.pixels_mut().zip(&self.data) {
            *pixel = if alpha > 0 {
                Rgba([pixel[0], pixel[1], pixel[2], alpha])
            } else {
                Rgba([0, 0, 0, 0])
            };
        }

        Ok(())
    }

    /// Fraction of pixels with more than half coverage
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&v| v > 127).count();
        foreground as f32 / self.data.len() as f32
    }
}

/// An image paired with the binary mask derived from it
#[derive(Debug, Clone)]
pub struct MaskedImage {
    /// The background-removed or composited image
    pub image: DynamicImage,
    /// Opaque-black / transparent-white subject mask
    pub mask: DynamicImage,
}

impl MaskedImage {
    #[must_use]
    pub fn new(image: DynamicImage, mask: DynamicImage) -> Self {
        Self { image, mask }
    }

    /// Number of mask pixels classified as subject
    #[must_use]
    pub fn subject_pixel_count(&self) -> usize {
        self.mask
            .to_rgba8()
            .pixels()
            .filter(|p| p[3] == u8::MAX)
            .count()
    }

    /// Save the image and its mask, creating parent directories
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        image_path: P,
        mask_path: Q,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        ImageIOService::save_image_with_format(&self.image, image_path, format, quality)?;
        // Masks need exact alpha, so they are always written losslessly
        ImageIOService::save_image_with_format(&self.mask, mask_path, OutputFormat::Png, quality)
    }
}
