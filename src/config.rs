//! Configuration types for background removal and compositing

use crate::{
    error::{BgSwapError, Result},
    types::{BackgroundFill, Placement, SolidColor},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default alpha threshold used when deriving masks
pub const DEFAULT_MASK_THRESHOLD: u8 = 25;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// JPEG (no transparency, alpha is dropped)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
    /// TIFF with alpha channel transparency and lossless compression
    Tiff,
}

impl OutputFormat {
    /// File extension conventionally used for this format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Tiff => "tiff",
        }
    }

    #[must_use]
    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }

    /// Whether the format keeps the alpha channel
    #[must_use]
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Guess the format from a path's extension
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::WebP => write!(f, "WebP"),
            Self::Tiff => write!(f, "TIFF"),
        }
    }
}

/// Options for compositing a subject onto a new background
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    /// Alpha threshold for the derived mask (alpha <= threshold is background)
    pub mask_threshold: u8,

    /// Subject size and center position relative to the background
    pub placement: Placement,

    /// Replace the background image with `solid_color` in the visible output
    pub use_solid_color: bool,

    /// Fill color used when `use_solid_color` is set
    pub solid_color: SolidColor,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            placement: Placement::new(0.5, 0.5, 0.7),
            use_solid_color: false,
            solid_color: SolidColor::default(),
        }
    }
}

impl CompositeOptions {
    #[must_use]
    pub fn builder() -> CompositeOptionsBuilder {
        CompositeOptionsBuilder::default()
    }

    /// Background fill for the visible output
    #[must_use]
    pub fn visible_fill(&self) -> BackgroundFill {
        if self.use_solid_color {
            BackgroundFill::Solid(self.solid_color)
        } else {
            BackgroundFill::Image
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.placement.validate()
    }
}

/// Builder for `CompositeOptions`
#[derive(Debug, Default)]
pub struct CompositeOptionsBuilder {
    options: CompositeOptions,
}

impl CompositeOptionsBuilder {
    #[must_use]
    pub fn mask_threshold(mut self, threshold: u8) -> Self {
        self.options.mask_threshold = threshold;
        self
    }

    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.options.placement = placement;
        self
    }

    /// Set the subject size fraction (`None` keeps the original size)
    #[must_use]
    pub fn size_fraction(mut self, fraction: Option<f32>) -> Self {
        self.options.placement.size_fraction = fraction;
        self
    }

    /// Set the subject center (`None` pastes at the top-left corner)
    #[must_use]
    pub fn center(mut self, center: Option<(f32, f32)>) -> Self {
        let (left, top) = center.unzip();
        self.options.placement.left_fraction = left;
        self.options.placement.top_fraction = top;
        self
    }

    /// Use a solid color instead of the background image
    #[must_use]
    pub fn solid_color(mut self, color: Option<SolidColor>) -> Self {
        self.options.use_solid_color = color.is_some();
        if let Some(color) = color {
            self.options.solid_color = color;
        }
        self
    }

    pub fn build(self) -> Result<CompositeOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Configuration for the background processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Alpha threshold for the mask derived after background removal
    pub removal_mask_threshold: u8,

    /// Options for the background composite pipeline
    pub composite: CompositeOptions,

    /// Output format for result images (masks are always PNG)
    pub output_format: OutputFormat,

    /// JPEG quality (0-100, only used for JPEG output)
    pub jpeg_quality: u8,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            removal_mask_threshold: DEFAULT_MASK_THRESHOLD,
            composite: CompositeOptions::default(),
            output_format: OutputFormat::default(),
            jpeg_quality: 90,
        }
    }
}

impl ProcessorConfig {
    #[must_use]
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| BgSwapError::file_io_error("read config file", path_ref, &e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            BgSwapError::invalid_config(format!(
                "Failed to parse config file '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(BgSwapError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(90),
            ));
        }
        self.composite.validate()
    }
}

/// Builder for `ProcessorConfig`
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    #[must_use]
    pub fn removal_mask_threshold(mut self, threshold: u8) -> Self {
        self.config.removal_mask_threshold = threshold;
        self
    }

    #[must_use]
    pub fn composite(mut self, options: CompositeOptions) -> Self {
        self.config.composite = options;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Set JPEG quality, clamped to 100
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    pub fn build(self) -> Result<ProcessorConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
