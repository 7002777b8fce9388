//! Stateful wrapper around a single in-memory image
//!
//! An [`ImageHandler`] owns exactly one image. Every operation replaces the
//! held image with its result, so pipelines read as a chain of steps over one
//! value. Use [`ImageHandler::copy`] to branch.

use crate::{
    config::OutputFormat,
    error::Result,
    segmentation::Segmenter,
    services::ImageIOService,
    transforms::{self, EnhanceFactors},
    types::{BackgroundFill, Placement},
};
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an image comes from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An already decoded image
    Image(DynamicImage),
    /// A file on disk, format detected from extension or content
    Path(PathBuf),
    /// An `http(s)` URL, optionally stored to `store_path` after download
    Url {
        url: String,
        store_path: Option<PathBuf>,
    },
    /// Encoded image bytes
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Interpret a command-line style location as a URL or a path
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if ImageIOService::is_url(location) {
            Self::Url {
                url: location.to_string(),
                store_path: None,
            }
        } else {
            Self::Path(PathBuf::from(location))
        }
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandler {
    image: DynamicImage,
}

impl ImageHandler {
    #[must_use]
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Load from a file
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `Decode` when its content is not a supported image
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        ImageIOService::load_image(path).map(Self::new)
    }

    /// Decode encoded image bytes
    ///
    /// # Errors
    /// - `Decode` when the bytes are not a supported image
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ImageIOService::load_from_bytes(bytes).map(Self::new)
    }

    /// Download and decode an image, saving it to `store_path` when given
    ///
    /// # Errors
    /// - `Io` on network failures, HTTP error statuses or a failed save
    /// - `Decode` when the response body is not a supported image
    pub fn from_url(url: &str, store_path: Option<&Path>) -> Result<Self> {
        let handler = ImageIOService::fetch_image(url).map(Self::new)?;
        if let Some(path) = store_path {
            debug!(url, path = %path.display(), "Storing downloaded image");
            handler.save(path)?;
        }
        Ok(handler)
    }

    /// Construct from any [`ImageSource`]
    pub fn open(source: ImageSource) -> Result<Self> {
        match source {
            ImageSource::Image(image) => Ok(Self::new(image)),
            ImageSource::Path(path) => Self::from_path(path),
            ImageSource::Url { url, store_path } => Self::from_url(&url, store_path.as_deref()),
            ImageSource::Bytes(bytes) => Self::from_bytes(&bytes),
        }
    }

    /// Resize the held image
    ///
    /// With `preserve_aspect_ratio` the image is shrunk to fit within the box
    /// and never enlarged; otherwise it is stretched to exactly
    /// `width` x `height`.
    ///
    /// # Errors
    /// - `InvalidConfig` when either target dimension is zero
    pub fn resize(&mut self, width: u32, height: u32, preserve_aspect_ratio: bool) -> Result<&mut Self> {
        self.image = transforms::resize(&self.image, width, height, preserve_aspect_ratio)?;
        Ok(self)
    }

    /// Apply the present enhancement factors
    pub fn enhance(&mut self, factors: &EnhanceFactors) -> Result<&mut Self> {
        self.image = transforms::enhance(&self.image, factors)?;
        Ok(self)
    }

    /// Replace the held image with the segmenter's output
    ///
    /// # Errors
    /// Segmenter errors are returned as-is.
    pub fn remove_background(&mut self, segmenter: &dyn Segmenter) -> Result<&mut Self> {
        debug!(segmenter = segmenter.name(), "Removing background");
        self.image = segmenter.segment(&self.image)?;
        Ok(self)
    }

    /// Composite the held image onto `background` (or a solid fill)
    ///
    /// `background` is read, never modified.
    ///
    /// # Errors
    /// - `InvalidConfig` when a placement fraction is outside 0.0..=1.0
    pub fn add_background(
        &mut self,
        background: &DynamicImage,
        placement: &Placement,
        fill: BackgroundFill,
    ) -> Result<&mut Self> {
        self.image = transforms::add_background(&self.image, background, placement, fill)?;
        Ok(self)
    }

    /// Replace the held image with its binary alpha mask
    pub fn convert_to_mask(&mut self, threshold: u8) -> &mut Self {
        self.image = transforms::convert_to_mask(&self.image, threshold);
        self
    }

    /// Independent handler over a deep copy of the image
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Save with the format implied by the extension (PNG when unknown)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ImageIOService::save_image(&self.image, path)
    }

    pub fn save_with_format<P: AsRef<Path>>(&self, path: P, format: OutputFormat, quality: u8) -> Result<()> {
        ImageIOService::save_image_with_format(&self.image, path, format, quality)
    }

    pub fn to_bytes(&self, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        ImageIOService::encode(&self.image, format, quality)
    }

    #[must_use]
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl From<DynamicImage> for ImageHandler {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
