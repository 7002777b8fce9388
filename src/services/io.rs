//! Image I/O operations service
//!
//! This module separates file, network and codec operations from the pixel
//! transforms, making the transforms testable without touching the filesystem.

use crate::{
    config::OutputFormat,
    error::{BgSwapError, Result},
};
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// User agent sent when fetching images over HTTP
const USER_AGENT: &str = concat!("bgswap/", env!("CARGO_PKG_VERSION"));

/// Service for handling image input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based format detection is tried first, then content sniffing.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgswap::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("input.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(image::ImageError::IoError(e)) => {
                Err(BgSwapError::file_io_error("read image file", path_ref, &e))
            },
            Err(e) => {
                debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref)
                    .map_err(|io_err| BgSwapError::file_io_error("read image data", path_ref, &io_err))?;

                image::load_from_memory(&data).map_err(|content_err| {
                    BgSwapError::from_image_error(
                        &format!(
                            "Failed to decode '{}' ({} bytes)",
                            path_ref.display(),
                            data.len()
                        ),
                        content_err,
                    )
                })
            },
        }
    }

    /// Decode an image from raw bytes
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            BgSwapError::from_image_error(
                &format!("Failed to decode image from {} bytes", bytes.len()),
                e,
            )
        })
    }

    /// Fetch the raw bytes behind a URL
    ///
    /// Transport failures and non-success status codes are reported as I/O errors.
    pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
        debug!(url = %url, "Fetching image");

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BgSwapError::fetch_error(url, e))?;

        let response = client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| BgSwapError::fetch_error(url, e))?;

        let bytes = response
            .bytes()
            .map_err(|e| BgSwapError::fetch_error(url, e))?;

        debug!(url = %url, bytes = bytes.len(), "Fetched image");
        Ok(bytes.to_vec())
    }

    /// Fetch and decode an image from a URL
    pub fn fetch_image(url: &str) -> Result<DynamicImage> {
        let bytes = Self::fetch_bytes(url)?;
        Self::load_from_bytes(&bytes)
    }

    /// Save an image, choosing the format from the path's extension
    ///
    /// Missing parent directories are created. Paths without a recognized
    /// extension are written as PNG.
    pub fn save_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let format = OutputFormat::from_path(path_ref).unwrap_or_default();
        Self::save_image_with_format(image, path_ref, format, 90)
    }

    /// Save an image in the given format, creating parent directories
    pub fn save_image_with_format<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    BgSwapError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }

        let bytes = Self::encode(image, format, quality)?;
        std::fs::write(path_ref, bytes)
            .map_err(|e| BgSwapError::file_io_error("write image", path_ref, &e))?;

        debug!(path = %path_ref.display(), format = %format, "Saved image");
        Ok(())
    }

    /// Encode an image into memory
    ///
    /// JPEG drops the alpha channel; the other formats keep RGBA.
    pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        let result = match format {
            OutputFormat::Jpeg => {
                let rgb_image = image.to_rgb8();
                let mut encoder =
                    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.min(100));
                encoder.encode_image(&rgb_image)
            },
            OutputFormat::Png | OutputFormat::WebP | OutputFormat::Tiff => {
                DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut cursor, format.image_format())
            },
        };

        result.map_err(|e| BgSwapError::from_encode_error(&format!("Failed to encode as {format}"), e))?;
        Ok(buffer)
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "jpg" | "jpeg" | "png" | "webp" | "tiff" | "tif" | "bmp"
                )
            })
    }

    /// Whether a location string is an HTTP(S) URL
    #[must_use]
    pub fn is_url(location: &str) -> bool {
        let lower = location.trim_start().to_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_image() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([200, 100, 50, 255]));
        img.put_pixel(0, 0, Rgba([1, 2, 3, 0]));
        img.put_pixel(3, 2, Rgba([9, 8, 7, 128]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_png_roundtrip_preserves_alpha() {
        let image = sample_image();
        let bytes = ImageIOService::encode(&image, OutputFormat::Png, 90).unwrap();
        let decoded = ImageIOService::load_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8(), image.to_rgba8());
    }

    #[test]
    fn test_jpeg_encoding_drops_alpha() {
        let bytes = ImageIOService::encode(&sample_image(), OutputFormat::Jpeg, 80).unwrap();
        let decoded = ImageIOService::load_from_bytes(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_load_from_invalid_bytes() {
        let err = ImageIOService::load_from_bytes(b"not an image at all").unwrap_err();
        assert!(matches!(err, BgSwapError::Decode(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageIOService::load_image(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, BgSwapError::Io(_)));
    }

    #[test]
    fn test_load_with_wrong_extension_uses_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        let bytes = ImageIOService::encode(&sample_image(), OutputFormat::Png, 90).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let loaded = ImageIOService::load_image(&path).unwrap();
        assert_eq!(loaded.to_rgba8(), sample_image().to_rgba8());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.png");
        ImageIOService::save_image(&sample_image(), &path).unwrap();

        assert!(path.exists());
        let loaded = ImageIOService::load_image(&path).unwrap();
        assert_eq!(loaded.to_rgba8(), sample_image().to_rgba8());
    }

    #[test]
    fn test_save_unknown_extension_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.out");
        ImageIOService::save_image(&sample_image(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn test_supported_format_and_url_detection() {
        assert!(ImageIOService::is_supported_format("photo.JPG"));
        assert!(ImageIOService::is_supported_format("scan.tif"));
        assert!(!ImageIOService::is_supported_format("notes.txt"));
        assert!(!ImageIOService::is_supported_format("no_extension"));

        assert!(ImageIOService::is_url("https://example.com/a.png"));
        assert!(ImageIOService::is_url("HTTP://example.com/a.png"));
        assert!(!ImageIOService::is_url("/tmp/a.png"));
        assert!(!ImageIOService::is_url("ftp://example.com/a.png"));
    }
}
