//! Error types for background removal and compositing operations

use thiserror::Error;

/// Result type alias for bgswap operations
pub type Result<T> = std::result::Result<T, BgSwapError>;

/// Error kinds surfaced by image handling, segmentation and compositing
#[derive(Error, Debug)]
pub enum BgSwapError {
    /// Unreadable or unreachable image source, or a failed save
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes that are not a decodable image
    #[error("Decode error: {0}")]
    Decode(String),

    /// The codec refused to encode the image
    #[error("Encode error: {0}")]
    Encode(String),

    /// Segmentation backend failure or unavailability
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal shape or tensor inconsistencies
    #[error("Processing error: {0}")]
    Processing(String),
}

impl BgSwapError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        Self::Io(std::io::Error::new(
            error.kind(),
            format!(
                "Failed to {} '{}': {}",
                operation,
                path.as_ref().display(),
                error
            ),
        ))
    }

    /// Create a network fetch error. Fetch failures are reported as I/O errors.
    pub fn fetch_error<E: std::fmt::Display>(url: &str, error: E) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to fetch image from '{}': {}", url, error),
        ))
    }

    /// Classify an `image` crate error raised while decoding
    pub fn from_image_error(context: &str, error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(io) => Self::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {}", context, io),
            )),
            other => Self::Decode(format!("{}: {}", context, other)),
        }
    }

    /// Classify an `image` crate error raised while encoding or saving
    pub fn from_encode_error(context: &str, error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(io) => Self::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {}", context, io),
            )),
            other => Self::Encode(format!("{}: {}", context, other)),
        }
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }
}
