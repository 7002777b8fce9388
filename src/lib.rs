#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # bgswap
//!
//! Background removal, background replacement and subject mask generation for
//! inpainting workflows.
//!
//! Every pipeline returns a pair: the processed image and a binary mask where
//! opaque black marks the subject and transparent white marks everything
//! else. Masks are meant to be fed to an inpainting model together with the
//! image.
//!
//! ## Features
//!
//! - **Background removal** through any [`Segmenter`]; closures work too
//! - **Background replacement** onto an image or a solid color, with the
//!   subject scaled and positioned by fractions of the background
//! - **Adjustments**: thumbnail/exact resize and color, contrast, brightness
//!   and sharpness enhancement
//! - **Pure Rust model backend**: U2-Net/ISNet style ONNX models run with
//!   Tract (`tract` feature)
//! - **Sources**: files, encoded bytes and `http(s)` URLs
//! - **CLI**: the `bgswap` binary (`cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgswap::{add_new_background_gen_mask, CompositeOptions, ImageHandler, OutputFormat, Placement};
//!
//! # fn example() -> bgswap::Result<()> {
//! let subject = ImageHandler::from_path("cutout.png")?.into_image();
//! let background = ImageHandler::from_path("beach.jpg")?.into_image();
//!
//! let options = CompositeOptions::builder()
//!     .placement(Placement::new(0.4, 0.5, 0.7))
//!     .build()?;
//! let result = add_new_background_gen_mask(subject, &background, &options)?;
//! result.save("composite.png", "mask.png", OutputFormat::Png, 90)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Background removal with a model
//!
//! ```rust,no_run
//! # #[cfg(feature = "tract")]
//! # fn example() -> bgswap::Result<()> {
//! use bgswap::{remove_background_gen_mask, ImageHandler, PreprocessingConfig, TractSegmenter};
//!
//! let segmenter = TractSegmenter::from_path("u2net.onnx", PreprocessingConfig::u2net())?;
//! let image = ImageHandler::from_path("photo.jpg")?.into_image();
//! let result = remove_background_gen_mask(image, 25, &segmenter)?;
//! ImageHandler::new(result.image).save("cutout.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): Tract segmentation backend
//! - `cli` (default): command-line interface
//! - `webp-support` (default): WebP image format support
//! - `tracing-json`: JSON log output for the CLI

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod processor;
pub mod segmentation;
pub mod services;
pub mod tracing_config;
pub mod transforms;
pub mod types;
pub mod utils;

// Public API exports
#[cfg(feature = "tract")]
pub use backends::{TractBackend, TractSegmenter};
pub use config::{CompositeOptions, OutputFormat, ProcessorConfig, ProcessorConfigBuilder};
pub use error::{BgSwapError, Result};
pub use handler::{ImageHandler, ImageSource};
pub use pipeline::{add_new_background_gen_mask, remove_background_gen_mask};
pub use processor::BackgroundProcessor;
pub use segmentation::{InferenceBackend, ModelSegmenter, Segmenter};
pub use services::ImageIOService;
pub use transforms::EnhanceFactors;
pub use types::{BackgroundFill, MaskedImage, Placement, SegmentationMask, SolidColor};
pub use utils::PreprocessingConfig;

#[cfg(feature = "cli")]
pub use tracing_config::init_cli_tracing;
pub use tracing_config::{TracingConfig, TracingFormat};
