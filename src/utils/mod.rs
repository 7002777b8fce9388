//! Tensor preprocessing and postprocessing for model-backed segmentation

pub mod postprocessing;
pub mod preprocessing;

pub use postprocessing::MaskPostprocessor;
pub use preprocessing::{ImagePreprocessor, Letterbox, PreprocessingConfig};
