//! Segmenter construction for the CLI

use crate::cli::main_impl::ModelKind;
use crate::segmentation::Segmenter;
#[cfg(feature = "tract")]
use crate::utils::PreprocessingConfig;
use anyhow::Result;
use std::path::Path;

#[cfg(feature = "tract")]
impl ModelKind {
    pub(crate) fn preprocessing(self) -> PreprocessingConfig {
        match self {
            ModelKind::U2net => PreprocessingConfig::u2net(),
            ModelKind::Isnet => PreprocessingConfig::isnet(),
        }
    }
}

/// Load the ONNX model at `model_path` as a segmenter
#[cfg(feature = "tract")]
pub(crate) fn create_segmenter(model_path: &Path, kind: ModelKind) -> Result<Box<dyn Segmenter>> {
    use crate::backends::TractSegmenter;
    use anyhow::Context;

    let segmenter = TractSegmenter::from_path(model_path, kind.preprocessing())
        .with_context(|| format!("Failed to load model {}", model_path.display()))?;
    Ok(Box::new(segmenter))
}

#[cfg(not(feature = "tract"))]
pub(crate) fn create_segmenter(model_path: &Path, _kind: ModelKind) -> Result<Box<dyn Segmenter>> {
    anyhow::bail!(
        "Cannot load {}: built without a segmentation backend (enable the `tract` feature)",
        model_path.display()
    )
}
