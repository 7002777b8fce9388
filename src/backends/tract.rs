//! Tract inference backend for saliency segmentation models
//!
//! Runs U2-Net/ISNet style ONNX models with Tract, a pure Rust inference
//! runtime. The model is loaded, optimized and made runnable once; each
//! inference call is then stateless.

use crate::{
    error::{BgSwapError, Result},
    segmentation::{InferenceBackend, ModelSegmenter},
    utils::PreprocessingConfig,
};
use instant::Instant;
use ndarray::Array4;
use std::path::Path;
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// [`Segmenter`](crate::segmentation::Segmenter) backed by a Tract model
pub type TractSegmenter = ModelSegmenter<TractBackend>;

/// Loaded, runnable ONNX saliency model
pub struct TractBackend {
    model: TractModel,
    preprocessing: PreprocessingConfig,
    model_name: String,
}

impl std::fmt::Debug for TractBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TractBackend")
            .field("model_name", &self.model_name)
            .field("preprocessing", &self.preprocessing)
            .finish_non_exhaustive()
    }
}

impl TractBackend {
    /// Load an ONNX model file
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `Model` when Tract rejects the model
    pub fn from_path<P: AsRef<Path>>(model_path: P, preprocessing: PreprocessingConfig) -> Result<Self> {
        let model_path = model_path.as_ref();
        let bytes = std::fs::read(model_path)
            .map_err(|e| BgSwapError::file_io_error("read model", model_path, &e))?;
        let name = model_path
            .file_stem()
            .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned());
        Self::load(&bytes, preprocessing, name)
    }

    /// Load an ONNX model from memory
    ///
    /// # Errors
    /// - `Model` when Tract rejects the model
    pub fn from_bytes(bytes: &[u8], preprocessing: PreprocessingConfig) -> Result<Self> {
        Self::load(bytes, preprocessing, "onnx".to_string())
    }

    fn load(bytes: &[u8], preprocessing: PreprocessingConfig, model_name: String) -> Result<Self> {
        preprocessing.validate()?;
        let load_start = Instant::now();
        let size = preprocessing.target_size as usize;

        log::info!("Initializing Tract backend");
        #[allow(clippy::cast_precision_loss)]
        let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
        log::info!("Model: {model_name} ({size_mb:.2} MB), input {size}x{size}");

        let model = onnx()
            .model_for_read(&mut std::io::Cursor::new(bytes))
            .map_err(|e| BgSwapError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| BgSwapError::model(format!("Failed to set model input shape: {e}")))?
            .into_optimized()
            .map_err(|e| BgSwapError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| BgSwapError::model(format!("Failed to create runnable model: {e}")))?;

        log::info!(
            "Tract backend initialized in {}ms",
            load_start.elapsed().as_millis()
        );

        Ok(Self {
            model,
            preprocessing,
            model_name,
        })
    }
}

impl InferenceBackend for TractBackend {
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        log::debug!("Running Tract inference, input tensor {:?}", input.shape());
        let inference_start = Instant::now();

        let data: Vec<f32> = input.iter().copied().collect();
        let input_tensor = Tensor::from_shape(input.shape(), &data)
            .map_err(|e| BgSwapError::model(format!("Failed to build input tensor: {e}")))?;

        let outputs = self
            .model
            .run(tvec![input_tensor.into()])
            .map_err(|e| BgSwapError::model(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| BgSwapError::model("Model produced no output tensor"))?
            .into_arc_tensor();

        let shape = output_tensor.shape().to_vec();
        let [batch, channels, height, width] = shape[..] else {
            return Err(BgSwapError::model(format!(
                "Expected 4D output tensor, got {}D",
                shape.len()
            )));
        };
        let values = output_tensor
            .as_slice::<f32>()
            .map_err(|e| BgSwapError::model(format!("Failed to read output tensor: {e}")))?;

        let output = Array4::from_shape_vec((batch, channels, height, width), values.to_vec())
            .map_err(|e| BgSwapError::model(format!("Failed to reshape output tensor: {e}")))?;

        log::debug!(
            "Tract inference completed in {}ms, output tensor {:?}",
            inference_start.elapsed().as_millis(),
            output.shape()
        );
        Ok(output)
    }

    fn preprocessing_config(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl ModelSegmenter<TractBackend> {
    /// Segmenter running the ONNX model at `model_path`
    ///
    /// # Errors
    /// - `Io` when the file cannot be read
    /// - `Model` when Tract rejects the model
    pub fn from_path<P: AsRef<Path>>(model_path: P, preprocessing: PreprocessingConfig) -> Result<Self> {
        TractBackend::from_path(model_path, preprocessing).map(Self::new)
    }

    /// Segmenter running an in-memory ONNX model
    ///
    /// # Errors
    /// - `Model` when Tract rejects the model
    pub fn from_bytes(bytes: &[u8], preprocessing: PreprocessingConfig) -> Result<Self> {
        TractBackend::from_bytes(bytes, preprocessing).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_io_error() {
        let err = TractSegmenter::from_path("/nonexistent/u2net.onnx", PreprocessingConfig::u2net())
            .unwrap_err();
        assert!(matches!(err, BgSwapError::Io(_)));
    }

    #[test]
    fn test_garbage_model_is_model_error() {
        let err = TractSegmenter::from_bytes(b"definitely not onnx", PreprocessingConfig::u2net())
            .unwrap_err();
        assert!(matches!(err, BgSwapError::Model(_)));
    }

    #[test]
    fn test_invalid_preprocessing_rejected_before_loading() {
        let config = PreprocessingConfig {
            target_size: 0,
            ..PreprocessingConfig::isnet()
        };
        let err = TractSegmenter::from_bytes(b"", config).unwrap_err();
        assert!(matches!(err, BgSwapError::InvalidConfig(_)));
    }
}
