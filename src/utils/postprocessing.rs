//! Prediction tensor to segmentation mask conversion

use super::preprocessing::Letterbox;
use crate::{
    error::{BgSwapError, Result},
    types::SegmentationMask,
};
use ndarray::Array4;

pub struct MaskPostprocessor;

impl MaskPostprocessor {
    /// Map a `[1, 1, S, S]` prediction back onto the source image
    ///
    /// The letterbox applied during preprocessing is inverted so each source
    /// pixel samples the prediction at its canvas coordinate. With `rescale`
    /// the prediction is min-max normalized first.
    ///
    /// # Errors
    /// - `Processing` when the tensor is not single batch, single channel
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tensor_to_mask(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
        rescale: bool,
    ) -> Result<SegmentationMask> {
        Self::validate_tensor_shape(tensor)?;

        let shape = tensor.shape();
        let (mask_height, mask_width) = (shape[2], shape[3]);
        let geometry = Letterbox::compute(original_dimensions, mask_width as u32);

        let (min, max) = if rescale {
            Self::value_range(tensor)
        } else {
            (0.0, 1.0)
        };
        let span = max - min;

        let (orig_width, orig_height) = original_dimensions;
        let mut data = Vec::with_capacity(orig_width as usize * orig_height as usize);
        for y in 0..orig_height {
            for x in 0..orig_width {
                let tensor_x = (x as f32 * geometry.scale).round() as usize + geometry.offset_x as usize;
                let tensor_y = (y as f32 * geometry.scale).round() as usize + geometry.offset_y as usize;

                let raw = if tensor_x < mask_width && tensor_y < mask_height {
                    tensor.get([0, 0, tensor_y, tensor_x]).copied().unwrap_or(0.0)
                } else {
                    0.0
                };
                let value = if span > f32::EPSILON { (raw - min) / span } else { raw };
                data.push((value.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }

        Ok(SegmentationMask::new(data, original_dimensions))
    }

    fn validate_tensor_shape(tensor: &Array4<f32>) -> Result<()> {
        let shape = tensor.shape();
        if shape[0] != 1 || shape[1] != 1 || shape[2] == 0 || shape[3] == 0 {
            return Err(BgSwapError::processing(format!(
                "Prediction tensor must have shape [1, 1, H, W], got {shape:?}"
            )));
        }
        Ok(())
    }

    fn value_range(tensor: &Array4<f32>) -> (f32, f32) {
        tensor
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_multi_channel_prediction() {
        let tensor = Array4::<f32>::zeros((1, 3, 4, 4));
        assert!(matches!(
            MaskPostprocessor::tensor_to_mask(&tensor, (4, 4), false),
            Err(BgSwapError::Processing(_))
        ));
    }

    #[test]
    fn test_identity_mapping_at_tensor_resolution() {
        let tensor = Array4::from_shape_fn((1, 1, 4, 4), |(_, _, y, x)| if x >= 2 { 1.0 } else { 0.0 });
        let mask = MaskPostprocessor::tensor_to_mask(&tensor, (4, 4), false).unwrap();
        assert_eq!(mask.dimensions, (4, 4));
        assert_eq!(&mask.data[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_rescale_stretches_prediction_range() {
        let tensor = Array4::from_shape_fn((1, 1, 2, 2), |(_, _, _, x)| if x == 0 { 0.2 } else { 0.6 });
        let mask = MaskPostprocessor::tensor_to_mask(&tensor, (2, 2), true).unwrap();
        assert_eq!(mask.data, vec![0, 255, 0, 255]);

        let raw = MaskPostprocessor::tensor_to_mask(&tensor, (2, 2), false).unwrap();
        assert_eq!(raw.data, vec![51, 153, 51, 153]);
    }

    #[test]
    fn test_letterboxed_prediction_maps_to_content_area() {
        // 8x4 source into a 8x8 canvas: content rows 2..6
        let tensor = Array4::from_shape_fn((1, 1, 8, 8), |(_, _, y, _)| if (2..6).contains(&y) { 1.0 } else { 0.0 });
        let mask = MaskPostprocessor::tensor_to_mask(&tensor, (8, 4), false).unwrap();
        assert!(mask.data.iter().all(|v| *v == 255));
    }
}
