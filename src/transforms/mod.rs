//! Pure image transforms
//!
//! Each transform takes an image by reference and returns a new one; the
//! [`ImageHandler`](crate::handler::ImageHandler) chains them over a single
//! owned image.

pub mod composite;
pub mod enhance;
pub mod mask;
pub mod resize;

pub use composite::{add_background, paste_origin, paste_with_alpha, subject_box};
pub use enhance::{enhance, EnhanceFactors};
pub use mask::{alpha_to_mask, convert_to_mask, BACKGROUND_PIXEL, SUBJECT_PIXEL};
pub use resize::{fit_dimensions, resize, scale_to_fit, thumbnail};
