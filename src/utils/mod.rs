//! Internal utility functions for matte-refine.
//!
//! This module contains common functionality used across the refinement stages.

use image::{GenericImageView, Primitive};
use imageproc::definitions::Clamp;

use crate::error::MatteError;

/// Clamps a floating-point value to the range of a primitive type.
///
/// NaN maps to zero, infinities saturate to the type bounds.
///
/// # Arguments
///
/// * `value` - The floating-point value to clamp
///
/// # Returns
///
/// The clamped value as the target primitive type
#[inline]
pub fn clamp_f32_to_primitive<T: Primitive + Clamp<f32>>(value: f32) -> T {
    if value.is_nan() {
        T::clamp(0.0)
    } else {
        T::clamp(value)
    }
}

/// Rounds a floating-point sample on the 0-255 scale to `u8`.
///
/// NaN maps to zero; anything outside the range saturates.
#[inline]
pub fn round_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// Normalizes an alpha value using a pre-computed max value.
///
/// This is more efficient when processing multiple pixels with the same type.
///
/// # Arguments
///
/// * `alpha` - The alpha value to normalize
/// * `max_value` - The pre-computed maximum value for the type
///
/// # Returns
///
/// The normalized alpha value as a floating-point number between 0 and 1
#[inline]
pub fn normalize_alpha_with_max<S>(alpha: S, max_value: f32) -> f32
where
    S: Into<f32> + Primitive,
{
    alpha.into() / max_value
}

/// Returns `true` when the alpha sample is partially transparent.
#[inline]
pub const fn is_transition(alpha: u8) -> bool {
    alpha > 0 && alpha < 255
}

/// Validates that two images share the same pixel grid.
///
/// # Errors
///
/// * `MatteError::DimensionMismatch` - When the dimensions differ
pub fn validate_matching_dimensions<I1, I2>(image: &I1, mask: &I2) -> Result<(), MatteError>
where
    I1: GenericImageView,
    I2: GenericImageView,
{
    let expected = image.dimensions();
    let actual = mask.dimensions();
    if expected == actual {
        Ok(())
    } else {
        Err(MatteError::DimensionMismatch { expected, actual })
    }
}
