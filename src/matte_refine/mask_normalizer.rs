//! Mask normalization.
//!
//! Converts the raw model score into a [0, 1] mask at full image resolution.

use image::{imageops::FilterType, Luma};
use imageproc::{definitions::Image, map::map_colors};
use itertools::{Itertools, MinMaxResult};

use crate::{error::InferenceError, matte_refine::profile::ContrastRemap, utils::round_to_u8};

/// Single-channel model score plane.
pub type MaskTensor = Image<Luma<f32>>;

const EPSILON: f64 = 1e-8;

/// Rescales the tensor to [0, 1] in place.
///
/// `scaled = (v - min) / (max - min + 1e-8)`, with min and max taken over
/// finite samples only. A uniform tensor becomes all zeros. NaN maps to 0,
/// +Inf to 1 and -Inf to 0.
pub fn normalize_min_max(mask: &mut MaskTensor) {
    let (min, max) = match mask
        .pixels()
        .map(|Luma([v])| *v)
        .filter(|v| v.is_finite())
        .minmax_by(f32::total_cmp)
    {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    let min = f64::from(min);
    let range = f64::from(max) - min + EPSILON;

    mask.pixels_mut().for_each(|Luma([v])| {
        *v = if v.is_nan() {
            0.0
        } else if v.is_infinite() {
            if v.is_sign_positive() {
                1.0
            } else {
                0.0
            }
        } else {
            ((f64::from(*v) - min) / range).clamp(0.0, 1.0) as f32
        };
    });
}

/// Contrast-hardening remap, `clamp((v - low) / (high - low), 0, 1)`.
pub fn apply_contrast(mask: &mut MaskTensor, remap: ContrastRemap) {
    let ContrastRemap { low, high } = remap;
    let span = high - low;
    mask.pixels_mut().for_each(|Luma([v])| {
        let remapped = (*v - low) / span;
        *v = if remapped.is_nan() {
            0.0
        } else {
            remapped.clamp(0.0, 1.0)
        };
    });
}

/// Lanczos3 resample to `width` x `height`, clamped to [0, 1].
pub fn resize_mask(mask: &MaskTensor, width: u32, height: u32) -> MaskTensor {
    let mut resized = if mask.dimensions() == (width, height) {
        mask.clone()
    } else {
        image::imageops::resize(mask, width, height, FilterType::Lanczos3)
    };

    resized
        .pixels_mut()
        .for_each(|Luma([v])| *v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
    resized
}

/// Runs the full normalizer stage on a raw model output.
///
/// # Arguments
///
/// * `raw` - Model score tensor at model resolution
/// * `target` - Full image dimensions `(width, height)`
/// * `contrast` - Optional contrast remap applied before resizing
///
/// # Errors
///
/// * `InferenceError::EmptyOutput` - When the tensor has no samples
pub fn normalize_mask(
    mut raw: MaskTensor,
    target: (u32, u32),
    contrast: Option<ContrastRemap>,
) -> Result<MaskTensor, InferenceError> {
    if raw.width() == 0 || raw.height() == 0 {
        return Err(InferenceError::EmptyOutput);
    }

    let _span = tracing::debug_span!(
        "normalize_mask",
        source = ?raw.dimensions(),
        target = ?target
    )
    .entered();

    normalize_min_max(&mut raw);
    if let Some(remap) = contrast {
        apply_contrast(&mut raw, remap);
    }

    let (width, height) = target;
    Ok(resize_mask(&raw, width, height))
}

/// Quantizes a [0, 1] mask to 8-bit alpha, `round(v * 255)`.
pub fn mask_to_alpha(mask: &MaskTensor) -> Image<Luma<u8>> {
    map_colors(mask, |Luma([v])| Luma([round_to_u8(v * 255.0)]))
}
