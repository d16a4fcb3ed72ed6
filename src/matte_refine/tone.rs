use image::{Luma, Rgb};
use imageproc::definitions::Image;

use crate::{
    error::{MatteError, ProfileError},
    utils::{clamp_f32_to_primitive, normalize_alpha_with_max, validate_matching_dimensions},
};

/// Brightness boost for semi-transparent edge pixels.
///
/// For `low < alpha < high` every color channel is scaled by
/// `1 + (1 - alpha / 255) * max_boost`. Semi-transparent edges darken when
/// composited over a light background; the boost compensates for that.
///
/// Applying it twice compounds the boost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaCompensation {
    /// Exclusive lower alpha bound
    pub low: u8,
    /// Exclusive upper alpha bound
    pub high: u8,
    /// Boost applied at alpha = 0 (0.3 = 30%)
    pub max_boost: f32,
}

impl Default for GammaCompensation {
    fn default() -> Self {
        Self {
            low: 5,
            high: 250,
            max_boost: 0.3,
        }
    }
}

/// Division of premultiplied color by alpha for edge pixels.
///
/// For `low < alpha < high` every color channel becomes
/// `c / max(alpha / 255, floor)`, clipped to [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unpremultiply {
    /// Exclusive lower alpha bound
    pub low: u8,
    /// Exclusive upper alpha bound
    pub high: u8,
    /// Smallest divisor, guards against division by zero
    pub floor: f32,
}

impl Default for Unpremultiply {
    fn default() -> Self {
        Self {
            low: 5,
            high: 255,
            floor: 0.001,
        }
    }
}

/// Independent, optional tone corrections.
///
/// When both are enabled unpremultiply runs first so the boost acts on
/// recovered straight color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneCorrection {
    pub gamma: Option<GammaCompensation>,
    pub unpremultiply: Option<Unpremultiply>,
}

impl ToneCorrection {
    /// No correction at all.
    pub const fn none() -> Self {
        Self {
            gamma: None,
            unpremultiply: None,
        }
    }

    /// Gamma compensation with default bounds, no unpremultiply.
    pub fn gamma_only() -> Self {
        Self {
            gamma: Some(GammaCompensation::default()),
            unpremultiply: None,
        }
    }

    /// Returns `true` when neither correction is enabled.
    pub const fn is_noop(&self) -> bool {
        self.gamma.is_none() && self.unpremultiply.is_none()
    }

    pub(crate) fn validate(&self) -> Result<(), ProfileError> {
        if let Some(gamma) = self.gamma {
            if gamma.low >= gamma.high {
                return Err(ProfileError::InvalidParameter {
                    name: "tone.gamma",
                    reason: format!("low ({}) must be < high ({})", gamma.low, gamma.high),
                });
            }
            if !gamma.max_boost.is_finite() || gamma.max_boost < 0.0 {
                return Err(ProfileError::InvalidParameter {
                    name: "tone.gamma.max_boost",
                    reason: format!("must be finite and >= 0, got {}", gamma.max_boost),
                });
            }
        }

        if let Some(unpremultiply) = self.unpremultiply {
            if unpremultiply.low >= unpremultiply.high {
                return Err(ProfileError::InvalidParameter {
                    name: "tone.unpremultiply",
                    reason: format!(
                        "low ({}) must be < high ({})",
                        unpremultiply.low, unpremultiply.high
                    ),
                });
            }
            if !(unpremultiply.floor > 0.0 && unpremultiply.floor <= 1.0) {
                return Err(ProfileError::InvalidParameter {
                    name: "tone.unpremultiply.floor",
                    reason: format!("must be in (0, 1], got {}", unpremultiply.floor),
                });
            }
        }

        Ok(())
    }
}

/// Trait providing the tone corrections for RGB edge pixels
///
/// Each correction only touches pixels whose alpha lies strictly inside the
/// configured band, so fully transparent and fully opaque pixels are
/// returned byte-identical.
pub trait ToneCorrectExt {
    /// Applies gamma compensation. This consumes the original image.
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use matte_refine::{GammaCompensation, Image, ToneCorrectExt};
    /// use image::{Luma, Rgb};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let image: Image<Rgb<u8>> = Image::new(10, 10);
    /// let alpha: Image<Luma<u8>> = Image::new(10, 10);
    ///
    /// let boosted = image.gamma_compensate(&alpha, GammaCompensation::default())?;
    /// # Ok(())
    /// # }
    /// ```
    fn gamma_compensate(
        self,
        alpha: &Image<Luma<u8>>,
        params: GammaCompensation,
    ) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Applies gamma compensation in-place.
    fn gamma_compensate_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: GammaCompensation,
    ) -> Result<&mut Self, MatteError>;

    /// Divides premultiplied color by alpha. This consumes the original image.
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    fn unpremultiply(
        self,
        alpha: &Image<Luma<u8>>,
        params: Unpremultiply,
    ) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Divides premultiplied color by alpha in-place.
    fn unpremultiply_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: Unpremultiply,
    ) -> Result<&mut Self, MatteError>;
}

impl ToneCorrectExt for Image<Rgb<u8>> {
    fn gamma_compensate(
        mut self,
        alpha: &Image<Luma<u8>>,
        params: GammaCompensation,
    ) -> Result<Self, MatteError> {
        self.gamma_compensate_mut(alpha, params)?;
        Ok(self)
    }

    fn gamma_compensate_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: GammaCompensation,
    ) -> Result<&mut Self, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        // Per-alpha gain, indexed by the alpha sample
        let gain: [f32; 256] = std::array::from_fn(|a| {
            let a = a as u8;
            if a > params.low && a < params.high {
                let a_norm = normalize_alpha_with_max(a, 255.0);
                (1.0 - a_norm).mul_add(params.max_boost, 1.0)
            } else {
                1.0
            }
        });

        apply_gain(self, alpha, |a| gain[a as usize], |a| {
            a > params.low && a < params.high
        });

        Ok(self)
    }

    fn unpremultiply(
        mut self,
        alpha: &Image<Luma<u8>>,
        params: Unpremultiply,
    ) -> Result<Self, MatteError> {
        self.unpremultiply_mut(alpha, params)?;
        Ok(self)
    }

    fn unpremultiply_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: Unpremultiply,
    ) -> Result<&mut Self, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        let gain: [f32; 256] = std::array::from_fn(|a| {
            let a_norm = normalize_alpha_with_max(a as u8, 255.0);
            1.0 / a_norm.max(params.floor)
        });

        apply_gain(self, alpha, |a| gain[a as usize], |a| {
            a > params.low && a < params.high
        });

        Ok(self)
    }
}

/// Scales the color of every selected pixel by a gain looked up from alpha.
fn apply_gain(
    image: &mut Image<Rgb<u8>>,
    alpha: &Image<Luma<u8>>,
    gain: impl Fn(u8) -> f32,
    selected: impl Fn(u8) -> bool,
) {
    image
        .pixels_mut()
        .zip(alpha.pixels())
        .filter(|(_, Luma([a]))| selected(*a))
        .for_each(|(pixel, Luma([a]))| {
            let factor = gain(*a);
            let Rgb([red, green, blue]) = *pixel;
            *pixel = Rgb([
                clamp_f32_to_primitive(f32::from(red) * factor),
                clamp_f32_to_primitive(f32::from(green) * factor),
                clamp_f32_to_primitive(f32::from(blue) * factor),
            ]);
        });
}

/// Applies the configured corrections, unpremultiply first.
///
/// # Errors
///
/// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
pub fn apply_tone_correction(
    image: Image<Rgb<u8>>,
    alpha: &Image<Luma<u8>>,
    correction: &ToneCorrection,
) -> Result<Image<Rgb<u8>>, MatteError> {
    validate_matching_dimensions(&image, alpha)?;

    let mut image = image;
    if let Some(params) = correction.unpremultiply {
        image.unpremultiply_mut(alpha, params)?;
    }
    if let Some(params) = correction.gamma {
        image.gamma_compensate_mut(alpha, params)?;
    }
    Ok(image)
}
