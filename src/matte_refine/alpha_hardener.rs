use image::Luma;
use imageproc::definitions::Image;

use crate::{
    matte_refine::{morphology::erode_disk, profile::HardeningParams},
    utils::normalize_alpha_with_max,
};

/// Trait providing alpha hardening for 8-bit masks
///
/// Hardening shrinks the mask inward and suppresses faint alpha so that
/// background fringes do not survive into the cutout:
///
/// 1. Grayscale erosion with a disk of `erosion_radius`, `erosion_iterations` times
/// 2. Re-binarization at `binary_threshold` (`< t` becomes 0, else 255), if set
/// 3. Power-law falloff `a' = a ^ falloff_exponent` on normalized alpha
/// 4. Hard clip of everything below `clip_floor` to 0
///
/// Steps 2 to 4 are pointwise and monotone and are applied through a single
/// 256-entry lookup table.
pub trait HardenAlphaExt {
    /// Hardens the mask. This consumes the original mask.
    ///
    /// # Arguments
    ///
    /// * `params` - Hardening parameters, usually `RefinementProfile::hardening()`
    ///
    /// # Returns
    ///
    /// The hardened alpha channel. An all-zero result is valid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use matte_refine::{HardenAlphaExt, Image, RefinementProfile};
    /// use image::Luma;
    ///
    /// let mask: Image<Luma<u8>> = Image::from_pixel(10, 10, Luma([255]));
    /// let alpha = mask.harden_alpha(&RefinementProfile::standard().hardening());
    /// ```
    fn harden_alpha(self, params: &HardeningParams) -> Self;

    /// Hardens the mask in-place.
    fn harden_alpha_mut(&mut self, params: &HardeningParams) -> &mut Self;
}

impl HardenAlphaExt for Image<Luma<u8>> {
    fn harden_alpha(mut self, params: &HardeningParams) -> Self {
        self.harden_alpha_mut(params);
        self
    }

    fn harden_alpha_mut(&mut self, params: &HardeningParams) -> &mut Self {
        let _span = tracing::debug_span!(
            "harden",
            radius = params.erosion_radius,
            iterations = params.erosion_iterations
        )
        .entered();

        let mut eroded = erode_disk(self, params.erosion_radius, params.erosion_iterations);

        let lut = hardening_lut(params);
        eroded
            .pixels_mut()
            .for_each(|Luma([a])| *a = lut[*a as usize]);

        tracing::debug!(
            opaque = eroded.pixels().filter(|Luma([a])| *a == 255).count(),
            "alpha hardened"
        );

        *self = eroded;
        self
    }
}

/// Free-function form of [`HardenAlphaExt::harden_alpha`].
pub fn harden_alpha(mask: &Image<Luma<u8>>, params: &HardeningParams) -> Image<Luma<u8>> {
    mask.clone().harden_alpha(params)
}

/// Builds the pointwise part of the hardener as a lookup table.
fn hardening_lut(params: &HardeningParams) -> [u8; 256] {
    std::array::from_fn(|value| {
        let mut a = value as u8;

        if let Some(threshold) = params.binary_threshold {
            a = if a < threshold { 0 } else { 255 };
        }

        // Truncation, not rounding
        let normalized = normalize_alpha_with_max(a, 255.0);
        let a = (normalized.powf(params.falloff_exponent) * 255.0).clamp(0.0, 255.0) as u8;

        if a < params.clip_floor {
            0
        } else {
            a
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matte_refine::profile::RefinementProfile, test_utils::square_alpha};

    fn soft_params() -> HardeningParams {
        HardeningParams {
            erosion_radius: 1,
            erosion_iterations: 0,
            binary_threshold: None,
            falloff_exponent: 1.5,
            clip_floor: 80,
        }
    }

    #[test]
    fn all_zero_mask_stays_zero() {
        let mask: Image<Luma<u8>> = Image::new(16, 16);
        let alpha = mask.harden_alpha(&RefinementProfile::standard().hardening());
        assert!(alpha.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn full_mask_without_erosion_stays_opaque() {
        let params = HardeningParams {
            erosion_iterations: 0,
            ..RefinementProfile::standard().hardening()
        };
        let mask = Image::from_pixel(8, 8, Luma([255u8]));
        let alpha = harden_alpha(&mask, &params);
        assert!(alpha.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn lut_is_monotone() {
        for params in [
            RefinementProfile::standard().hardening(),
            RefinementProfile::soft().hardening(),
            soft_params(),
        ] {
            let lut = hardening_lut(&params);
            assert!(lut.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(lut[0], 0);
            assert_eq!(lut[255], 255);
        }
    }

    #[test]
    fn falloff_truncates_and_clips() {
        let lut = hardening_lut(&soft_params());
        // (128/255)^1.5 * 255 = 90.7
        assert_eq!(lut[128], 90);
        // (100/255)^1.5 * 255 = 62.6, below the floor
        assert_eq!(lut[100], 0);
    }

    #[test]
    fn threshold_binarizes_before_falloff() {
        let lut = hardening_lut(&RefinementProfile::standard().hardening());
        assert_eq!(lut[9], 0);
        assert_eq!(lut[10], 255);
    }

    #[test]
    fn erosion_shrinks_the_square() {
        let mut alpha = square_alpha(20, 5, 15);
        alpha.harden_alpha_mut(&RefinementProfile::standard().hardening());

        assert_eq!(alpha.get_pixel(5, 10)[0], 0);
        assert_eq!(alpha.get_pixel(9, 9)[0], 255);
        assert_eq!(alpha.get_pixel(10, 10)[0], 255);
    }
}
