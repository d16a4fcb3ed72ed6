//! Edge feathering inside the trimap's unknown band.

use image::Luma;
use imageproc::{definitions::Image, filter::gaussian_blur_f32};

use crate::{
    error::MatteError,
    matte_refine::{
        profile::EdgeFeather,
        trimap::{Trimap, UNKNOWN},
    },
    utils::validate_matching_dimensions,
};

/// Trait providing edge feathering for 8-bit alpha channels
///
/// The alpha channel is blurred with a Gaussian kernel and the blurred value
/// is taken only where the trimap is unknown. Definite foreground and
/// background samples are left byte-identical.
pub trait FeatherEdgesExt {
    /// Feathers the alpha edges. This consumes the original alpha.
    ///
    /// # Arguments
    ///
    /// * `trimap` - Trimap of the same dimensions as the alpha channel
    /// * `params` - Kernel parameters; a non-positive or non-finite sigma
    ///   leaves the alpha unchanged
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When alpha and trimap dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use matte_refine::{build_trimap, EdgeFeather, FeatherEdgesExt, Image, TrimapRadii};
    /// use image::Luma;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let alpha: Image<Luma<u8>> = Image::new(10, 10);
    /// let trimap = build_trimap(&alpha, TrimapRadii::default());
    /// let feathered = alpha.feather_edges(&trimap, EdgeFeather::default())?;
    /// # Ok(())
    /// # }
    /// ```
    fn feather_edges(self, trimap: &Trimap, params: EdgeFeather) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Feathers the alpha edges in-place.
    fn feather_edges_mut(
        &mut self,
        trimap: &Trimap,
        params: EdgeFeather,
    ) -> Result<&mut Self, MatteError>;
}

impl FeatherEdgesExt for Image<Luma<u8>> {
    fn feather_edges(mut self, trimap: &Trimap, params: EdgeFeather) -> Result<Self, MatteError> {
        self.feather_edges_mut(trimap, params)?;
        Ok(self)
    }

    fn feather_edges_mut(
        &mut self,
        trimap: &Trimap,
        params: EdgeFeather,
    ) -> Result<&mut Self, MatteError> {
        validate_matching_dimensions(self, trimap.as_image())?;

        if !params.sigma.is_finite() || params.sigma <= 0.0 || !trimap.has_unknown() {
            return Ok(self);
        }

        let _span = tracing::debug_span!("feather", sigma = params.sigma).entered();

        let blurred = gaussian_blur_f32(self, params.sigma);
        let mut feathered = 0usize;
        for ((Luma([a]), Luma([smooth])), Luma([band])) in self
            .pixels_mut()
            .zip(blurred.pixels())
            .zip(trimap.as_image().pixels())
        {
            if *band == UNKNOWN {
                *a = *smooth;
                feathered += 1;
            }
        }

        tracing::debug!(feathered, "alpha edges feathered");
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        matte_refine::{
            profile::TrimapRadii,
            trimap::{build_trimap, TrimapBand},
        },
        test_utils::square_alpha,
    };

    #[test]
    fn only_unknown_band_is_smoothed() {
        let alpha = square_alpha(40, 10, 30);
        let trimap = build_trimap(&alpha, TrimapRadii::default());
        let feathered = alpha
            .clone()
            .feather_edges(&trimap, EdgeFeather::default())
            .unwrap();

        for (x, y, Luma([a])) in feathered.enumerate_pixels() {
            if trimap.band(x, y) != TrimapBand::Unknown {
                assert_eq!(*a, alpha.get_pixel(x, y)[0], "({x}, {y}) changed");
            }
        }
        assert!(feathered.pixels().any(|Luma([a])| *a > 0 && *a < 255));
    }

    #[test]
    fn step_edge_becomes_a_ramp() {
        let alpha = square_alpha(40, 10, 30);
        let trimap = build_trimap(&alpha, TrimapRadii::default());
        let mut feathered = alpha.clone();
        feathered
            .feather_edges_mut(&trimap, EdgeFeather { sigma: 2.0 })
            .unwrap();

        let row: Vec<u8> = (5..15).map(|x| feathered.get_pixel(x, 20)[0]).collect();
        assert!(row.windows(2).all(|w| w[0] <= w[1]), "{row:?}");
        assert!(feathered.get_pixel(9, 20)[0] > 0);
        assert!(feathered.get_pixel(10, 20)[0] < 255);
    }

    #[test]
    fn non_positive_sigma_is_a_no_op() {
        let alpha = square_alpha(16, 4, 12);
        let trimap = build_trimap(&alpha, TrimapRadii::default());
        let result = alpha
            .clone()
            .feather_edges(&trimap, EdgeFeather { sigma: 0.0 })
            .unwrap();
        assert_eq!(result, alpha);
    }

    #[test]
    fn mismatched_trimap_is_rejected() {
        let alpha: Image<Luma<u8>> = Image::new(8, 8);
        let trimap = build_trimap(&Image::new(8, 9), TrimapRadii::default());
        assert_eq!(
            alpha.feather_edges(&trimap, EdgeFeather::default()),
            Err(MatteError::DimensionMismatch {
                expected: (8, 8),
                actual: (8, 9),
            })
        );
    }
}
