use image::{GenericImageView, Luma, Rgb, Rgba};
use imageproc::{definitions::Image, map::map_colors2};

use crate::{
    error::MatteError,
    utils::{round_to_u8, validate_matching_dimensions},
};

/// Trait providing the final RGB + alpha merge
///
/// The result is always a contiguous, row-major 8-bit RGBA buffer of
/// `width * height * 4` samples owned by the caller.
pub trait CompositeExt {
    type Alpha: GenericImageView;

    /// Merges the color planes with the alpha channel
    ///
    /// # Arguments
    ///
    /// * `alpha` - The alpha channel, same dimensions as the image
    ///
    /// # Returns
    ///
    /// RGBA image with 8-bit samples
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    /// * `MatteError::ImageBufferCreationFailed` - When result image creation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use matte_refine::{CompositeExt, Image};
    /// use image::{Luma, Rgb};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rgb_image: Image<Rgb<u8>> = Image::new(10, 10);
    /// let alpha: Image<Luma<u8>> = Image::new(10, 10);
    ///
    /// let rgba_image = rgb_image.composite(&alpha)?;
    /// # Ok(())
    /// # }
    /// ```
    fn composite(&self, alpha: &Self::Alpha) -> Result<Image<Rgba<u8>>, MatteError>;
}

impl CompositeExt for Image<Rgb<u8>> {
    type Alpha = Image<Luma<u8>>;

    fn composite(&self, alpha: &Self::Alpha) -> Result<Image<Rgba<u8>>, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        let raw: Vec<u8> = self
            .pixels()
            .zip(alpha.pixels())
            .flat_map(|(Rgb([red, green, blue]), Luma([a]))| [*red, *green, *blue, *a])
            .collect();

        Image::from_raw(self.width(), self.height(), raw)
            .ok_or(MatteError::ImageBufferCreationFailed)
    }
}

/// Float planes on the 0-255 scale. NaN becomes 0, everything else is
/// rounded and clipped to [0, 255].
impl CompositeExt for Image<Rgb<f32>> {
    type Alpha = Image<Luma<f32>>;

    fn composite(&self, alpha: &Self::Alpha) -> Result<Image<Rgba<u8>>, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        let raw: Vec<u8> = self
            .pixels()
            .zip(alpha.pixels())
            .flat_map(|(Rgb([red, green, blue]), Luma([a]))| {
                [
                    round_to_u8(*red),
                    round_to_u8(*green),
                    round_to_u8(*blue),
                    round_to_u8(*a),
                ]
            })
            .collect();

        Image::from_raw(self.width(), self.height(), raw)
            .ok_or(MatteError::ImageBufferCreationFailed)
    }
}

/// Trait for swapping the alpha channel of an existing RGBA cutout
///
/// The color channels are preserved.
pub trait ReplaceAlphaExt {
    /// Replaces the alpha channel. This consumes the original image.
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    fn replace_alpha(self, alpha: &Image<Luma<u8>>) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Replaces the alpha channel in-place.
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    fn replace_alpha_mut(&mut self, alpha: &Image<Luma<u8>>) -> Result<&mut Self, MatteError>;
}

impl ReplaceAlphaExt for Image<Rgba<u8>> {
    fn replace_alpha(self, alpha: &Image<Luma<u8>>) -> Result<Self, MatteError> {
        validate_matching_dimensions(&self, alpha)?;

        Ok(map_colors2(&self, alpha, |Rgba([red, green, blue, _]), Luma([a])| {
            Rgba([red, green, blue, a])
        }))
    }

    fn replace_alpha_mut(&mut self, alpha: &Image<Luma<u8>>) -> Result<&mut Self, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        self.pixels_mut()
            .zip(alpha.pixels())
            .for_each(|(pixel, Luma([a]))| pixel[3] = *a);

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_alpha_mask, create_test_rgb_image, create_test_rgba_image};

    #[test]
    fn composite_interleaves_color_and_alpha() {
        let image = create_test_rgb_image();
        let alpha = create_test_alpha_mask();

        let result = image.composite(&alpha).unwrap();

        assert_eq!(result.dimensions(), (2, 2));
        assert_eq!(result.as_raw().len(), 2 * 2 * 4);
        assert_eq!(result.get_pixel(0, 0), &Rgba([200, 150, 100, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([100, 200, 150, 192]));
        assert_eq!(result.get_pixel(1, 1), &Rgba([50, 75, 25, 64]));
    }

    #[test]
    fn composite_rejects_mismatched_alpha() {
        let image = create_test_rgb_image();
        let alpha: Image<Luma<u8>> = Image::new(3, 2);
        assert_eq!(
            image.composite(&alpha),
            Err(MatteError::DimensionMismatch {
                expected: (2, 2),
                actual: (3, 2),
            })
        );
    }

    #[test]
    fn float_composite_sanitizes_samples() {
        let image: Image<Rgb<f32>> = Image::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([f32::NAN, 300.0, -5.0])
            } else {
                Rgb([127.6, f32::INFINITY, f32::NEG_INFINITY])
            }
        });
        let alpha: Image<Luma<f32>> = Image::from_fn(2, 1, |x, _| {
            Luma([if x == 0 { f32::NAN } else { 254.7 }])
        });

        let result = image.composite(&alpha).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([0, 255, 0, 0]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([128, 255, 0, 255]));
    }

    #[test]
    fn replace_alpha_keeps_color() {
        let image = create_test_rgba_image();
        let alpha = Image::from_pixel(2, 2, Luma([7u8]));

        let replaced = image.clone().replace_alpha(&alpha).unwrap();
        let mut in_place = image.clone();
        in_place.replace_alpha_mut(&alpha).unwrap();

        assert_eq!(replaced, in_place);
        for (before, after) in image.pixels().zip(replaced.pixels()) {
            assert_eq!(&before.0[..3], &after.0[..3]);
            assert_eq!(after[3], 7);
        }
    }
}
