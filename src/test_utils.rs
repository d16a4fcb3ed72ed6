//! Test utilities for matte-refine
//!
//! Small fixtures shared by the unit tests. Only compiled for tests.

use image::{Luma, Pixel, Primitive, Rgb, Rgba};
use imageproc::definitions::Image;

/// 2x2 RGB image with known pixel values:
/// - (0,0): [200, 150, 100]
/// - (1,0): [100, 200, 150]
/// - (0,1): [150, 100, 200]
/// - (1,1): [50, 75, 25]
pub fn create_test_rgb_image() -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgb([200, 150, 100]));
    image.put_pixel(1, 0, Rgb([100, 200, 150]));
    image.put_pixel(0, 1, Rgb([150, 100, 200]));
    image.put_pixel(1, 1, Rgb([50, 75, 25]));
    image
}

/// 2x2 RGBA image covering opaque, partial and transparent alpha.
pub fn create_test_rgba_image() -> Image<Rgba<u8>> {
    let mut image: Image<Rgba<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgba([200, 150, 100, 255]));
    image.put_pixel(1, 0, Rgba([100, 200, 150, 128]));
    image.put_pixel(0, 1, Rgba([150, 100, 200, 64]));
    image.put_pixel(1, 1, Rgba([50, 75, 25, 0]));
    image
}

/// 2x2 alpha channel: 255, 192 / 128, 64.
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    let mut mask: Image<Luma<u8>> = Image::new(2, 2);
    mask.put_pixel(0, 0, Luma([255]));
    mask.put_pixel(1, 0, Luma([192]));
    mask.put_pixel(0, 1, Luma([128]));
    mask.put_pixel(1, 1, Luma([64]));
    mask
}

/// `size x size` binary mask, 255 on `[start, end)` in both axes.
pub fn square_alpha(size: u32, start: u32, end: u32) -> Image<Luma<u8>> {
    Image::from_fn(size, size, |x, y| {
        let inside = (start..end).contains(&x) && (start..end).contains(&y);
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Compares two images channel by channel within `tolerance`.
pub fn images_approx_equal<P>(expected: &Image<P>, actual: &Image<P>, tolerance: f32) -> bool
where
    P: Pixel,
    P::Subpixel: Primitive,
    f32: From<P::Subpixel>,
{
    expected.dimensions() == actual.dimensions()
        && expected
            .pixels()
            .zip(actual.pixels())
            .flat_map(|(e, a)| e.channels().iter().zip(a.channels().iter()))
            .all(|(e, a)| (f32::from(*e) - f32::from(*a)).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_alpha_has_expected_area() {
        let mask = square_alpha(10, 2, 6);
        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 16);
        assert_eq!(mask.get_pixel(2, 2)[0], 255);
        assert_eq!(mask.get_pixel(6, 6)[0], 0);
    }

    #[test]
    fn images_approx_equal_respects_tolerance() {
        let image1 = create_test_rgb_image();
        let mut image2 = create_test_rgb_image();
        image2.put_pixel(0, 0, Rgb([201, 150, 100]));

        assert!(images_approx_equal(&image1, &image2, 1.5));
        assert!(!images_approx_equal(&image1, &image2, 0.5));
        assert!(!images_approx_equal(&image1, &Image::new(3, 2), 255.0));
    }
}
