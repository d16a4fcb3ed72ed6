//! Disk-shaped morphology on 8-bit planes.
//!
//! Thin wrappers around `imageproc::morphology` that repeat an operation a
//! fixed number of times and extend it to RGB by working per channel.

use image::{Luma, Rgb};
use imageproc::{
    definitions::Image,
    map::{blue_channel, green_channel, map_colors, red_channel},
    morphology::{grayscale_dilate, grayscale_erode, Mask},
};

/// Maps `v > threshold` to 255 and everything else to 0.
pub fn binarize(image: &Image<Luma<u8>>, threshold: u8) -> Image<Luma<u8>> {
    map_colors(image, |Luma([v])| Luma([if v > threshold { 255 } else { 0 }]))
}

/// Min filter with a disk of `radius`, applied `iterations` times.
///
/// Out-of-bounds neighbours are ignored, so an all-255 plane stays all-255.
pub fn erode_disk(image: &Image<Luma<u8>>, radius: u8, iterations: u32) -> Image<Luma<u8>> {
    repeat(image, radius, iterations, grayscale_erode)
}

/// Max filter with a disk of `radius`, applied `iterations` times.
pub fn dilate_disk(image: &Image<Luma<u8>>, radius: u8, iterations: u32) -> Image<Luma<u8>> {
    repeat(image, radius, iterations, grayscale_dilate)
}

/// Per-channel max filter with a disk of `radius`, applied `iterations` times.
pub fn dilate_rgb_disk(image: &Image<Rgb<u8>>, radius: u8, iterations: u32) -> Image<Rgb<u8>> {
    if radius == 0 || iterations == 0 {
        return image.clone();
    }

    let red = dilate_disk(&red_channel(image), radius, iterations);
    let green = dilate_disk(&green_channel(image), radius, iterations);
    let blue = dilate_disk(&blue_channel(image), radius, iterations);

    Image::from_fn(image.width(), image.height(), |x, y| {
        Rgb([
            red.get_pixel(x, y)[0],
            green.get_pixel(x, y)[0],
            blue.get_pixel(x, y)[0],
        ])
    })
}

fn repeat(
    image: &Image<Luma<u8>>,
    radius: u8,
    iterations: u32,
    op: fn(&Image<Luma<u8>>, &Mask) -> Image<Luma<u8>>,
) -> Image<Luma<u8>> {
    if radius == 0 || iterations == 0 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let mask = Mask::disk(radius);
    (0..iterations).fold(image.clone(), |acc, _| op(&acc, &mask))
}
