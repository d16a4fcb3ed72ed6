//! Fast-marching inpainting (Telea).
//!
//! Pixels flagged in the mask are filled in order of their distance from the
//! known region. Each filled pixel is a weighted mean of the already known
//! pixels within `radius`, weighted by direction, distance and level-set
//! proximity. The march can be limited to a maximum depth; pixels beyond it
//! keep their original value.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use image::{Luma, Pixel};
use imageproc::definitions::Image;

use crate::{
    error::MatteError,
    utils::{clamp_f32_to_primitive, validate_matching_dimensions},
};

const INF: f32 = 1.0e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Known,
    Band,
    Inside,
}

/// Min-heap entry ordered by arrival time.
#[derive(Debug, Clone, Copy)]
struct Front {
    t: f32,
    index: usize,
}

impl PartialEq for Front {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Front {}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Front {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .total_cmp(&self.t)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// Interleaved f32 planes plus the fill mask, in row-major order.
pub(crate) struct Canvas<'a> {
    pub data: &'a mut [f32],
    pub channels: usize,
    pub width: usize,
    pub height: usize,
}

struct March {
    flags: Vec<Flag>,
    t: Vec<f32>,
    width: usize,
    height: usize,
}

impl March {
    fn flag(&self, x: isize, y: isize) -> Flag {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            Flag::Inside
        } else {
            self.flags[y as usize * self.width + x as usize]
        }
    }

    fn time(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            INF
        } else {
            self.t[y as usize * self.width + x as usize]
        }
    }

    /// Eikonal update from two orthogonal neighbours.
    fn solve(&self, (x1, y1): (isize, isize), (x2, y2): (isize, isize)) -> f32 {
        let a1 = self.time(x1, y1);
        let a2 = self.time(x2, y2);
        let known1 = self.flag(x1, y1) != Flag::Inside;
        let known2 = self.flag(x2, y2) != Flag::Inside;

        match (known1, known2) {
            (true, true) => {
                let diff = a1 - a2;
                if diff.abs() >= 1.0 {
                    1.0 + a1.min(a2)
                } else {
                    (a1 + a2 + (2.0 - diff * diff).sqrt()) * 0.5
                }
            }
            (true, false) => 1.0 + a1,
            (false, true) => 1.0 + a2,
            (false, false) => INF,
        }
    }

    fn arrival(&self, x: isize, y: isize) -> f32 {
        [
            self.solve((x, y - 1), (x - 1, y)),
            self.solve((x, y - 1), (x + 1, y)),
            self.solve((x, y + 1), (x - 1, y)),
            self.solve((x, y + 1), (x + 1, y)),
        ]
        .into_iter()
        .fold(INF, f32::min)
    }

    /// One-sided or central difference of T along one axis.
    fn gradient_component(&self, x: isize, y: isize, dx: isize, dy: isize) -> f32 {
        let fwd = self.flag(x + dx, y + dy) != Flag::Inside;
        let bwd = self.flag(x - dx, y - dy) != Flag::Inside;
        let here = self.time(x, y);
        match (fwd, bwd) {
            (true, true) => (self.time(x + dx, y + dy) - self.time(x - dx, y - dy)) * 0.5,
            (true, false) => self.time(x + dx, y + dy) - here,
            (false, true) => here - self.time(x - dx, y - dy),
            (false, false) => 0.0,
        }
    }
}

/// Fills every pixel where `fill[i]` is set.
pub(crate) fn inpaint_canvas(
    canvas: &mut Canvas<'_>,
    fill: &[bool],
    radius: u32,
    max_depth: Option<f32>,
) {
    let Canvas {
        width,
        height,
        channels,
        ..
    } = *canvas;
    let len = width * height;
    if len == 0 || fill.len() != len || !fill.iter().any(|&f| f) {
        return;
    }

    let mut march = March {
        flags: fill
            .iter()
            .map(|&f| if f { Flag::Inside } else { Flag::Known })
            .collect(),
        t: fill.iter().map(|&f| if f { INF } else { 0.0 }).collect(),
        width,
        height,
    };

    let mut heap = BinaryHeap::new();
    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            if fill[index] {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            let borders_hole = [(1, 0), (-1, 0), (0, 1), (0, -1)].into_iter().any(|(dx, dy)| {
                let (nx, ny) = (xi + dx, yi + dy);
                nx >= 0
                    && ny >= 0
                    && (nx as usize) < width
                    && (ny as usize) < height
                    && fill[ny as usize * width + nx as usize]
            });
            if borders_hole {
                march.flags[index] = Flag::Band;
                heap.push(Front { t: 0.0, index });
            }
        }
    }

    let radius = radius.max(1) as isize;
    let radius_sq = (radius * radius) as f32;
    let mut filled = 0usize;

    while let Some(Front { t, index }) = heap.pop() {
        if march.flags[index] == Flag::Known || t > march.t[index] {
            continue;
        }
        march.flags[index] = Flag::Known;

        let (x, y) = ((index % width) as isize, (index / width) as isize);
        for (nx, ny) in [(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)] {
            let flag = march.flag(nx, ny);
            if flag == Flag::Known
                || nx < 0
                || ny < 0
                || nx as usize >= width
                || ny as usize >= height
            {
                continue;
            }

            let n_index = ny as usize * width + nx as usize;
            let arrival = march.arrival(nx, ny);
            if max_depth.is_some_and(|depth| arrival > depth) || arrival >= march.t[n_index] {
                continue;
            }
            march.t[n_index] = arrival;

            if flag == Flag::Inside {
                march.flags[n_index] = Flag::Band;
                fill_pixel(canvas, &march, nx, ny, radius, radius_sq);
                filled += 1;
            }
            heap.push(Front {
                t: arrival,
                index: n_index,
            });
        }
    }

    tracing::debug!(filled, channels, "inpaint march finished");
}

fn fill_pixel(
    canvas: &mut Canvas<'_>,
    march: &March,
    x: isize,
    y: isize,
    radius: isize,
    radius_sq: f32,
) {
    let channels = canvas.channels;
    let grad_x = march.gradient_component(x, y, 1, 0);
    let grad_y = march.gradient_component(x, y, 0, 1);
    let t_here = march.time(x, y);

    let mut sums = [0.0f32; 4];
    let mut weight_sum = 0.0f32;

    for ny in (y - radius)..=(y + radius) {
        for nx in (x - radius)..=(x + radius) {
            if march.flag(nx, ny) == Flag::Inside || (nx == x && ny == y) {
                continue;
            }
            let (rx, ry) = ((x - nx) as f32, (y - ny) as f32);
            let dist_sq = rx * rx + ry * ry;
            if dist_sq > radius_sq {
                continue;
            }

            let dst = 1.0 / (dist_sq * dist_sq.sqrt());
            let lev = 1.0 / (1.0 + (march.time(nx, ny) - t_here).abs());
            let mut dir = rx * grad_x + ry * grad_y;
            if dir.abs() <= 0.01 {
                dir = 1.0e-6;
            }
            let weight = (dst * lev * dir).abs();

            let base = (ny as usize * canvas.width + nx as usize) * channels;
            for (c, sum) in sums.iter_mut().enumerate().take(channels) {
                *sum += weight * canvas.data[base + c];
            }
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        let base = (y as usize * canvas.width + x as usize) * channels;
        for (c, sum) in sums.iter().enumerate().take(channels) {
            canvas.data[base + c] = sum / weight_sum;
        }
    }
}

/// Inpaints every pixel where `mask` is non-zero.
///
/// # Arguments
///
/// * `image` - Source image with 8-bit channels (up to 4)
/// * `mask` - Non-zero marks the pixels to fill
/// * `radius` - Neighbourhood radius used for each filled pixel
/// * `max_depth` - Optional limit on the distance from the known region
///
/// # Errors
///
/// * `MatteError::DimensionMismatch` - When image and mask dimensions don't match
/// * `MatteError::ImageBufferCreationFailed` - When the output buffer cannot be built
pub fn inpaint_telea<P>(
    image: &Image<P>,
    mask: &Image<Luma<u8>>,
    radius: u32,
    max_depth: Option<f32>,
) -> Result<Image<P>, MatteError>
where
    P: Pixel<Subpixel = u8>,
{
    validate_matching_dimensions(image, mask)?;

    let channels = usize::from(P::CHANNEL_COUNT);
    if channels > 4 {
        return Err(MatteError::ImageBufferCreationFailed);
    }

    let fill: Vec<bool> = mask.pixels().map(|Luma([v])| *v > 0).collect();
    if !fill.iter().any(|&f| f) {
        return Ok(image.clone());
    }

    let mut data: Vec<f32> = image.as_raw().iter().map(|&v| f32::from(v)).collect();
    let mut canvas = Canvas {
        data: &mut data,
        channels,
        width: image.width() as usize,
        height: image.height() as usize,
    };
    inpaint_canvas(&mut canvas, &fill, radius, max_depth);

    // Only filled pixels are re-quantized
    let raw: Vec<u8> = data
        .iter()
        .zip(image.as_raw())
        .enumerate()
        .map(|(i, (&value, &original))| {
            if fill[i / channels] {
                clamp_f32_to_primitive(value.round())
            } else {
                original
            }
        })
        .collect();

    Image::from_raw(image.width(), image.height(), raw)
        .ok_or(MatteError::ImageBufferCreationFailed)
}
