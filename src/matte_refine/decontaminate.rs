use image::{Luma, Rgb};
use imageproc::{definitions::Image, map::map_colors};
use palette::{FromColor, IntoColor, Lab, Srgb};

use crate::{
    error::MatteError,
    matte_refine::{
        inpaint::{inpaint_canvas, inpaint_telea, Canvas},
        morphology::{dilate_disk, dilate_rgb_disk},
        profile::{DecontaminationParams, DecontaminationStrategy},
    },
    utils::{is_transition, validate_matching_dimensions},
};

/// Trait providing color decontamination for RGB images
///
/// Edge pixels of a cutout carry a mix of foreground and background color.
/// Decontamination replaces that mix with plausible foreground color so no
/// halo shows once the cutout is placed on a new background.
///
/// When the alpha channel has no partial pixels the image is returned
/// unchanged. Pixels with alpha 255 are never written.
pub trait DecontaminateExt {
    /// Decontaminates the image. This consumes the original image.
    ///
    /// # Arguments
    ///
    /// * `alpha` - Final alpha channel, same dimensions as the image
    /// * `params` - Strategy and radii, usually `RefinementProfile::decontamination_params()`
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
    /// * `MatteError::ImageBufferCreationFailed` - When the inpainted buffer cannot be built
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use matte_refine::{DecontaminateExt, Image, RefinementProfile};
    /// use image::{Luma, Rgb};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let image: Image<Rgb<u8>> = Image::new(10, 10);
    /// let alpha: Image<Luma<u8>> = Image::new(10, 10);
    ///
    /// let params = RefinementProfile::standard().decontamination_params();
    /// let clean = image.decontaminate(&alpha, &params)?;
    /// # Ok(())
    /// # }
    /// ```
    fn decontaminate(
        self,
        alpha: &Image<Luma<u8>>,
        params: &DecontaminationParams,
    ) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Decontaminates the image in-place.
    fn decontaminate_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: &DecontaminationParams,
    ) -> Result<&mut Self, MatteError>;
}

impl DecontaminateExt for Image<Rgb<u8>> {
    fn decontaminate(
        mut self,
        alpha: &Image<Luma<u8>>,
        params: &DecontaminationParams,
    ) -> Result<Self, MatteError> {
        self.decontaminate_mut(alpha, params)?;
        Ok(self)
    }

    fn decontaminate_mut(
        &mut self,
        alpha: &Image<Luma<u8>>,
        params: &DecontaminationParams,
    ) -> Result<&mut Self, MatteError> {
        validate_matching_dimensions(self, alpha)?;

        if !alpha.pixels().any(|Luma([a])| is_transition(*a)) {
            tracing::debug!("no partial alpha, decontamination skipped");
            return Ok(self);
        }

        let _span = tracing::debug_span!("decontaminate", strategy = ?params.strategy).entered();

        match params.strategy {
            DecontaminationStrategy::BoundaryInpaint => boundary_inpaint(self, alpha, params)?,
            DecontaminationStrategy::InteriorExpansion => interior_expansion(self, alpha, params),
        }

        Ok(self)
    }
}

/// Free-function form of [`DecontaminateExt::decontaminate`].
///
/// # Errors
///
/// * `MatteError::DimensionMismatch` - When image and alpha dimensions don't match
/// * `MatteError::ImageBufferCreationFailed` - When the inpainted buffer cannot be built
pub fn decontaminate(
    image: &Image<Rgb<u8>>,
    alpha: &Image<Luma<u8>>,
    params: &DecontaminationParams,
) -> Result<Image<Rgb<u8>>, MatteError> {
    image.clone().decontaminate(alpha, params)
}

/// Fills the background (alpha 0) from the edge region, up to
/// `inpaint_radius` deep.
fn boundary_inpaint(
    image: &mut Image<Rgb<u8>>,
    alpha: &Image<Luma<u8>>,
    params: &DecontaminationParams,
) -> Result<(), MatteError> {
    let background = map_colors(alpha, |Luma([a])| Luma([if a == 0 { 255 } else { 0 }]));
    let depth = params.inpaint_radius as f32;
    *image = inpaint_telea(image, &background, params.inpaint_radius, Some(depth))?;
    Ok(())
}

/// Pushes clean interior color over the widened transition band, then fills
/// whatever the expansion could not reach with an L*-only inpaint.
///
/// The expansion is a per-channel max filter, so a band pixel reached from
/// two differently colored interiors takes the channel-wise maximum of both
/// (red and green cores meet as yellow) rather than a copy of either.
fn interior_expansion(
    image: &mut Image<Rgb<u8>>,
    alpha: &Image<Luma<u8>>,
    params: &DecontaminationParams,
) {
    let floor = params.interior_alpha_floor;
    let interior = map_colors(alpha, |Luma([a])| Luma([if a >= floor { 255 } else { 0 }]));
    if !interior.pixels().any(|Luma([v])| *v == 255) {
        tracing::debug!("no clean interior, expansion skipped");
        return;
    }

    let transition = map_colors(alpha, |Luma([a])| {
        Luma([if a > 1 && a < 254 { 255 } else { 0 }])
    });
    let band = dilate_disk(&transition, params.edge_band_radius, 1);

    let interior_color = Image::from_fn(image.width(), image.height(), |x, y| {
        if interior.get_pixel(x, y)[0] == 255 {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    });
    let radius = params.edge_dilation_radius;
    let iterations = params.expansion_iterations;
    let expanded = dilate_rgb_disk(&interior_color, radius, iterations);
    let coverage = dilate_disk(&interior, radius, iterations);

    let mut gaps = vec![false; (image.width() * image.height()) as usize];
    let mut covered = 0usize;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if band.get_pixel(x, y)[0] == 0 || alpha.get_pixel(x, y)[0] == 255 {
            continue;
        }
        if coverage.get_pixel(x, y)[0] == 255 {
            *pixel = *expanded.get_pixel(x, y);
            covered += 1;
        } else {
            gaps[(y * interior.width() + x) as usize] = true;
        }
    }

    let gap_count = gaps.iter().filter(|&&g| g).count();
    tracing::debug!(covered, gaps = gap_count, "interior colors expanded");

    if gap_count > 0 {
        fill_lightness(image, &gaps, params.fallback_inpaint_radius);
    }
}

/// Inpaints only the L* channel of the gap pixels, keeping their a* and b*.
fn fill_lightness(image: &mut Image<Rgb<u8>>, gaps: &[bool], radius: u32) {
    let lab: Vec<Lab> = image.pixels().map(|&Rgb(rgb)| to_lab(rgb)).collect();
    let mut lightness: Vec<f32> = lab.iter().map(|color| color.l).collect();

    let mut canvas = Canvas {
        data: &mut lightness,
        channels: 1,
        width: image.width() as usize,
        height: image.height() as usize,
    };
    inpaint_canvas(&mut canvas, gaps, radius, None);

    image
        .pixels_mut()
        .zip(gaps.iter().zip(lab.iter().zip(lightness.iter())))
        .filter(|(_, (gap, _))| **gap)
        .for_each(|(pixel, (_, (color, &l)))| {
            *pixel = from_lab(Lab::new(l, color.a, color.b));
        });
}

fn to_lab([r, g, b]: [u8; 3]) -> Lab {
    Srgb::new(r, g, b).into_format::<f32>().into_color()
}

/// Out-of-gamut results are clamped to the sRGB cube.
fn from_lab(color: Lab) -> Rgb<u8> {
    let rgb: Srgb<u8> = Srgb::<f32>::from_color(color).into_format();
    Rgb([rgb.red, rgb.green, rgb.blue])
}
