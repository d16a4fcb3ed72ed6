//! Three-band trimap construction.

use image::Luma;
use imageproc::{definitions::Image, map::map_colors};

use crate::matte_refine::{
    morphology::{binarize, dilate_disk, erode_disk},
    profile::TrimapRadii,
};

/// Sample value of the definite-background band.
pub const BACKGROUND: u8 = 0;
/// Sample value of the unknown band.
pub const UNKNOWN: u8 = 128;
/// Sample value of the definite-foreground band.
pub const FOREGROUND: u8 = 255;

/// Typed view of a trimap sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimapBand {
    Background,
    Unknown,
    Foreground,
}

impl TrimapBand {
    pub const fn value(self) -> u8 {
        match self {
            Self::Background => BACKGROUND,
            Self::Unknown => UNKNOWN,
            Self::Foreground => FOREGROUND,
        }
    }

    const fn from_value(value: u8) -> Self {
        match value {
            FOREGROUND => Self::Foreground,
            BACKGROUND => Self::Background,
            _ => Self::Unknown,
        }
    }
}

/// Pixel counts per band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrimapCounts {
    pub background: usize,
    pub unknown: usize,
    pub foreground: usize,
}

/// Single-channel map whose samples are exactly 0, 128 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trimap(Image<Luma<u8>>);

impl Trimap {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Band of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn band(&self, x: u32, y: u32) -> TrimapBand {
        TrimapBand::from_value(self.0.get_pixel(x, y)[0])
    }

    pub fn counts(&self) -> TrimapCounts {
        self.0
            .pixels()
            .fold(TrimapCounts::default(), |mut counts, Luma([v])| {
                match TrimapBand::from_value(*v) {
                    TrimapBand::Background => counts.background += 1,
                    TrimapBand::Unknown => counts.unknown += 1,
                    TrimapBand::Foreground => counts.foreground += 1,
                }
                counts
            })
    }

    /// Returns `true` when at least one pixel is in the unknown band.
    pub fn has_unknown(&self) -> bool {
        self.0.pixels().any(|Luma([v])| *v == UNKNOWN)
    }

    /// 255 where the band is unknown, 0 elsewhere.
    pub fn unknown_mask(&self) -> Image<Luma<u8>> {
        map_colors(&self.0, |Luma([v])| {
            Luma([if v == UNKNOWN { 255 } else { 0 }])
        })
    }

    pub fn as_image(&self) -> &Image<Luma<u8>> {
        &self.0
    }

    pub fn into_inner(self) -> Image<Luma<u8>> {
        self.0
    }
}

/// Builds a trimap from an 8-bit mask.
///
/// The mask is binarized at `> 127`. Erosion by a disk of `radii.erode` gives
/// the definite foreground; dilation by a disk of `radii.dilate`, inverted,
/// gives the definite background. Everything else is unknown.
///
/// The two definite bands never overlap, and the foreground is always a
/// subset of the binarized mask.
///
/// # Examples
///
/// ```no_run
/// use matte_refine::{build_trimap, Image, TrimapBand, TrimapRadii};
/// use image::Luma;
///
/// let mask: Image<Luma<u8>> =
///     Image::from_fn(32, 32, |x, _| Luma([if x < 16 { 255 } else { 0 }]));
/// let trimap = build_trimap(&mask, TrimapRadii::default());
/// assert_eq!(trimap.band(0, 0), TrimapBand::Foreground);
/// assert_eq!(trimap.band(16, 0), TrimapBand::Unknown);
/// ```
pub fn build_trimap(mask: &Image<Luma<u8>>, radii: TrimapRadii) -> Trimap {
    let _span =
        tracing::debug_span!("trimap", erode = radii.erode, dilate = radii.dilate).entered();

    let binary = binarize(mask, 127);
    let foreground = erode_disk(&binary, radii.erode, 1);
    let reachable = dilate_disk(&binary, radii.dilate, 1);

    let trimap = Image::from_fn(mask.width(), mask.height(), |x, y| {
        let value = if foreground.get_pixel(x, y)[0] == 255 {
            FOREGROUND
        } else if reachable.get_pixel(x, y)[0] == 0 {
            BACKGROUND
        } else {
            UNKNOWN
        };
        Luma([value])
    });

    let trimap = Trimap(trimap);
    let counts = trimap.counts();
    tracing::debug!(
        foreground = counts.foreground,
        unknown = counts.unknown,
        background = counts.background,
        "trimap built"
    );
    trimap
}
