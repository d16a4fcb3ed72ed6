//! Segmentation model seam.
//!
//! The refinement pipeline does not run a network itself. It consumes any
//! [`MattingModel`] that maps a prepared square input to a single-channel
//! score tensor, and keeps one lazily loaded instance in a [`SharedSession`].

use std::fmt::Display;
use std::sync::{Mutex, OnceLock, PoisonError};

use image::{imageops::FilterType, Rgb};
use imageproc::definitions::Image;
use ndarray::{Array4, ArrayView4};

use crate::{error::InferenceError, matte_refine::mask_normalizer::MaskTensor};

/// Square input side expected by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelResolution {
    /// 320 x 320
    Lightweight,
    /// 1024 x 1024
    HighPrecision,
    Custom(u32),
}

impl ModelResolution {
    pub const fn side(self) -> u32 {
        match self {
            Self::Lightweight => 320,
            Self::HighPrecision => 1024,
            Self::Custom(side) => side,
        }
    }
}

/// Per-channel `(v - mean) / std` applied after scaling to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputNormalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl InputNormalization {
    pub const LIGHTWEIGHT: Self = Self {
        mean: [0.5; 3],
        std: [0.5; 3],
    };

    pub const HIGH_PRECISION: Self = Self {
        mean: [0.5; 3],
        std: [1.0; 3],
    };
}

/// Planar float input of a square model, shaped `[1, 3, side, side]` (NCHW).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    tensor: Array4<f32>,
}

impl ModelInput {
    pub fn side(&self) -> u32 {
        self.tensor.dim().3 as u32
    }

    /// Borrowed NCHW view, red plane first.
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.tensor.view()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.tensor
    }
}

/// A segmentation or matting network.
///
/// Implementations must be shareable across request threads; inference is
/// read-only.
pub trait MattingModel: Send + Sync {
    fn resolution(&self) -> ModelResolution;

    fn normalization(&self) -> InputNormalization;

    /// Runs the network on an NCHW view of shape `[1, 3, side, side]`. The
    /// returned tensor may have any real range; it is expected to be
    /// `side x side`.
    fn infer(&self, input: ArrayView4<'_, f32>) -> Result<MaskTensor, InferenceError>;
}

/// Resizes the image to `side x side` (bilinear) and lays it out as a
/// normalized NCHW tensor.
pub fn prepare_input(
    image: &Image<Rgb<u8>>,
    side: u32,
    normalization: InputNormalization,
) -> ModelInput {
    let _span = tracing::debug_span!("prepare_input", side).entered();

    let resized = if image.dimensions() == (side, side) {
        image.clone()
    } else {
        image::imageops::resize(image, side, side, FilterType::Triangle)
    };

    let mut tensor = Array4::<f32>::zeros((1, 3, side as usize, side as usize));
    for (x, y, Rgb(channels)) in resized.enumerate_pixels() {
        for (c, value) in channels.iter().enumerate() {
            let scaled = f32::from(*value) / 255.0;
            tensor[[0, c, y as usize, x as usize]] =
                (scaled - normalization.mean[c]) / normalization.std[c];
        }
    }

    ModelInput { tensor }
}

/// Runs `model` on `image` and checks the shape of its output.
///
/// # Errors
///
/// * `InferenceError::EmptyOutput` - When the model returns no samples
/// * `InferenceError::ShapeMismatch` - When the output is not `side x side`
/// * Any error reported by the model itself
pub fn run_model<M>(model: &M, image: &Image<Rgb<u8>>) -> Result<MaskTensor, InferenceError>
where
    M: MattingModel + ?Sized,
{
    let side = model.resolution().side();
    let input = prepare_input(image, side, model.normalization());

    let _span = tracing::debug_span!("infer", side).entered();
    let output = model.infer(input.view())?;

    if output.width() == 0 || output.height() == 0 {
        return Err(InferenceError::EmptyOutput);
    }
    if output.dimensions() != (side, side) {
        return Err(InferenceError::ShapeMismatch {
            expected: (side, side),
            actual: output.dimensions(),
        });
    }
    Ok(output)
}

/// A model loaded at most once and then shared read-only.
///
/// The loader runs under an init lock, so concurrent first requests trigger a
/// single load. A failed load is returned to the caller and leaves the
/// session empty for the next attempt.
#[derive(Debug)]
pub struct SharedSession<M> {
    model: OnceLock<M>,
    init: Mutex<()>,
}

impl<M> SharedSession<M> {
    pub const fn new() -> Self {
        Self {
            model: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Returns the model if it has been loaded.
    pub fn get(&self) -> Option<&M> {
        self.model.get()
    }

    /// Returns the model, loading it first if needed.
    ///
    /// # Errors
    ///
    /// * `InferenceError::SessionInit` - When `load` fails
    pub fn get_or_try_init<F, E>(&self, load: F) -> Result<&M, InferenceError>
    where
        F: FnOnce() -> Result<M, E>,
        E: Display,
    {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        tracing::info!("loading model session");
        let model = load().map_err(|e| InferenceError::SessionInit(e.to_string()))?;
        let _ = self.model.set(model);

        self.model
            .get()
            .ok_or_else(|| InferenceError::SessionInit("session was not stored".to_string()))
    }
}

impl<M> Default for SharedSession<M> {
    fn default() -> Self {
        Self::new()
    }
}
