use thiserror::Error;

/// Error type for per-stage matte operations
///
/// Raised when the buffers handed to a refinement stage do not describe
/// the same pixel grid, or when an output buffer cannot be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatteError {
    /// Image and mask dimensions do not match
    ///
    /// Every stage after the mask normalizer works on the full-resolution
    /// image, so the color plane and the alpha plane must line up exactly.
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// Failed to create ImageBuffer from processed pixels
    ///
    /// The processed sample vector did not have the length required for a
    /// contiguous row-major buffer of the requested dimensions.
    #[error("Failed to create ImageBuffer from processed pixels")]
    ImageBufferCreationFailed,
}

/// Error type for refinement profile validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A profile parameter is outside its accepted range
    #[error("Invalid profile parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field
        name: &'static str,
        /// Human readable constraint that was violated
        reason: String,
    },

    /// A preset name did not match any known preset
    #[error("Unknown refinement preset `{0}` (expected standard, aggressive or soft)")]
    UnknownPreset(String),
}

/// Error type for decoding the input raster
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input byte stream was empty
    #[error("Input image is empty")]
    Empty,

    /// The input could not be decoded as any supported raster format
    #[error("Input image could not be decoded")]
    Malformed(#[source] image::ImageError),

    /// The input decoded to an image with zero width or height
    #[error("Decoded image has zero-sized dimensions {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
}

/// Error type for the segmentation model collaborator
///
/// Inference failures are propagated to the caller untouched; the pipeline
/// never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The model returned a tensor with no samples
    #[error("Model returned an empty mask tensor")]
    EmptyOutput,

    /// The model returned a tensor whose shape does not match its declaration
    #[error("Model output has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Expected shape (width, height)
        expected: (u32, u32),
        /// Actual shape (width, height)
        actual: (u32, u32),
    },

    /// The model backend reported a failure
    #[error("Model backend failed: {0}")]
    Backend(String),

    /// The shared model session could not be initialized
    #[error("Model session initialization failed: {0}")]
    SessionInit(String),
}

/// Error type for encoding the output raster
#[derive(Debug, Error)]
#[error("Failed to encode output image")]
pub struct EncodeError(#[source] pub image::ImageError);

/// Top-level error returned by the cutout pipeline
///
/// Each variant maps to exactly one failure class so callers can tell which
/// stage aborted the request.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Matte(#[from] MatteError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}
