//! Alpha matte refinement and compositing.
//!
//! Turns a coarse foreground score from a segmentation model into a clean
//! RGBA cutout: the mask is normalized and resized, hardened, optionally
//! feathered, used to decontaminate edge colors, optionally tone corrected
//! and finally merged with the color planes.
//!
//! ```no_run
//! use matte_refine::{CutoutPipeline, Image, ProfilePreset};
//! use image::{Luma, Rgb};
//!
//! # fn example() -> Result<(), matte_refine::Error> {
//! let pipeline = CutoutPipeline::new(ProfilePreset::Standard.profile())?;
//! let image: Image<Rgb<u8>> = Image::new(64, 64);
//! let raw_mask: Image<Luma<f32>> = Image::new(32, 32);
//! let cutout = pipeline.refine(&image, raw_mask)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod matte_refine;
#[cfg(test)]
mod test_utils;
mod utils;

pub use error::{DecodeError, EncodeError, Error, InferenceError, MatteError, ProfileError};
pub use imageproc::definitions::Image;
pub use matte_refine::alpha_hardener::{harden_alpha, HardenAlphaExt};
pub use matte_refine::codec::{decode_rgb, encode_png};
pub use matte_refine::composite::{CompositeExt, ReplaceAlphaExt};
pub use matte_refine::decontaminate::{decontaminate, DecontaminateExt};
pub use matte_refine::feather::FeatherEdgesExt;
pub use matte_refine::inpaint::inpaint_telea;
pub use matte_refine::mask_normalizer::{
    apply_contrast, mask_to_alpha, normalize_mask, normalize_min_max, resize_mask, MaskTensor,
};
pub use matte_refine::model::{
    prepare_input, run_model, InputNormalization, MattingModel, ModelInput, ModelResolution,
    SharedSession,
};
pub use matte_refine::pipeline::{CutoutPipeline, Refinement};
pub use matte_refine::profile::{
    ContrastRemap, DecontaminationParams, DecontaminationStrategy, EdgeFeather, HardeningParams,
    ProfilePreset, RefinementProfile, TrimapRadii,
};
pub use matte_refine::tone::{
    apply_tone_correction, GammaCompensation, ToneCorrectExt, ToneCorrection, Unpremultiply,
};
pub use matte_refine::trimap::{build_trimap, Trimap, TrimapBand, TrimapCounts};
pub use ndarray::{Array4, ArrayView4};
