use image::{Rgb, Rgba};
use imageproc::definitions::Image;

use crate::{
    error::{Error, ProfileError},
    matte_refine::{
        alpha_hardener::HardenAlphaExt,
        codec::{decode_rgb, encode_png},
        composite::CompositeExt,
        decontaminate::DecontaminateExt,
        feather::FeatherEdgesExt,
        mask_normalizer::{mask_to_alpha, normalize_mask, MaskTensor},
        model::{run_model, MattingModel},
        profile::RefinementProfile,
        tone::apply_tone_correction,
        trimap::{build_trimap, Trimap},
    },
};

/// Output of one refinement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub cutout: Image<Rgba<u8>>,
    /// Present when the profile configures trimap radii
    pub trimap: Option<Trimap>,
}

/// The full refinement pipeline for one validated profile.
///
/// `Decode -> Normalize -> Trimap -> Harden -> Feather -> Decontaminate ->
/// ToneCorrect -> Composite -> Encode`, one pass per stage with no retry. The pipeline
/// holds only the immutable profile and can be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoutPipeline {
    profile: RefinementProfile,
}

impl CutoutPipeline {
    /// Validates `profile` and builds a pipeline around it.
    ///
    /// # Errors
    ///
    /// * `ProfileError::InvalidParameter` - When a profile field is out of range
    pub fn new(profile: RefinementProfile) -> Result<Self, ProfileError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub const fn profile(&self) -> &RefinementProfile {
        &self.profile
    }

    /// Refines a raw model score into an RGBA cutout of `image`.
    ///
    /// # Errors
    ///
    /// * `Error::Inference` - When `raw_mask` is empty
    /// * `Error::Matte` - When an intermediate buffer cannot be built
    pub fn refine(
        &self,
        image: &Image<Rgb<u8>>,
        raw_mask: MaskTensor,
    ) -> Result<Image<Rgba<u8>>, Error> {
        self.refine_with_trimap(image, raw_mask)
            .map(|refinement| refinement.cutout)
    }

    /// Like [`refine`](Self::refine), also returning the trimap.
    ///
    /// # Errors
    ///
    /// * `Error::Inference` - When `raw_mask` is empty
    /// * `Error::Matte` - When an intermediate buffer cannot be built
    pub fn refine_with_trimap(
        &self,
        image: &Image<Rgb<u8>>,
        raw_mask: MaskTensor,
    ) -> Result<Refinement, Error> {
        let (width, height) = image.dimensions();
        let _span = tracing::debug_span!("refine", width, height).entered();

        let mask = normalize_mask(raw_mask, (width, height), self.profile.contrast)?;
        let mask = mask_to_alpha(&mask);

        let trimap = self.profile.trimap.map(|radii| build_trimap(&mask, radii));
        let mut alpha = mask.harden_alpha(&self.profile.hardening());

        if let (Some(feather), Some(trimap)) = (self.profile.feather, trimap.as_ref()) {
            alpha.feather_edges_mut(trimap, feather)?;
        }

        let mut color = image.clone();
        color.decontaminate_mut(&alpha, &self.profile.decontamination_params())?;

        if !self.profile.tone.is_noop() {
            let _span = tracing::debug_span!("tone").entered();
            color = apply_tone_correction(color, &alpha, &self.profile.tone)?;
        }

        let cutout = {
            let _span = tracing::debug_span!("composite").entered();
            color.composite(&alpha)?
        };

        Ok(Refinement { cutout, trimap })
    }

    /// Runs `model` on `image` and refines its output.
    ///
    /// # Errors
    ///
    /// * `Error::Inference` - When the model fails or returns a malformed tensor
    /// * `Error::Matte` - When an intermediate buffer cannot be built
    pub fn process_image<M>(
        &self,
        model: &M,
        image: &Image<Rgb<u8>>,
    ) -> Result<Image<Rgba<u8>>, Error>
    where
        M: MattingModel + ?Sized,
    {
        let raw = run_model(model, image)?;
        self.refine(image, raw)
    }

    /// Decodes `bytes`, refines the cutout and encodes it as PNG.
    ///
    /// # Errors
    ///
    /// * `Error::Decode` - When the input cannot be decoded
    /// * `Error::Inference` - When the model fails or returns a malformed tensor
    /// * `Error::Matte` - When an intermediate buffer cannot be built
    /// * `Error::Encode` - When the PNG encoder fails
    pub fn process_bytes<M>(&self, model: &M, bytes: &[u8]) -> Result<Vec<u8>, Error>
    where
        M: MattingModel + ?Sized,
    {
        let image = decode_rgb(bytes)?;
        let cutout = self.process_image(model, &image)?;
        drop(image);
        Ok(encode_png(&cutout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::InferenceError,
        matte_refine::{
            profile::{EdgeFeather, ProfilePreset, TrimapRadii},
            trimap::TrimapBand,
        },
    };
    use image::Luma;

    fn centered_square(size: u32, side: u32) -> MaskTensor {
        let start = (size - side) / 2;
        let end = start + side;
        Image::from_fn(size, size, |x, y| {
            let inside = (start..end).contains(&x) && (start..end).contains(&y);
            Luma([if inside { 0.97 } else { 0.02 }])
        })
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let profile = RefinementProfile {
            inpaint_radius: 0,
            ..RefinementProfile::standard()
        };
        assert!(CutoutPipeline::new(profile).is_err());
    }

    #[test]
    fn empty_mask_is_an_inference_error() {
        let pipeline = CutoutPipeline::new(RefinementProfile::standard()).unwrap();
        let image = Image::from_pixel(4, 4, Rgb([1u8, 2, 3]));
        assert!(matches!(
            pipeline.refine(&image, Image::new(0, 0)),
            Err(Error::Inference(InferenceError::EmptyOutput))
        ));
    }

    #[test]
    fn all_zero_mask_yields_transparent_cutout() {
        let pipeline = CutoutPipeline::new(RefinementProfile::standard()).unwrap();
        let image = Image::from_pixel(12, 12, Rgb([200u8, 10, 10]));
        let cutout = pipeline.refine(&image, Image::new(12, 12)).unwrap();
        assert!(cutout.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn square_mask_keeps_its_core_and_drops_its_surroundings() {
        for preset in [
            ProfilePreset::Standard,
            ProfilePreset::Aggressive,
            ProfilePreset::Soft,
        ] {
            let pipeline = CutoutPipeline::new(preset.profile()).unwrap();
            let image = Image::from_pixel(60, 60, Rgb([90u8, 140, 60]));
            let refinement = pipeline
                .refine_with_trimap(&image, centered_square(60, 30))
                .unwrap();

            assert_eq!(refinement.cutout.get_pixel(30, 30)[3], 255, "{preset}");
            assert_eq!(refinement.cutout.get_pixel(2, 2)[3], 0, "{preset}");
            assert!(refinement.trimap.is_some());
        }
    }

    /// Soft ramp rising to the right, red subject over a green background.
    fn ramp_scene() -> (Image<Rgb<u8>>, MaskTensor) {
        let image = Image::from_fn(60, 60, |x, _| {
            if x >= 40 {
                Rgb([220u8, 20, 20])
            } else {
                Rgb([20, 220, 20])
            }
        });
        let mask = Image::from_fn(60, 60, |x, _| Luma([(x as f32 / 40.0).min(1.0)]));
        (image, mask)
    }

    #[test]
    fn decontamination_runs_whatever_the_trimap_radii() {
        let (image, mask) = ramp_scene();
        let zero_radii = RefinementProfile {
            trimap: Some(TrimapRadii { erode: 0, dilate: 0 }),
            ..RefinementProfile::soft()
        };
        let no_trimap = RefinementProfile {
            trimap: None,
            ..RefinementProfile::soft()
        };

        let with_trimap = CutoutPipeline::new(zero_radii)
            .unwrap()
            .refine(&image, mask.clone())
            .unwrap();
        let without_trimap = CutoutPipeline::new(no_trimap)
            .unwrap()
            .refine(&image, mask)
            .unwrap();

        assert_eq!(with_trimap, without_trimap);
        let recolored = with_trimap
            .enumerate_pixels()
            .filter(|(_, _, p)| p[3] > 0 && p[3] < 255)
            .filter(|(x, y, p)| p.0[..3] != image.get_pixel(*x, *y).0[..])
            .count();
        assert!(recolored > 0);
    }

    #[test]
    fn feathering_only_touches_the_unknown_band() {
        let image = Image::from_pixel(60, 60, Rgb([90u8, 140, 60]));
        let plain = CutoutPipeline::new(RefinementProfile::standard())
            .unwrap()
            .refine_with_trimap(&image, centered_square(60, 30))
            .unwrap();
        let feathered = CutoutPipeline::new(RefinementProfile {
            feather: Some(EdgeFeather::default()),
            ..RefinementProfile::standard()
        })
        .unwrap()
        .refine_with_trimap(&image, centered_square(60, 30))
        .unwrap();

        let trimap = feathered.trimap.expect("standard profile builds a trimap");
        assert_eq!(Some(&trimap), plain.trimap.as_ref());
        for (x, y, pixel) in feathered.cutout.enumerate_pixels() {
            if trimap.band(x, y) != TrimapBand::Unknown {
                assert_eq!(pixel[3], plain.cutout.get_pixel(x, y)[3], "({x}, {y})");
            }
        }
        assert!(feathered.cutout.pixels().any(|p| p[3] > 0 && p[3] < 255));
        assert!(plain.cutout.pixels().all(|p| p[3] == 0 || p[3] == 255));
    }
}
