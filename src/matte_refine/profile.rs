//! Refinement profiles.
//!
//! A [`RefinementProfile`] gathers every tunable constant of the refinement
//! pipeline into one immutable record. Deployments pick a named preset
//! ([`ProfilePreset`]) or build an explicit record; the pipeline validates it
//! once and never mutates it.

use std::fmt;
use std::str::FromStr;

use crate::error::ProfileError;
use crate::matte_refine::tone::ToneCorrection;

/// Contrast-hardening remap applied to the normalized mask.
///
/// `v' = clamp((v - low) / (high - low), 0, 1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastRemap {
    pub low: f32,
    pub high: f32,
}

impl Default for ContrastRemap {
    fn default() -> Self {
        Self {
            low: 0.2,
            high: 0.8,
        }
    }
}

/// Structuring element radii used to build the trimap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimapRadii {
    /// Erosion radius for the definite-foreground band
    pub erode: u8,
    /// Dilation radius for the definite-background band
    pub dilate: u8,
}

impl Default for TrimapRadii {
    fn default() -> Self {
        Self {
            erode: 2,
            dilate: 5,
        }
    }
}

/// Gaussian smoothing of alpha inside the trimap's unknown band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFeather {
    /// Standard deviation of the Gaussian kernel, in pixels
    pub sigma: f32,
}

impl Default for EdgeFeather {
    fn default() -> Self {
        Self { sigma: 2.0 }
    }
}

/// Strategy used by the color decontaminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecontaminationStrategy {
    /// Inpaint the background complement of the edge mask from its boundary
    BoundaryInpaint,
    /// Expand clean interior colors over the transition band, with an
    /// L*-only inpaint for any gaps
    ///
    /// Colors are expanded by a per-channel max filter. Where differently
    /// colored interiors meet, band pixels get the channel-wise maximum, which
    /// need not be a color present in either interior.
    InteriorExpansion,
}

/// Parameters of the alpha hardener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardeningParams {
    /// Radius of the disk structuring element (1 is the 3x3 ellipse)
    pub erosion_radius: u8,
    /// Number of erosion passes
    pub erosion_iterations: u32,
    /// Re-binarization threshold; `None` keeps soft values
    pub binary_threshold: Option<u8>,
    /// Power-law exponent applied to normalized alpha
    pub falloff_exponent: f32,
    /// Alpha values below this floor are forced to zero
    pub clip_floor: u8,
}

/// Parameters of the color decontaminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecontaminationParams {
    pub strategy: DecontaminationStrategy,
    /// Neighbourhood radius and fill depth of the boundary inpaint
    pub inpaint_radius: u32,
    /// Minimum alpha of the clean interior region
    pub interior_alpha_floor: u8,
    /// Disk radius used to push interior colors outward
    pub edge_dilation_radius: u8,
    /// Number of interior color expansion passes
    pub expansion_iterations: u32,
    /// Disk radius used to widen the transition band
    pub edge_band_radius: u8,
    /// Neighbourhood radius of the L* fallback inpaint
    pub fallback_inpaint_radius: u32,
}

/// Immutable configuration of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementProfile {
    pub erosion_radius: u8,
    pub erosion_iterations: u32,
    pub binary_threshold: Option<u8>,
    pub falloff_exponent: f32,
    pub clip_floor: u8,
    pub inpaint_radius: u32,
    pub interior_alpha_floor: u8,
    pub edge_dilation_radius: u8,
    pub edge_band_radius: u8,
    pub expansion_iterations: u32,
    pub fallback_inpaint_radius: u32,
    pub contrast: Option<ContrastRemap>,
    pub trimap: Option<TrimapRadii>,
    /// Feathering of the hardened alpha; requires `trimap`
    pub feather: Option<EdgeFeather>,
    pub decontamination: DecontaminationStrategy,
    pub tone: ToneCorrection,
}

impl RefinementProfile {
    /// Balanced preset for general background removal.
    pub fn standard() -> Self {
        Self {
            erosion_radius: 1,
            erosion_iterations: 4,
            binary_threshold: Some(10),
            falloff_exponent: 1.5,
            clip_floor: 80,
            inpaint_radius: 15,
            interior_alpha_floor: 245,
            edge_dilation_radius: 7,
            edge_band_radius: 15,
            expansion_iterations: 2,
            fallback_inpaint_radius: 10,
            contrast: None,
            trimap: Some(TrimapRadii::default()),
            feather: None,
            decontamination: DecontaminationStrategy::BoundaryInpaint,
            tone: ToneCorrection::none(),
        }
    }

    /// Halo-eliminating preset: deeper erosion, wider inpaint, interior
    /// color expansion and gamma compensation.
    pub fn aggressive() -> Self {
        Self {
            erosion_iterations: 6,
            inpaint_radius: 25,
            contrast: Some(ContrastRemap::default()),
            decontamination: DecontaminationStrategy::InteriorExpansion,
            tone: ToneCorrection::gamma_only(),
            ..Self::standard()
        }
    }

    /// Detail-retaining preset for hair: light erosion and no
    /// re-binarization, so the falloff and clip act on soft values.
    pub fn soft() -> Self {
        Self {
            erosion_iterations: 2,
            binary_threshold: None,
            decontamination: DecontaminationStrategy::InteriorExpansion,
            tone: ToneCorrection::gamma_only(),
            ..Self::standard()
        }
    }

    /// Parameters consumed by the alpha hardener.
    pub const fn hardening(&self) -> HardeningParams {
        HardeningParams {
            erosion_radius: self.erosion_radius,
            erosion_iterations: self.erosion_iterations,
            binary_threshold: self.binary_threshold,
            falloff_exponent: self.falloff_exponent,
            clip_floor: self.clip_floor,
        }
    }

    /// Parameters consumed by the color decontaminator.
    pub const fn decontamination_params(&self) -> DecontaminationParams {
        DecontaminationParams {
            strategy: self.decontamination,
            inpaint_radius: self.inpaint_radius,
            interior_alpha_floor: self.interior_alpha_floor,
            edge_dilation_radius: self.edge_dilation_radius,
            expansion_iterations: self.expansion_iterations,
            edge_band_radius: self.edge_band_radius,
            fallback_inpaint_radius: self.fallback_inpaint_radius,
        }
    }

    /// Checks every parameter against its accepted range.
    ///
    /// # Errors
    ///
    /// * `ProfileError::InvalidParameter` - naming the first offending field
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.falloff_exponent.is_finite() || self.falloff_exponent <= 0.0 {
            return Err(invalid(
                "falloff_exponent",
                format!("must be finite and > 0, got {}", self.falloff_exponent),
            ));
        }

        if self.inpaint_radius == 0 {
            return Err(invalid("inpaint_radius", "must be > 0".to_string()));
        }

        if self.fallback_inpaint_radius == 0 {
            return Err(invalid(
                "fallback_inpaint_radius",
                "must be > 0".to_string(),
            ));
        }

        if self.interior_alpha_floor == 0 {
            return Err(invalid("interior_alpha_floor", "must be > 0".to_string()));
        }

        if self.decontamination == DecontaminationStrategy::InteriorExpansion {
            if self.edge_dilation_radius == 0 {
                return Err(invalid("edge_dilation_radius", "must be > 0".to_string()));
            }
            if self.expansion_iterations == 0 {
                return Err(invalid("expansion_iterations", "must be > 0".to_string()));
            }
        }

        if let Some(ContrastRemap { low, high }) = self.contrast {
            if !(low.is_finite() && high.is_finite() && 0.0 <= low && low < high && high <= 1.0) {
                return Err(invalid(
                    "contrast",
                    format!("requires 0 <= low < high <= 1, got low={low} high={high}"),
                ));
            }
        }

        if let Some(EdgeFeather { sigma }) = self.feather {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(invalid(
                    "feather",
                    format!("sigma must be finite and > 0, got {sigma}"),
                ));
            }
            if self.trimap.is_none() {
                return Err(invalid("feather", "requires trimap radii".to_string()));
            }
        }

        self.tone.validate()
    }
}

impl Default for RefinementProfile {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(name: &'static str, reason: String) -> ProfileError {
    ProfileError::InvalidParameter { name, reason }
}

/// Named refinement presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfilePreset {
    #[default]
    Standard,
    Aggressive,
    Soft,
}

impl ProfilePreset {
    /// Returns the profile described by this preset.
    pub fn profile(self) -> RefinementProfile {
        match self {
            Self::Standard => RefinementProfile::standard(),
            Self::Aggressive => RefinementProfile::aggressive(),
            Self::Soft => RefinementProfile::soft(),
        }
    }
}

impl FromStr for ProfilePreset {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "aggressive" => Ok(Self::Aggressive),
            "soft" => Ok(Self::Soft),
            _ => Err(ProfileError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for ProfilePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Aggressive => "aggressive",
            Self::Soft => "soft",
        };
        f.write_str(name)
    }
}
