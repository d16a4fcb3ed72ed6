use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::Luma;
use matte_refine::{
    decode_rgb, encode_png, CutoutPipeline, EdgeFeather, Image, MaskTensor, ProfilePreset,
    RefinementProfile,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Refine a coarse foreground mask into a clean RGBA cutout",
    long_about = None
)]
struct Args {
    /// Input photograph (PNG, JPEG, WebP or BMP)
    #[arg(short, long)]
    image: PathBuf,

    /// Foreground score map produced by a segmentation model
    #[arg(short, long)]
    mask: PathBuf,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,

    /// Refinement preset: standard, aggressive or soft
    #[arg(short, long, default_value_t = ProfilePreset::Standard)]
    profile: ProfilePreset,

    /// Also write the trimap to this path
    #[arg(long)]
    trimap: Option<PathBuf>,

    /// Feather alpha inside the trimap's unknown band with this Gaussian sigma
    #[arg(long)]
    feather: Option<f32>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let profile = RefinementProfile {
        feather: args.feather.map(|sigma| EdgeFeather { sigma }),
        ..args.profile.profile()
    };
    let pipeline = CutoutPipeline::new(profile)
        .with_context(|| format!("Invalid profile {}", args.profile))?;
    tracing::info!("Profile: {}", args.profile);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let image = decode_rgb(&bytes)
        .with_context(|| format!("Failed to decode {}", args.image.display()))?;
    tracing::info!("Image: {}x{}", image.width(), image.height());

    let mask = load_mask(&args.mask)?;
    tracing::info!("Mask: {}x{}", mask.width(), mask.height());

    let refinement = pipeline
        .refine_with_trimap(&image, mask)
        .context("Refinement failed")?;

    let png = encode_png(&refinement.cutout).context("Failed to encode cutout")?;
    std::fs::write(&args.output, png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!("Cutout written to {}", args.output.display());

    if let Some(path) = &args.trimap {
        match &refinement.trimap {
            Some(trimap) => {
                trimap
                    .as_image()
                    .save(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("Trimap written to {}", path.display());
            }
            None => tracing::warn!("Profile {} builds no trimap", args.profile),
        }
    }

    Ok(())
}

/// Loads a grayscale score map as a [0, 1] tensor.
fn load_mask(path: &Path) -> Result<MaskTensor> {
    let mask = image::open(path)
        .with_context(|| format!("Failed to open mask {}", path.display()))?
        .into_luma8();

    Ok(Image::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([f32::from(mask.get_pixel(x, y)[0]) / 255.0])
    }))
}
