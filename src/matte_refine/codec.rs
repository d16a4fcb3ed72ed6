//! Raster decode and PNG encode at the pipeline boundary.

use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder, Rgb, Rgba};
use imageproc::definitions::Image;

use crate::error::{DecodeError, EncodeError};

/// Decodes any enabled raster format (PNG, JPEG, WebP, BMP) to 8-bit RGB.
///
/// # Errors
///
/// * `DecodeError::Empty` - When `bytes` is empty
/// * `DecodeError::Malformed` - When the format is unknown or the data is corrupt
/// * `DecodeError::ZeroSized` - When the decoded image has no pixels
pub fn decode_rgb(bytes: &[u8]) -> Result<Image<Rgb<u8>>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let decoded = image::load_from_memory(bytes).map_err(DecodeError::Malformed)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSized { width, height });
    }

    tracing::debug!(width, height, color = ?decoded.color(), "decoded input");
    Ok(decoded.into_rgb8())
}

/// Encodes an RGBA cutout as PNG.
///
/// # Errors
///
/// * `EncodeError` - When the encoder rejects the buffer
pub fn encode_png(image: &Image<Rgba<u8>>) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(EncodeError)?;
    Ok(bytes)
}
