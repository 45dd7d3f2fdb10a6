//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (TIFF, PNG, JPEG, BMP) and produces the
//! single-channel 8-bit grid the sampler reads. Colour inputs are
//! converted with the standard luminance weights; 16-bit inputs are
//! scaled down to 8 bits.

use image::GrayImage;

use crate::types::RasterError;

/// Decode raw image bytes and convert to grayscale.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] if `bytes` is empty.
/// Returns [`RasterError::Decode`] if the image format is unrecognized
/// or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, RasterError> {
    if bytes.is_empty() {
        return Err(RasterError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}
