//! Image decoding: raw bytes in, RGBA raster out.
//!
//! Accepts whatever the `image` crate can decode (PNG, JPEG, BMP, WebP).
//! This is the only stage that touches the input byte stream; everything
//! downstream works on in-memory rasters.

use crate::types::{RgbaImage, ScanError};

/// Decode raw image bytes into an RGBA image.
///
/// # Errors
///
/// Returns [`ScanError::EmptyInput`] if `bytes` is empty.
/// Returns [`ScanError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
