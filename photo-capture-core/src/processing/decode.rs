//! Turns the raw bytes a backend hands back into a displayable image.

use image::{ImageFormat, RgbImage};

use crate::models::error::CaptureError;
use crate::models::photo::{PixelFormat, RawPhoto};

/// Decode a raw photo into packed RGB.
///
/// Empty data means the backend produced no file representation and is
/// reported the same way as undecodable data.
pub fn decode_photo(raw: RawPhoto) -> Result<RgbImage, CaptureError> {
    if raw.data.is_empty() {
        return Err(CaptureError::ImageDecodeFailed("no image data".into()));
    }

    match raw.format {
        PixelFormat::Jpeg => image::load_from_memory_with_format(&raw.data, ImageFormat::Jpeg)
            .map(|img| img.to_rgb8())
            .map_err(|e| CaptureError::ImageDecodeFailed(e.to_string())),
        PixelFormat::Rgb8 { width, height } => {
            let expected = rgb8_len(width, height).ok_or_else(|| {
                CaptureError::ImageDecodeFailed(format!("{}x{} RGB is too large", width, height))
            })?;
            if raw.data.len() != expected {
                return Err(CaptureError::ImageDecodeFailed(format!(
                    "expected {} bytes for {}x{} RGB, got {}",
                    expected,
                    width,
                    height,
                    raw.data.len()
                )));
            }
            RgbImage::from_raw(width, height, raw.data)
                .ok_or_else(|| CaptureError::ImageDecodeFailed("invalid RGB buffer".into()))
        }
    }
}

/// Byte length of a packed RGB8 frame, or `None` if it does not fit in `usize`.
fn rgb8_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(3)
}

/// Encode `image` as JPEG. Used by test backends to produce realistic payloads.
pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, CaptureError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|e| CaptureError::Unknown(format!("jpeg encode failed: {}", e)))?;
    Ok(bytes)
}
