//! Cheap checks run before an asset is accepted into a slot.

use crate::TranscodeError;
use image::{GenericImageView, ImageFormat};

/// Formats accepted as upload sources
const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

/// Dimensions and container format of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// Identify the container format from the magic bytes only.
///
/// This does not decode pixel data; a truncated file with a valid header
/// passes here and fails later in [`decode_check`] or the transcoder.
pub fn sniff_format(data: &[u8]) -> Result<ImageFormat, TranscodeError> {
    let format = image::guess_format(data).map_err(|_| TranscodeError::UnsupportedFormat)?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(TranscodeError::UnsupportedFormat);
    }
    Ok(format)
}

/// Fully decode `data` and report its dimensions.
pub fn decode_check(data: &[u8]) -> Result<ImageInfo, TranscodeError> {
    let format = sniff_format(data)?;
    let img = image::load_from_memory_with_format(data, format)
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    Ok(ImageInfo {
        width,
        height,
        format,
    })
}
