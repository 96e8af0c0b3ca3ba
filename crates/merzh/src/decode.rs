//! Encoded bytes -> RGBA pixel buffer.

use image::ImageFormat;
use tracing::{debug, warn};

use crate::{DecodeError, MAX_INPUT_BYTES, PixelBuffer};

/// Raster containers accepted by the decoder.
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
];

/// Decode an image with the default input size limit.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    decode_with_limit(bytes, MAX_INPUT_BYTES)
}

/// Decode an image, rejecting inputs larger than `max_input_bytes`.
///
/// The container is identified from its magic bytes; the file name or MIME
/// type claimed by the uploader plays no part. Animated formats yield their
/// first frame.
pub fn decode_with_limit(bytes: &[u8], max_input_bytes: usize) -> Result<PixelBuffer, DecodeError> {
    if bytes.is_empty() {
        warn!("Rejecting empty image input");
        return Err(DecodeError::Empty);
    }
    if bytes.len() > max_input_bytes {
        warn!(
            size = bytes.len(),
            limit = max_input_bytes,
            "Rejecting oversized image input"
        );
        return Err(DecodeError::TooLarge {
            limit: max_input_bytes,
            actual: bytes.len(),
        });
    }

    let format = sniff_format(bytes)?;
    debug!(?format, size = bytes.len(), "Decoding image");

    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        warn!(?format, error = %e, "Image decode failed");
        DecodeError::Malformed(e.to_string())
    })?;

    let rgba = img.to_rgba8();
    let buffer = PixelBuffer::try_from(rgba)?;
    debug!(
        width = buffer.width(),
        height = buffer.height(),
        "Image decoded"
    );
    Ok(buffer)
}

/// Identify a supported container from its signature.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    match image::guess_format(bytes) {
        Ok(format) if SUPPORTED_FORMATS.contains(&format) => Ok(format),
        Ok(format) => {
            debug!(?format, "Recognized but unsupported image format");
            Err(DecodeError::UnrecognizedFormat)
        }
        Err(_) => Err(DecodeError::UnrecognizedFormat),
    }
}
