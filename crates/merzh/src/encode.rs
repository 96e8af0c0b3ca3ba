//! Pixel buffer -> JPEG bytes.

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::{CHANNELS, MerzhError, PixelBuffer, Result};

/// Encode `buffer` as a baseline JPEG at `quality` (clamped to 1..=100).
///
/// JPEG carries no alpha, so every pixel is composited over black first,
/// the way a browser canvas flattens transparency when exporting JPEG.
pub fn encode(buffer: &PixelBuffer, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    let quality = quality.clamp(1, 100);
    debug!(width, height, quality, "Encoding JPEG");

    let rgb = flatten_alpha(buffer.pixels());

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| MerzhError::Encode(format!("failed to encode JPEG: {e}")))?;

    debug!(size = bytes.len(), "JPEG encoded");
    Ok(bytes)
}

/// Drop the alpha channel, premultiplying it into the color channels.
fn flatten_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / CHANNELS * 3);
    for px in rgba.chunks_exact(CHANNELS) {
        let a = u16::from(px[3]);
        for &c in &px[..3] {
            rgb.push(((u16::from(c) * a + 127) / 255) as u8);
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_jpeg_signature() {
        let buf = PixelBuffer::filled(16, 8, [255, 255, 255, 255]).unwrap();
        let bytes = encode(&buf, 85).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_round_trip_dimensions() {
        let buf = PixelBuffer::filled(33, 17, [0, 0, 0, 255]).unwrap();
        let bytes = encode(&buf, 80).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 17));
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        // Noisy bilevel content so quality actually matters
        let mut buf = PixelBuffer::filled(64, 64, [0, 0, 0, 255]).unwrap();
        for y in 0..64 {
            for x in 0..64 {
                if (x * 7 + y * 13) % 5 < 2 {
                    buf.set_pixel(x, y, [255, 255, 255, 255]);
                }
            }
        }
        let low = encode(&buf, 20).unwrap();
        let high = encode(&buf, 95).unwrap();
        assert!(low.len() < high.len(), "{} >= {}", low.len(), high.len());
    }

    #[test]
    fn test_out_of_range_quality_is_clamped() {
        let buf = PixelBuffer::filled(2, 2, [255, 255, 255, 255]).unwrap();
        assert!(encode(&buf, 0).is_ok());
        assert!(encode(&buf, 255).is_ok());
    }

    #[test]
    fn test_flatten_alpha() {
        let rgba = [255, 255, 255, 255, 255, 255, 255, 0, 200, 100, 0, 128];
        assert_eq!(flatten_alpha(&rgba), vec![255, 255, 255, 0, 0, 0, 100, 50, 0]);
    }
}
