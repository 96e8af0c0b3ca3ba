//! Bilevel conversion: every pixel becomes pure black or pure white.

use tracing::debug;

use crate::{CHANNELS, PixelBuffer};

/// Channel average above which a pixel turns white.
const THRESHOLD: u32 = 128;

/// Threshold every pixel on its RGB channel average.
///
/// `(R + G + B) / 3 > 128` becomes white (255), anything else black (0).
/// Alpha passes through unchanged. The comparison is done on the channel
/// sum so no rounding is involved.
pub fn threshold(mut buffer: PixelBuffer) -> PixelBuffer {
    let (width, height) = buffer.dimensions();
    debug!(width, height, "Applying bilevel threshold");

    for px in buffer.pixels_mut().chunks_exact_mut(CHANNELS) {
        let bw = bilevel(px[0], px[1], px[2]);
        px[0] = bw;
        px[1] = bw;
        px[2] = bw;
    }

    buffer
}

/// Map one RGB triple to 0 or 255.
pub fn bilevel(r: u8, g: u8, b: u8) -> u8 {
    let sum = u32::from(r) + u32::from(g) + u32::from(b);
    if sum > THRESHOLD * 3 { 255 } else { 0 }
}
