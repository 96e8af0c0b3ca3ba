//! The "merzh" band shuffle.
//!
//! The image is cut into contiguous bands along one axis. Each band is then
//! circularly rotated along the perpendicular axis by its own offset:
//!
//! ```text
//! Horizontal (bands of rows, rotated along X)
//!
//!   band 0  | a b c d e f |  shift 2  ->  | c d e f a b |
//!   band 1  | g h i j k l |  shift 5  ->  | l g h i j k |
//! ```
//!
//! All reads go through a [`Snapshot`] of the input while writes land in a
//! separate output buffer. Reading from the buffer being written would let a
//! band pick up pixels that were already moved earlier in the same pass.

use rand::Rng;
use tracing::{debug, trace};

use crate::{CHANNELS, ConfigError, Direction, EffectConfig, PixelBuffer, Snapshot};

/// One contiguous band along the band axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub index: usize,
    /// First row (horizontal) or column (vertical) of the band.
    pub start: u32,
    /// Thickness in pixels. Only the last band may be thinner than the rest.
    pub len: u32,
}

/// Iterator over the bands of one axis. See [`bands`].
#[derive(Debug, Clone)]
pub struct Bands {
    axis_len: u32,
    band_size: u32,
    next_start: u32,
    index: usize,
}

impl Iterator for Bands {
    type Item = Band;

    fn next(&mut self) -> Option<Band> {
        if self.next_start >= self.axis_len {
            return None;
        }
        let start = self.next_start;
        let len = self.band_size.min(self.axis_len - start);
        let band = Band {
            index: self.index,
            start,
            len,
        };
        self.next_start += len;
        self.index += 1;
        Some(band)
    }
}

/// Partition `axis_len` pixels into bands of `max(1, axis_len / band_count)`.
///
/// When the division leaves a remainder the leftover pixels form one extra,
/// thinner band at the end, so the number of bands yielded can exceed
/// `band_count`.
pub fn bands(axis_len: u32, band_count: u32) -> Bands {
    Bands {
        axis_len,
        band_size: (axis_len / band_count.max(1)).max(1),
        next_start: 0,
        index: 0,
    }
}

/// Band geometry for one buffer and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLayout {
    pub direction: Direction,
    /// Length of the axis the bands are laid out along.
    pub axis_len: u32,
    /// Length of the axis each band is rotated along.
    pub shift_len: u32,
    pub band_size: u32,
}

impl BandLayout {
    pub fn new(
        width: u32,
        height: u32,
        direction: Direction,
        band_count: u32,
    ) -> Result<Self, ConfigError> {
        if band_count == 0 {
            return Err(ConfigError::ZeroBandCount);
        }
        let (axis_len, shift_len) = match direction {
            Direction::Horizontal => (height, width),
            Direction::Vertical => (width, height),
        };
        Ok(Self {
            direction,
            axis_len,
            shift_len,
            band_size: (axis_len / band_count).max(1),
        })
    }

    pub fn for_buffer(buffer: &PixelBuffer, config: &EffectConfig) -> Result<Self, ConfigError> {
        Self::new(
            buffer.width(),
            buffer.height(),
            config.direction,
            config.band_count,
        )
    }

    pub fn bands(&self) -> Bands {
        Bands {
            axis_len: self.axis_len,
            band_size: self.band_size,
            next_start: 0,
            index: 0,
        }
    }

    /// Number of bands, including a trailing remainder band.
    pub fn len(&self) -> usize {
        self.axis_len.div_ceil(self.band_size) as usize
    }

    /// Always false for a layout built from a [`PixelBuffer`], whose
    /// dimensions are never zero.
    pub fn is_empty(&self) -> bool {
        self.axis_len == 0
    }

    /// Draw one uniform offset in `0..shift_len` per band.
    pub fn random_offsets<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<u32> {
        (0..self.len())
            .map(|_| rng.gen_range(0..self.shift_len.max(1)))
            .collect()
    }
}

/// Shuffle bands by independent random offsets drawn from `rng`.
///
/// Runs regardless of `config.apply_effect`; gating is the caller's job.
pub fn shuffle<R: Rng + ?Sized>(
    buffer: PixelBuffer,
    config: &EffectConfig,
    rng: &mut R,
) -> Result<PixelBuffer, ConfigError> {
    let layout = BandLayout::for_buffer(&buffer, config)?;
    let offsets = layout.random_offsets(rng);
    Ok(apply(buffer, &layout, &offsets))
}

/// Shuffle bands by caller-chosen offsets, one per band.
///
/// Offsets are reduced modulo the length of the rotation axis. The number of
/// offsets must equal [`BandLayout::len`].
pub fn shuffle_with_offsets(
    buffer: PixelBuffer,
    direction: Direction,
    band_count: u32,
    offsets: &[u32],
) -> Result<PixelBuffer, ConfigError> {
    let layout = BandLayout::new(buffer.width(), buffer.height(), direction, band_count)?;
    if offsets.len() != layout.len() {
        return Err(ConfigError::OffsetCount {
            expected: layout.len(),
            actual: offsets.len(),
        });
    }
    Ok(apply(buffer, &layout, offsets))
}

fn apply(buffer: PixelBuffer, layout: &BandLayout, offsets: &[u32]) -> PixelBuffer {
    debug!(
        direction = %layout.direction,
        axis_len = layout.axis_len,
        band_size = layout.band_size,
        bands = layout.len(),
        "Applying band shuffle"
    );

    let mut output = buffer.clone();
    let snapshot = buffer.snapshot();
    let stride = output.stride();
    let out = output.pixels_mut();

    for (band, &offset) in layout.bands().zip(offsets) {
        let shift = offset % layout.shift_len;
        trace!(band = band.index, start = band.start, len = band.len, shift, "Rotating band");
        match layout.direction {
            Direction::Horizontal => rotate_rows(snapshot, out, stride, band, shift),
            Direction::Vertical => rotate_columns(snapshot, out, stride, band, shift),
        }
    }

    output
}

/// `out[y][x] = snapshot[y][(x + shift) % width]` for every row of the band.
fn rotate_rows(snapshot: Snapshot<'_>, out: &mut [u8], stride: usize, band: Band, shift: u32) {
    let split = shift as usize * CHANNELS;
    for y in band.start..band.start + band.len {
        let src = snapshot.row(y);
        let row_start = y as usize * stride;
        let dst = &mut out[row_start..row_start + stride];
        dst[..stride - split].copy_from_slice(&src[split..]);
        dst[stride - split..].copy_from_slice(&src[..split]);
    }
}

/// `out[y][x] = snapshot[(y + shift) % height][x]` for every column of the band.
fn rotate_columns(snapshot: Snapshot<'_>, out: &mut [u8], stride: usize, band: Band, shift: u32) {
    let height = snapshot.height();
    let span_start = band.start as usize * CHANNELS;
    let span_len = band.len as usize * CHANNELS;
    for y in 0..height {
        let src = snapshot.row_span((y + shift) % height, band.start, band.len);
        let dst_start = y as usize * stride + span_start;
        out[dst_start..dst_start + span_len].copy_from_slice(src);
    }
}
