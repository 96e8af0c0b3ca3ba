//! Raw RGBA pixel storage shared by every pipeline stage.

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::{CHANNELS, DecodeError};

/// Row-major RGBA8 pixel buffer.
///
/// Invariants: `width > 0`, `height > 0` and
/// `pixels.len() == width * height * 4`. They are checked on construction
/// and cannot be broken afterwards since the fields are private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, validating the dimension invariants.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(DecodeError::InvalidBuffer {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A buffer filled with a single RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, DecodeError> {
        let count = width as usize * height as usize;
        Self::new(width, height, rgba.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// The RGBA value at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Overwrite the RGBA value at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinate is outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Immutable view of the current contents.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }

    /// Borrow the pixels as an `image` buffer without copying.
    pub fn as_image(&self) -> ImageBuffer<Rgba<u8>, &[u8]> {
        ImageBuffer::from_raw(self.width, self.height, self.pixels.as_slice())
            .expect("PixelBuffer length always equals width * height * 4")
    }

    /// Adopt an image produced from a valid buffer (e.g. a resample with
    /// non-zero target dimensions).
    pub(crate) fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        debug_assert!(width > 0 && height > 0);
        let pixels = img.into_raw();
        debug_assert_eq!(pixels.len(), width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            pixels,
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        RgbaImage::from_raw(buffer.width, buffer.height, buffer.pixels)
            .expect("PixelBuffer length always equals width * height * 4")
    }
}

impl TryFrom<RgbaImage> for PixelBuffer {
    type Error = DecodeError;

    fn try_from(img: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}

/// Read-only view of a pixel buffer taken before mutation.
///
/// The band shuffle reads exclusively from a snapshot while writing into a
/// separate output buffer, so source and destination never alias.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
}

impl<'a> Snapshot<'a> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Full row `y` as raw bytes.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let stride = self.width as usize * CHANNELS;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Pixels `x_start..x_start + len` of row `y` as raw bytes.
    pub fn row_span(&self, y: u32, x_start: u32, len: u32) -> &'a [u8] {
        let row = self.row(y);
        let start = x_start as usize * CHANNELS;
        &row[start..start + len as usize * CHANNELS]
    }
}
