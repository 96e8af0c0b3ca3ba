//! Fit-to-bounding-box scaling.
//!
//! Images are scaled so that their longer side equals the bounding
//! dimension while keeping the aspect ratio. Small inputs are upscaled too,
//! so the threshold and shuffle stages always work at a consistent
//! resolution.

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::PixelBuffer;

/// Target dimensions for a `width`x`height` image inside a
/// `max_dim`x`max_dim` box.
///
/// Equivalent to `floor(side * min(max_dim / width, max_dim / height))`
/// evaluated in exact integer arithmetic, each side clamped to at least 1.
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let longest = u64::from(width.max(height).max(1));
    let max_dim = u64::from(max_dim);

    let fit = |side: u32| -> u32 {
        let scaled = u64::from(side) * max_dim / longest;
        (scaled as u32).max(1)
    };

    (fit(width), fit(height))
}

/// Resample `buffer` to fit inside `max_dim`x`max_dim`.
///
/// Reads straight from the borrowed pixels; the buffer is only copied when
/// it already has the target dimensions.
pub fn scale(buffer: &PixelBuffer, max_dim: u32, filter: FilterType) -> PixelBuffer {
    let (orig_w, orig_h) = buffer.dimensions();
    let (new_width, new_height) = fit_dimensions(orig_w, orig_h, max_dim);

    if (new_width, new_height) == (orig_w, orig_h) {
        debug!(
            width = orig_w,
            height = orig_h,
            "Image already at target size, skipping resize"
        );
        return buffer.clone();
    }

    debug!(
        orig_w,
        orig_h,
        new_width,
        new_height,
        ?filter,
        "Resizing image to bounding box"
    );

    let resized = imageops::resize(&buffer.as_image(), new_width, new_height, filter);
    PixelBuffer::from_image(resized)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test buffer with given dimensions.
    fn create_test_buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, [128, 128, 128, 255]).unwrap()
    }

    #[test]
    fn test_fit_dimensions_downscale_landscape() {
        assert_eq!(fit_dimensions(1600, 1200, 800), (800, 600));
    }

    #[test]
    fn test_fit_dimensions_downscale_portrait() {
        assert_eq!(fit_dimensions(1080, 1920, 800), (450, 800));
    }

    #[test]
    fn test_fit_dimensions_upscale() {
        // Small inputs grow to the bounding box
        assert_eq!(fit_dimensions(200, 100, 800), (800, 400));
        assert_eq!(fit_dimensions(3, 3, 150), (150, 150));
    }

    #[test]
    fn test_fit_dimensions_floors() {
        // 1000 * (150 / 1001) = 149.85 -> 149
        assert_eq!(fit_dimensions(1000, 1001, 150), (149, 150));
        // 3 * (800 / 7) = 342.86 -> 342
        assert_eq!(fit_dimensions(3, 7, 800), (342, 800));
    }

    #[test]
    fn test_fit_dimensions_preserves_non_zero() {
        // Very wide, very short image
        assert_eq!(fit_dimensions(1000, 1, 10), (10, 1));
        // Very tall, very narrow image
        assert_eq!(fit_dimensions(1, 5000, 150), (1, 150));
    }

    #[test]
    fn test_scale_downscale() {
        let buf = create_test_buffer(800, 600);
        let result = scale(&buf, 400, FilterType::Triangle);
        assert_eq!(result.dimensions(), (400, 300));
        assert_eq!(result.pixels().len(), 400 * 300 * 4);
    }

    #[test]
    fn test_scale_upscale() {
        let buf = create_test_buffer(20, 10);
        let result = scale(&buf, 100, FilterType::Nearest);
        assert_eq!(result.dimensions(), (100, 50));
    }

    #[test]
    fn test_scale_same_size_is_untouched() {
        let mut buf = create_test_buffer(4, 4);
        buf.set_pixel(1, 2, [1, 2, 3, 4]);

        let result = scale(&buf, 4, FilterType::Lanczos3);
        assert_eq!(result, buf);
    }

    #[test]
    fn test_scale_leaves_source_untouched() {
        let mut buf = create_test_buffer(10, 6);
        buf.set_pixel(3, 3, [255, 0, 0, 255]);
        let before = buf.clone();

        let result = scale(&buf, 5, FilterType::Nearest);
        assert_eq!(result.dimensions(), (5, 3));
        assert_eq!(buf, before);
    }

    #[test]
    fn test_scale_nearest_upscale_replicates_pixels() {
        let mut buf = create_test_buffer(2, 1);
        buf.set_pixel(0, 0, [0, 0, 0, 255]);
        buf.set_pixel(1, 0, [255, 255, 255, 255]);

        let result = scale(&buf, 4, FilterType::Nearest);
        assert_eq!(result.dimensions(), (4, 2));
        assert_eq!(result.pixel(0, 1), [0, 0, 0, 255]);
        assert_eq!(result.pixel(3, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_scale_is_deterministic() {
        let mut buf = create_test_buffer(37, 23);
        for x in 0..37 {
            buf.set_pixel(x, x % 23, [x as u8 * 6, 0, 255, 200]);
        }

        let a = scale(&buf, 150, FilterType::Triangle);
        let b = scale(&buf, 150, FilterType::Triangle);
        assert_eq!(a, b);
    }
}
