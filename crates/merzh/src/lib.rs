//! Bilevel image transform with the optional "merzh" band-shuffle glitch.
//!
//! Pipeline: decode -> scale -> threshold -> (band shuffle) -> JPEG encode.
//! Every stage is a pure function over an owned [`PixelBuffer`]; the only
//! source of non-determinism is the injected random generator used by the
//! band shuffle.

pub mod buffer;
pub mod config;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod resize;
pub mod sequence;
pub mod shuffle;
pub mod threshold;

// Re-exports for convenience
pub use buffer::{PixelBuffer, Snapshot};
pub use config::{Direction, EffectConfig, PipelineSettings, QualityTier, ScaleFilter};
pub use decode::{decode, decode_with_limit};
pub use encode::encode;
pub use pipeline::{Pipeline, Rendered, SourceImage, transform};
pub use resize::{fit_dimensions, scale};
pub use sequence::{RenderSequence, RenderTicket};
pub use shuffle::{Band, BandLayout, bands, shuffle, shuffle_with_offsets};
pub use threshold::threshold;

/// Bounding box of the small preview rendering, in pixels.
pub const PREVIEW_MAX_DIMENSION: u32 = 150;

/// Bounding box of the full rendering, in pixels.
pub const FULL_MAX_DIMENSION: u32 = 800;

/// JPEG quality of the preview rendering.
pub const PREVIEW_QUALITY: u8 = 80;

/// JPEG quality of the full rendering.
pub const FULL_QUALITY: u8 = 85;

/// Largest encoded input accepted by the decoder (5 MiB).
pub const MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Bytes per pixel in a [`PixelBuffer`] (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Errors that can occur while transforming an image.
#[derive(Debug, thiserror::Error)]
pub enum MerzhError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("encode error: {0}")]
    Encode(String),
}

/// Reasons an input could not be turned into a [`PixelBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("input is empty")]
    Empty,

    #[error("unrecognized image format signature")]
    UnrecognizedFormat,

    #[error("input is {actual} bytes, limit is {limit}")]
    TooLarge { limit: usize, actual: usize },

    #[error("malformed image data: {0}")]
    Malformed(String),

    #[error("pixel buffer length {actual} does not match expected {expected}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("image has zero dimension: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
}

/// Invalid effect parameters or pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("band count must be at least 1")]
    ZeroBandCount,

    #[error("unknown direction '{0}' (expected 'horizontal' or 'vertical')")]
    UnknownDirection(String),

    #[error("expected {expected} band offsets, got {actual}")]
    OffsetCount { expected: usize, actual: usize },

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// Result type alias for merzh operations.
pub type Result<T> = std::result::Result<T, MerzhError>;
