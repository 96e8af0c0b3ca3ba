//! End-to-end transform: decode -> scale -> threshold -> shuffle -> encode.
//!
//! A [`SourceImage`] keeps the decoded upload untouched. Every render
//! resamples from it into a new buffer, so tweaking the effect parameters
//! repeatedly never compounds earlier distortion.

use rand::Rng;
use tracing::{debug, info};

use crate::config::{EffectConfig, PipelineSettings, QualityTier};
use crate::{ConfigError, PixelBuffer, Result, decode, encode, resize, shuffle, threshold};

/// Decoded original image, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    original: PixelBuffer,
}

impl SourceImage {
    /// Wrap an already-decoded buffer.
    pub fn from_buffer(original: PixelBuffer) -> Self {
        Self { original }
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }
}

/// Encoded output of both tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub preview: Vec<u8>,
    pub full: Vec<u8>,
}

/// Transform pipeline bound to a set of [`PipelineSettings`].
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: PipelineSettings,
}

impl Pipeline {
    /// Create a pipeline after validating `settings`.
    pub fn new(settings: PipelineSettings) -> std::result::Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Decode an upload once so it can be rendered many times.
    pub fn decode(&self, bytes: &[u8]) -> Result<SourceImage> {
        let original = decode::decode_with_limit(bytes, self.settings.max_input_bytes)?;
        Ok(SourceImage::from_buffer(original))
    }

    /// Render the pixels of one tier without encoding.
    pub fn render_buffer<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        config: &EffectConfig,
        tier: QualityTier,
        rng: &mut R,
    ) -> Result<PixelBuffer> {
        config.validate()?;

        let max_dim = self.settings.max_dimension(tier);
        debug!(
            ?tier,
            max_dim,
            apply_effect = config.apply_effect,
            band_count = config.band_count,
            direction = %config.direction,
            "Rendering image"
        );

        let scaled = resize::scale(&source.original, max_dim, self.settings.filter.into());
        let bilevel = threshold::threshold(scaled);

        if !config.apply_effect {
            return Ok(bilevel);
        }
        Ok(shuffle::shuffle(bilevel, config, rng)?)
    }

    /// Render and encode one tier.
    pub fn render<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        config: &EffectConfig,
        tier: QualityTier,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let pixels = self.render_buffer(source, config, tier, rng)?;
        encode::encode(&pixels, self.settings.quality(tier))
    }

    /// Render the full tier once and derive the preview from it.
    ///
    /// The preview is a downscale of the finished full image, so both show
    /// the same shuffle. Returns `(preview, full)`.
    pub fn render_both_buffers<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        config: &EffectConfig,
        rng: &mut R,
    ) -> Result<(PixelBuffer, PixelBuffer)> {
        let full = self.render_buffer(source, config, QualityTier::Full, rng)?;
        let preview = resize::scale(
            &full,
            self.settings.max_dimension(QualityTier::Preview),
            self.settings.filter.into(),
        );
        Ok((preview, full))
    }

    /// Encoded preview and full images showing the same shuffle.
    pub fn render_both<R: Rng + ?Sized>(
        &self,
        source: &SourceImage,
        config: &EffectConfig,
        rng: &mut R,
    ) -> Result<Rendered> {
        let (preview, full) = self.render_both_buffers(source, config, rng)?;
        let preview = encode::encode(&preview, self.settings.quality(QualityTier::Preview))?;
        let full = encode::encode(&full, self.settings.quality(QualityTier::Full))?;
        info!(
            preview_bytes = preview.len(),
            full_bytes = full.len(),
            "Rendered preview and full images"
        );
        Ok(Rendered { preview, full })
    }

    /// Decode, render and encode in one go.
    ///
    /// The effect config is checked before the input is decoded.
    pub fn transform<R: Rng + ?Sized>(
        &self,
        bytes: &[u8],
        config: &EffectConfig,
        tier: QualityTier,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        config.validate()?;
        let source = self.decode(bytes)?;
        self.render(&source, config, tier, rng)
    }
}

/// Transform `bytes` with default settings and a thread-local random source.
pub fn transform(bytes: &[u8], config: &EffectConfig, tier: QualityTier) -> Result<Vec<u8>> {
    Pipeline::default().transform(bytes, config, tier, &mut rand::thread_rng())
}
