//! Effect parameters and pipeline settings.
//!
//! [`EffectConfig`] is what the user tweaks per render (toggle, band count,
//! direction). [`PipelineSettings`] holds the deployment-level constants for
//! the two quality tiers and the decoder guard; callers never tune those per
//! request.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ConfigError, FULL_MAX_DIMENSION, FULL_QUALITY, MAX_INPUT_BYTES, PREVIEW_MAX_DIMENSION,
    PREVIEW_QUALITY,
};

/// Default number of bands when the effect is first enabled.
const DEFAULT_BAND_COUNT: u32 = 8;

/// Largest accepted bounding box for either tier.
const MAX_BOUNDING_DIMENSION: u32 = 8192;

/// Axis along which bands are laid out.
///
/// - `Horizontal`: bands are groups of rows, each rotated along X.
/// - `Vertical`: bands are groups of columns, each rotated along Y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(ConfigError::UnknownDirection(other.to_string())),
        }
    }
}

/// Per-render effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectConfig {
    /// Run the band shuffle after thresholding.
    pub apply_effect: bool,

    /// Number of bands the band axis is divided into (at least 1).
    pub band_count: u32,

    /// Band orientation.
    pub direction: Direction,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            apply_effect: false,
            band_count: DEFAULT_BAND_COUNT,
            direction: Direction::Horizontal,
        }
    }
}

impl EffectConfig {
    /// Create a config with defaults (effect disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: toggle the band shuffle.
    pub fn with_effect(mut self, val: bool) -> Self {
        self.apply_effect = val;
        self
    }

    /// Builder: set band count.
    pub fn with_band_count(mut self, val: u32) -> Self {
        self.band_count = val;
        self
    }

    /// Builder: set direction.
    pub fn with_direction(mut self, val: Direction) -> Self {
        self.direction = val;
        self
    }

    /// Check the parameters before any pixel work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band_count == 0 {
            return Err(ConfigError::ZeroBandCount);
        }
        Ok(())
    }

    /// Pixel thickness of a band for an axis of `axis_len` pixels.
    ///
    /// The final band of an image may be thinner when the division leaves a
    /// remainder.
    pub fn band_size_for(&self, axis_len: u32) -> u32 {
        (axis_len / self.band_count.max(1)).max(1)
    }
}

/// One of the two fixed output tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Small, lower quality thumbnail.
    Preview,
    /// Full-size rendering attached to a message.
    Full,
}

/// Resampling filter used by the scaler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl From<ScaleFilter> for FilterType {
    fn from(filter: ScaleFilter) -> Self {
        match filter {
            ScaleFilter::Nearest => FilterType::Nearest,
            ScaleFilter::Triangle => FilterType::Triangle,
            ScaleFilter::CatmullRom => FilterType::CatmullRom,
            ScaleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ScaleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" => Ok(Self::Triangle),
            "catmullrom" => Ok(Self::CatmullRom),
            "lanczos3" => Ok(Self::Lanczos3),
            _ => Err("must be one of nearest, triangle, catmullrom, lanczos3".into()),
        }
    }
}

/// Deployment-level pipeline constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub preview_max_dimension: u32,
    pub full_max_dimension: u32,
    pub preview_quality: u8,
    pub full_quality: u8,
    pub max_input_bytes: usize,
    pub filter: ScaleFilter,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            preview_max_dimension: PREVIEW_MAX_DIMENSION,
            full_max_dimension: FULL_MAX_DIMENSION,
            preview_quality: PREVIEW_QUALITY,
            full_quality: FULL_QUALITY,
            max_input_bytes: MAX_INPUT_BYTES,
            filter: ScaleFilter::default(),
        }
    }
}

impl PipelineSettings {
    /// Bounding box for the given tier.
    pub fn max_dimension(&self, tier: QualityTier) -> u32 {
        match tier {
            QualityTier::Preview => self.preview_max_dimension,
            QualityTier::Full => self.full_max_dimension,
        }
    }

    /// JPEG quality for the given tier.
    pub fn quality(&self, tier: QualityTier) -> u8 {
        match tier {
            QualityTier::Preview => self.preview_quality,
            QualityTier::Full => self.full_quality,
        }
    }

    /// Defaults with `MERZH_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides taken from `lookup`, then validated.
    ///
    /// Recognised keys: `MERZH_PREVIEW_MAX_DIMENSION`,
    /// `MERZH_FULL_MAX_DIMENSION`, `MERZH_PREVIEW_QUALITY`,
    /// `MERZH_FULL_QUALITY`, `MERZH_MAX_INPUT_BYTES`, `MERZH_SCALE_FILTER`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(v) = lookup("MERZH_PREVIEW_MAX_DIMENSION") {
            settings.preview_max_dimension = parse_setting("MERZH_PREVIEW_MAX_DIMENSION", &v)?;
        }
        if let Some(v) = lookup("MERZH_FULL_MAX_DIMENSION") {
            settings.full_max_dimension = parse_setting("MERZH_FULL_MAX_DIMENSION", &v)?;
        }
        if let Some(v) = lookup("MERZH_PREVIEW_QUALITY") {
            settings.preview_quality = parse_setting("MERZH_PREVIEW_QUALITY", &v)?;
        }
        if let Some(v) = lookup("MERZH_FULL_QUALITY") {
            settings.full_quality = parse_setting("MERZH_FULL_QUALITY", &v)?;
        }
        if let Some(v) = lookup("MERZH_MAX_INPUT_BYTES") {
            settings.max_input_bytes = parse_setting("MERZH_MAX_INPUT_BYTES", &v)?;
        }
        if let Some(v) = lookup("MERZH_SCALE_FILTER") {
            settings.filter = v
                .parse()
                .map_err(|reason| ConfigError::InvalidSetting {
                    key: "MERZH_SCALE_FILTER",
                    reason,
                })?;
        }

        settings.validate()?;
        debug!(?settings, "Loaded pipeline settings");
        Ok(settings)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_range(
            "preview_max_dimension",
            self.preview_max_dimension,
            1,
            MAX_BOUNDING_DIMENSION,
        )?;
        validate_range(
            "full_max_dimension",
            self.full_max_dimension,
            1,
            MAX_BOUNDING_DIMENSION,
        )?;
        validate_range("preview_quality", self.preview_quality, 1, 100)?;
        validate_range("full_quality", self.full_quality, 1, 100)?;
        if self.max_input_bytes == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_input_bytes",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn parse_setting<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSetting {
            key,
            reason: format!("'{value}' is not a valid non-negative integer"),
        })
}

fn validate_range<T>(key: &'static str, value: T, min: T, max: T) -> Result<(), ConfigError>
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::InvalidSetting {
            key,
            reason: format!("must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_direction_parses_case_insensitive() {
        assert_eq!("horizontal".parse::<Direction>(), Ok(Direction::Horizontal));
        assert_eq!(" Vertical ".parse::<Direction>(), Ok(Direction::Vertical));
        assert_eq!(
            "diagonal".parse::<Direction>(),
            Err(ConfigError::UnknownDirection("diagonal".into()))
        );
    }

    #[test]
    fn test_direction_serde_lowercase() {
        let json = serde_json::to_string(&Direction::Vertical).unwrap();
        assert_eq!(json, "\"vertical\"");
        let back: Direction = serde_json::from_str("\"horizontal\"").unwrap();
        assert_eq!(back, Direction::Horizontal);
    }

    #[test]
    fn test_effect_config_deserializes_with_defaults() {
        let cfg: EffectConfig =
            serde_json::from_str(r#"{"applyEffect":true,"direction":"vertical"}"#).unwrap();
        assert!(cfg.apply_effect);
        assert_eq!(cfg.band_count, DEFAULT_BAND_COUNT);
        assert_eq!(cfg.direction, Direction::Vertical);
    }

    #[test]
    fn test_effect_config_rejects_zero_bands() {
        let cfg = EffectConfig::new().with_effect(true).with_band_count(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBandCount));
        assert!(EffectConfig::new().with_band_count(1).validate().is_ok());
    }

    #[test]
    fn test_band_size_for() {
        let cfg = EffectConfig::new().with_band_count(4);
        assert_eq!(cfg.band_size_for(800), 200);
        assert_eq!(cfg.band_size_for(10), 2);
        // More bands than pixels clamps to one pixel per band
        assert_eq!(cfg.band_size_for(3), 1);
    }

    #[test]
    fn test_settings_tiers() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.max_dimension(QualityTier::Preview), 150);
        assert_eq!(settings.max_dimension(QualityTier::Full), 800);
        assert_eq!(settings.quality(QualityTier::Preview), 80);
        assert_eq!(settings.quality(QualityTier::Full), 85);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_from_lookup_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MERZH_FULL_MAX_DIMENSION", "1200"),
            ("MERZH_PREVIEW_QUALITY", "70"),
            ("MERZH_SCALE_FILTER", "nearest"),
        ]);
        let settings =
            PipelineSettings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.full_max_dimension, 1200);
        assert_eq!(settings.preview_quality, 70);
        assert_eq!(settings.filter, ScaleFilter::Nearest);
        assert_eq!(settings.preview_max_dimension, PREVIEW_MAX_DIMENSION);
    }

    #[test]
    fn test_settings_from_lookup_rejects_bad_values() {
        let err = PipelineSettings::from_lookup(|k| {
            (k == "MERZH_FULL_QUALITY").then(|| "101".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                key: "full_quality",
                ..
            }
        ));

        let err = PipelineSettings::from_lookup(|k| {
            (k == "MERZH_PREVIEW_MAX_DIMENSION").then(|| "abc".to_string())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                key: "MERZH_PREVIEW_MAX_DIMENSION",
                ..
            }
        ));
    }
}
