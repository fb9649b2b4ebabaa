//! Compression levels and the quality factor they resolve to
//!
//! The level names describe how hard the document is squeezed, so a
//! *higher* compression level maps to a *lower* encoder quality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShrinkError;

/// User-facing compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
    ];

    /// Quality factor handed to the image encoder for this level
    pub fn quality(self) -> QualityFactor {
        match self {
            CompressionLevel::Low => QualityFactor(0.9),
            CompressionLevel::Medium => QualityFactor(0.6),
            CompressionLevel::High => QualityFactor(0.3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = ShrinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(ShrinkError::InvalidQuality(format!(
                "unknown compression level '{}' (expected low, medium or high)",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder quality in the half-open range (0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct QualityFactor(f32);

impl QualityFactor {
    pub fn new(value: f32) -> Result<Self, ShrinkError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ShrinkError::InvalidQuality(format!(
                "quality factor {} is outside (0, 1]",
                value
            )))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Integer quality on the 1..=100 scale used by JPEG encoders
    pub fn encoder_quality(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for QualityFactor {
    fn default() -> Self {
        CompressionLevel::default().quality()
    }
}

impl TryFrom<f32> for QualityFactor {
    type Error = ShrinkError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QualityFactor> for f32 {
    fn from(quality: QualityFactor) -> Self {
        quality.0
    }
}

impl From<CompressionLevel> for QualityFactor {
    fn from(level: CompressionLevel) -> Self {
        level.quality()
    }
}
