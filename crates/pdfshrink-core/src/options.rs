//! Run configuration for the recompression engine

use serde::{Deserialize, Serialize};

use crate::quality::{CompressionLevel, QualityFactor};

/// When a freshly encoded payload replaces the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Always substitute the re-encoded bytes
    #[default]
    Always,
    /// Keep the stored bytes unless the re-encoded ones are strictly smaller
    OnlyIfSmaller,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    pub quality: QualityFactor,
    pub replace: ReplacePolicy,
    /// Also yield after every image, not only after every page
    pub yield_every_image: bool,
}

impl CompressOptions {
    pub fn for_level(level: CompressionLevel) -> Self {
        Self {
            quality: level.quality(),
            ..Self::default()
        }
    }

    pub fn with_replace(mut self, replace: ReplacePolicy) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_yield_every_image(mut self, yield_every_image: bool) -> Self {
        self.yield_every_image = yield_every_image;
        self
    }
}
