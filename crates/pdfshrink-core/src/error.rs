use lopdf::ObjectId;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a whole compression run
#[derive(Error, Debug)]
pub enum ShrinkError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to serialize PDF: {0}")]
    SerializeError(String),

    #[error("Invalid quality: {0}")]
    InvalidQuality(String),

    #[error("Compression cancelled after {pages_completed} of {pages_total} pages")]
    Cancelled { pages_completed: u32, pages_total: u32 },
}

/// Pipeline stage a fatal error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Configure,
    Load,
    Process,
    Save,
}

impl ShrinkError {
    pub fn stage(&self) -> FailureStage {
        match self {
            ShrinkError::InvalidQuality(_) => FailureStage::Configure,
            ShrinkError::ParseError(_) => FailureStage::Load,
            ShrinkError::Cancelled { .. } => FailureStage::Process,
            ShrinkError::SerializeError(_) => FailureStage::Save,
        }
    }
}

/// Failures reported by an [`crate::codec::ImageCodec`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported image: {0}")]
    Unsupported(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),
}

/// Per-image failures. These are logged and counted, never propagated
/// past the recompression engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("object {0:?} does not resolve to an image stream")]
    Unresolvable(ObjectId),

    #[error("image {0:?} has an empty payload")]
    EmptyPayload(ObjectId),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
