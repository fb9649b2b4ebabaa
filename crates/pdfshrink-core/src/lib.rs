//! Client-side PDF size reduction by re-encoding embedded images
//!
//! This crate loads a PDF with lopdf, walks its pages in order, re-encodes
//! every raster image it can decode as a JPEG at the chosen quality, and
//! serializes the result. Nothing here touches the browser; the wasm app
//! supplies the yield point and the progress sink.
//!
//! - `pipeline::run` / `Pipeline`: load, recompress, save
//! - `recompress::recompress`: the per-page engine, usable on an already
//!   loaded `PdfDocument`
//! - `command::process_command`: JSON-friendly request/response wrapper

pub mod codec;
pub mod command;
pub mod document;
pub mod error;
pub mod flate;
pub mod locate;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod quality;
pub mod recompress;

#[cfg(test)]
mod fixtures;

pub use codec::{ImageCodec, JpegCodec, PixelBuffer, PixelColor};
pub use command::{process_command, ProcessMetrics, ProcessResult, ShrinkCommand};
pub use document::{ObjectKind, ObjectRef, Page, PdfDocument};
pub use error::{CodecError, FailureStage, ImageError, ShrinkError};
pub use locate::locate_images;
pub use options::{CompressOptions, ReplacePolicy};
pub use pipeline::{run, Pipeline, RunOutput};
pub use progress::{CancelToken, CompressionReport, PageProgress, ProgressState};
pub use quality::{CompressionLevel, QualityFactor};
pub use recompress::{recompress, NoYield, YieldFn, YieldPoint};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, ShrinkError> {
    Ok(PdfDocument::load(bytes)?.page_count())
}

/// Download name for a compressed copy: `scan.PDF` becomes
/// `scan_compressed.pdf`
pub fn compressed_file_name(original: &str) -> String {
    let name = original.trim();
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    };
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{}_compressed.pdf", stem)
}
