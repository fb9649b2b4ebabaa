//! PDF validation and info extraction
//!
//! Runs before a document is accepted into a session so the UI can show
//! page and image counts up front.

use std::collections::HashSet;

use lopdf::{Dictionary, Document};
use pdfshrink_core::{locate_images, PdfDocument};
use serde::Serialize;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// Whether the document is encrypted
    pub encrypted: bool,
    /// File size in bytes
    pub size_bytes: usize,
    /// Distinct image objects reachable from page resources
    pub image_count: u32,
    /// Whether the document appears valid
    pub valid: bool,
    /// Document title from metadata (if available)
    pub title: Option<String>,
    /// Document author from metadata (if available)
    pub author: Option<String>,
}

/// Parse a PDF and collect what the UI shows before compressing
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    check_header(bytes)?;

    let doc = PdfDocument::load(bytes).map_err(|e| e.to_string())?;
    let pages = doc.pages();
    if pages.is_empty() {
        return Err("PDF has no pages".to_string());
    }

    let images: HashSet<_> = pages
        .iter()
        .flat_map(|page| locate_images(&doc, *page))
        .collect();

    let inner = doc.inner();
    let info = info_dictionary(inner);

    Ok(PdfInfo {
        page_count: pages.len() as u32,
        version: extract_version(bytes),
        encrypted: inner.is_encrypted(),
        size_bytes: bytes.len(),
        image_count: images.len() as u32,
        valid: true,
        title: info.and_then(|dict| info_string(dict, b"Title")),
        author: info.and_then(|dict| info_string(dict, b"Author")),
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    check_header(bytes)?;

    // %%EOF should sit within the last kilobyte
    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err("PDF appears truncated (missing %%EOF marker)".to_string());
    }

    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }
    Ok(())
}

fn extract_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    document.get_dictionary(id).ok()
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let value = String::from_utf8_lossy(bytes).into_owned();
    (!value.is_empty()).then_some(value)
}
