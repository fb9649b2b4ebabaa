//! WASM bindings for in-browser PDF compression
//!
//! State lives in Rust (`CompressSession`); JavaScript only handles DOM
//! events, file reading and the download link.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { CompressSession } from './pkg/pdfshrink_wasm.js';
//!
//! await init();
//!
//! const session = new CompressSession();
//! session.setProgressCallback((done, total, msg) => updateUI(done, total, msg));
//! const info = session.addDocument(file.name, bytes);
//! session.setLevel("high");
//! const result = await session.execute();
//! downloadBlob(result, session.outputFileName());
//! const report = session.lastReport();
//! ```

pub mod scheduler;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

use std::sync::Once;

use pdfshrink_core::{process_command, CompressionLevel, ShrinkCommand};
use tracing_wasm::WASMLayerConfigBuilder;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub use scheduler::BrowserYield;
pub use session::CompressSession;
pub use validation::PdfInfo;

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    install_logging();
}

/// Route `tracing` events (skipped images, run summaries) to the browser
/// console
fn install_logging() {
    static LOGGING: Once = Once::new();
    LOGGING.call_once(|| {
        let config = WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build();
        tracing_wasm::set_as_global_default_with_config(config);
    });
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// PDF info (pages, images, metadata) without creating a session
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Normalize a level token, e.g. from a `<select>` value
#[wasm_bindgen]
pub fn parse_level(level: &str) -> Result<String, JsValue> {
    normalize_level(level).map_err(|e| JsValue::from_str(&e))
}

/// JSON bridge: takes a `ShrinkCommand` as JSON, resolves to a
/// `ProcessResult` as JSON
#[wasm_bindgen(js_name = processCommand)]
pub fn process_command_json(command: &str) -> Result<js_sys::Promise, JsValue> {
    let command: ShrinkCommand = serde_json::from_str(command)
        .map_err(|e| JsValue::from_str(&format!("Invalid command: {}", e)))?;

    Ok(future_to_promise(async move {
        let result = process_command(command, &mut BrowserYield, js_sys::Date::now).await;
        serde_json::to_string(&result)
            .map(|json| JsValue::from_str(&json))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

fn normalize_level(level: &str) -> Result<String, String> {
    level
        .parse::<CompressionLevel>()
        .map(|level| level.to_string())
        .map_err(|e| e.to_string())
}
