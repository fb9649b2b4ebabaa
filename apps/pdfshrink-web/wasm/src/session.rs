//! Stateful compression session
//!
//! Holds the selected document, level and progress callback in Rust so the
//! page script only wires DOM events to method calls.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pdfshrink_core::{
    compressed_file_name, CancelToken, CompressOptions, CompressionLevel, CompressionReport,
    Pipeline, ReplacePolicy, ShrinkError, YieldPoint,
};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::scheduler::BrowserYield;
use crate::validation::{validate_pdf, PdfInfo};

type ProgressSink = Box<dyn FnMut(u32, u32, &str)>;

struct LoadedDocument {
    name: String,
    bytes: Vec<u8>,
    info: PdfInfo,
}

/// One document, one level, one run at a time
#[wasm_bindgen]
pub struct CompressSession {
    document: Option<LoadedDocument>,
    level: CompressionLevel,
    replace: ReplacePolicy,
    progress_callback: Option<js_sys::Function>,
    cancel: CancelToken,
    running: Rc<Cell<bool>>,
    last_report: Rc<RefCell<Option<CompressionReport>>>,
}

impl Default for CompressSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl CompressSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            document: None,
            level: CompressionLevel::default(),
            replace: ReplacePolicy::default(),
            progress_callback: None,
            cancel: CancelToken::new(),
            running: Rc::new(Cell::new(false)),
            last_report: Rc::new(RefCell::new(None)),
        }
    }

    /// Callback signature: (pagesCompleted: number, pagesTotal: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Validate and hold a document; returns its info
    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self
            .add_document_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))?;

        serde_wasm_bindgen::to_value(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = removeDocument)]
    pub fn remove_document(&mut self) -> Result<(), JsValue> {
        self.remove_document_internal()
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = hasDocument)]
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Accepts "low", "medium" or "high"
    #[wasm_bindgen(js_name = setLevel)]
    pub fn set_level(&mut self, level: &str) -> Result<(), JsValue> {
        self.set_level_internal(level)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter)]
    pub fn level(&self) -> String {
        self.level.to_string()
    }

    /// Keep an image's original bytes unless re-encoding makes it smaller
    #[wasm_bindgen(js_name = setOnlyIfSmaller)]
    pub fn set_only_if_smaller(&mut self, enabled: bool) {
        self.replace = if enabled {
            ReplacePolicy::OnlyIfSmaller
        } else {
            ReplacePolicy::Always
        };
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        self.document.is_some() && !self.running.get()
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Stop the current run at its next page boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Download name for the result, e.g. `scan_compressed.pdf`
    #[wasm_bindgen(js_name = outputFileName)]
    pub fn output_file_name(&self) -> Option<String> {
        self.document.as_ref().map(|d| compressed_file_name(&d.name))
    }

    /// Report of the last successful run, or null
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> Result<JsValue, JsValue> {
        match self.last_report.borrow().as_ref() {
            Some(report) => serde_wasm_bindgen::to_value(report)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    /// Compress the held document; the promise resolves to a Uint8Array
    pub fn execute(&mut self) -> Result<js_sys::Promise, JsValue> {
        let job = self
            .prepare_job()
            .map_err(|e| JsValue::from_str(&e))?;
        let callback = self.progress_callback.clone();
        let sink: ProgressSink = Box::new(move |completed, total, message| {
            report_progress(callback.as_ref(), completed, total, message)
        });

        Ok(future_to_promise(async move {
            match job.run(&mut BrowserYield, sink).await {
                Ok(bytes) => {
                    let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
                    array.copy_from(&bytes);
                    Ok(array.into())
                }
                Err(e) => {
                    web_sys::console::error_1(&JsValue::from_str(&format!(
                        "Compression failed at {:?} stage: {}",
                        e.stage(),
                        e
                    )));
                    Err(JsValue::from_str(&format!("Compression failed: {}", e)))
                }
            }
        }))
    }
}

impl CompressSession {
    fn add_document_internal(&mut self, name: &str, bytes: &[u8]) -> Result<PdfInfo, String> {
        if self.running.get() {
            return Err("Cannot change the document while compressing".to_string());
        }
        if self.document.is_some() {
            return Err(
                "Only one document at a time. Remove the current document first.".to_string(),
            );
        }

        let info = validate_pdf(bytes)?;
        debug!(
            file = name,
            pages = info.page_count,
            images = info.image_count,
            "document accepted"
        );
        self.document = Some(LoadedDocument {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            info: info.clone(),
        });
        self.last_report.replace(None);

        Ok(info)
    }

    fn remove_document_internal(&mut self) -> Result<(), String> {
        if self.running.get() {
            return Err("Cannot change the document while compressing".to_string());
        }
        if self.document.take().is_none() {
            return Err("No document loaded".to_string());
        }
        self.last_report.replace(None);
        Ok(())
    }

    fn set_level_internal(&mut self, level: &str) -> Result<(), String> {
        self.level = level.parse().map_err(|e: ShrinkError| e.to_string())?;
        Ok(())
    }

    fn prepare_job(&mut self) -> Result<CompressJob, String> {
        if !self.can_execute() {
            return Err("Session not ready for execution".to_string());
        }
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| "No document loaded".to_string())?;

        // A cancel from an earlier run must not leak into this one
        self.cancel = CancelToken::new();
        self.running.set(true);

        Ok(CompressJob {
            bytes: document.bytes.clone(),
            pages_total: document.info.page_count,
            options: CompressOptions::for_level(self.level).with_replace(self.replace),
            cancel: self.cancel.clone(),
            running: self.running.clone(),
            last_report: self.last_report.clone(),
        })
    }
}

/// Everything a run needs, detached from the session so it can outlive
/// the `execute` call
struct CompressJob {
    bytes: Vec<u8>,
    pages_total: u32,
    options: CompressOptions,
    cancel: CancelToken,
    running: Rc<Cell<bool>>,
    last_report: Rc<RefCell<Option<CompressionReport>>>,
}

impl CompressJob {
    async fn run<Y: YieldPoint>(self, yielder: &mut Y, sink: ProgressSink) -> Result<Vec<u8>, ShrinkError> {
        self.last_report.replace(None);

        let sink = Rc::new(RefCell::new(sink));
        (*sink.borrow_mut())(0, self.pages_total, "Starting...");

        let page_sink = sink.clone();
        let mut pipeline = Pipeline::new(self.options)
            .with_cancel_token(self.cancel)
            .on_progress(move |progress| {
                let message = format!(
                    "Compressed page {} of {}",
                    progress.pages_completed, progress.pages_total
                );
                (*page_sink.borrow_mut())(progress.pages_completed, progress.pages_total, &message);
            });
        let result = pipeline.run(&self.bytes, yielder).await;
        self.running.set(false);

        let output = result?;
        (*sink.borrow_mut())(output.report.pages_total, output.report.pages_total, "Complete");
        self.last_report.replace(Some(output.report));
        Ok(output.bytes)
    }
}

fn report_progress(callback: Option<&js_sys::Function>, completed: u32, total: u32, message: &str) {
    if let Some(callback) = callback {
        let _ = callback.call3(
            &JsValue::null(),
            &JsValue::from(completed),
            &JsValue::from(total),
            &JsValue::from_str(message),
        );
    }
}
