//! Load, recompress, save
//!
//! The pipeline is the only place that sees both fatal stages. Load and
//! save failures propagate; everything in between is handled per image by
//! the engine.

use tracing::info;

use crate::codec::{ImageCodec, JpegCodec};
use crate::document::PdfDocument;
use crate::error::ShrinkError;
use crate::options::CompressOptions;
use crate::progress::{CancelToken, CompressionReport, PageProgress};
use crate::quality::CompressionLevel;
use crate::recompress::{recompress, NoYield, YieldPoint};

pub type ProgressCallback = Box<dyn FnMut(PageProgress)>;

/// Recompressed bytes plus the figures the UI shows
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub bytes: Vec<u8>,
    pub report: CompressionReport,
}

/// Compress `source` at the named level (`low`, `medium` or `high`)
/// without yielding or progress reporting
pub async fn run(source: &[u8], level: &str) -> Result<RunOutput, ShrinkError> {
    let level: CompressionLevel = level.parse()?;
    Pipeline::new(CompressOptions::for_level(level))
        .run(source, &mut NoYield)
        .await
}

/// Configured compression run
pub struct Pipeline<C = JpegCodec> {
    codec: C,
    options: CompressOptions,
    on_progress: Option<ProgressCallback>,
    cancel: CancelToken,
}

impl Pipeline<JpegCodec> {
    pub fn new(options: CompressOptions) -> Self {
        Self {
            codec: JpegCodec,
            options,
            on_progress: None,
            cancel: CancelToken::new(),
        }
    }
}

impl Default for Pipeline<JpegCodec> {
    fn default() -> Self {
        Self::new(CompressOptions::default())
    }
}

impl<C: ImageCodec> Pipeline<C> {
    pub fn with_codec<D: ImageCodec>(self, codec: D) -> Pipeline<D> {
        Pipeline {
            codec,
            options: self.options,
            on_progress: self.on_progress,
            cancel: self.cancel,
        }
    }

    pub fn on_progress(mut self, callback: impl FnMut(PageProgress) + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling a run from elsewhere on the same task
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    pub async fn run<Y: YieldPoint>(
        &mut self,
        source: &[u8],
        yielder: &mut Y,
    ) -> Result<RunOutput, ShrinkError> {
        let Self {
            codec,
            options,
            on_progress,
            cancel,
        } = self;

        let mut doc = PdfDocument::load(source)?;
        let stats = recompress(&mut doc, &*codec, &*options, yielder, &*cancel, |progress| {
            if let Some(callback) = on_progress.as_mut() {
                callback(progress);
            }
        })
        .await?;
        let bytes = doc.save()?;

        let report = CompressionReport {
            original_size: source.len(),
            result_size: bytes.len(),
            quality: options.quality.get(),
            pages_total: stats.pages_total,
            images_found: stats.images_found,
            images_recompressed: stats.images_recompressed,
            images_kept: stats.images_kept,
            images_skipped: stats.images_skipped,
        };
        info!(
            original_size = report.original_size,
            result_size = report.result_size,
            pages = report.pages_total,
            recompressed = report.images_recompressed,
            skipped = report.images_skipped,
            "compression finished"
        );

        Ok(RunOutput { bytes, report })
    }
}
