use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{FailureStage, ShrinkError};
use crate::options::{CompressOptions, ReplacePolicy};
use crate::pipeline::Pipeline;
use crate::quality::CompressionLevel;
use crate::recompress::YieldPoint;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ShrinkCommand {
    Compress {
        file: Vec<u8>,
        #[serde(default)]
        level: CompressionLevel,
        #[serde(default)]
        replace: ReplacePolicy,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
    pub stage: Option<FailureStage>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub images_recompressed: u32,
    pub images_skipped: u32,
    pub processing_time_ms: u64,
}

impl ProcessResult {
    pub fn failure(error: &ShrinkError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            stage: Some(error.stage()),
            metrics: None,
        }
    }
}

/// Run a command to completion. `now_ms` is the host's millisecond clock;
/// it is only read to fill in `processing_time_ms`.
pub async fn process_command<Y, T>(command: ShrinkCommand, yielder: &mut Y, now_ms: T) -> ProcessResult
where
    Y: YieldPoint,
    T: Fn() -> f64,
{
    let started = now_ms();
    match command {
        ShrinkCommand::Compress {
            file,
            level,
            replace,
        } => {
            let options = CompressOptions::for_level(level).with_replace(replace);
            match Pipeline::new(options).run(&file, yielder).await {
                Ok(output) => {
                    let elapsed = (now_ms() - started).max(0.0) as u64;
                    ProcessResult {
                        success: true,
                        data: Some(base64::engine::general_purpose::STANDARD.encode(&output.bytes)),
                        error: None,
                        stage: None,
                        metrics: Some(ProcessMetrics {
                            input_size_bytes: output.report.original_size,
                            output_size_bytes: output.report.result_size,
                            page_count: output.report.pages_total,
                            images_recompressed: output.report.images_recompressed,
                            images_skipped: output.report.images_skipped,
                            processing_time_ms: elapsed,
                        }),
                    }
                }
                Err(e) => ProcessResult::failure(&e),
            }
        }
    }
}
