//! Run-scoped progress, cancellation, and the final size report

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Snapshot handed to the page callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageProgress {
    pub pages_completed: u32,
    pub pages_total: u32,
}

impl PageProgress {
    /// Whole-number percentage, 100 for an empty document
    pub fn percent(&self) -> u32 {
        if self.pages_total == 0 {
            return 100;
        }
        ((self.pages_completed as u64 * 100 + self.pages_total as u64 / 2)
            / self.pages_total as u64) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.pages_completed >= self.pages_total
    }
}

/// Counters for one run; created fresh by every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub pages_completed: u32,
    pub pages_total: u32,
    pub images_found: u32,
    pub images_recompressed: u32,
    pub images_kept: u32,
    pub images_skipped: u32,
}

impl ProgressState {
    pub fn start(pages_total: u32) -> Self {
        Self {
            pages_total,
            ..Self::default()
        }
    }

    pub fn complete_page(&mut self) -> PageProgress {
        self.pages_completed += 1;
        self.snapshot()
    }

    pub fn snapshot(&self) -> PageProgress {
        PageProgress {
            pages_completed: self.pages_completed,
            pages_total: self.pages_total,
        }
    }
}

/// Cooperative cancellation flag, checked at every yield point
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Before/after figures for a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub original_size: usize,
    pub result_size: usize,
    pub quality: f32,
    pub pages_total: u32,
    pub images_found: u32,
    pub images_recompressed: u32,
    /// Re-encoded but left as-is because the result was not smaller
    pub images_kept: u32,
    pub images_skipped: u32,
}

impl CompressionReport {
    /// Negative when the output grew
    pub fn bytes_saved(&self) -> i64 {
        self.original_size as i64 - self.result_size as i64
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.result_size as f64 / self.original_size as f64) * 100.0
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.result_size == 0 {
            return 0.0;
        }
        self.original_size as f64 / self.result_size as f64
    }
}
