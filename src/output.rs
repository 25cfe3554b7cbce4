//! Result types of a run.

use crate::error::{PageError, Pdf2VisionError};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rendered page on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 0-based page index; also the suffix of the file name.
    pub index: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    /// 1-based page number used in logs, errors and results.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }
}

/// Outcome of one page of OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub image_path: PathBuf,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Pretty-printed response body; empty when nothing came back.
    pub raw_output: String,
    /// Extracted words, space-joined per line and newline-joined across lines.
    pub text: String,
    pub word_count: usize,
    pub duration_ms: u64,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub total_words: usize,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub images: Vec<PageImage>,
    pub pages: Vec<PageResult>,
    pub transcript: Transcript,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Treat any failed page as an error.
    pub fn into_result(self) -> Result<Self, Pdf2VisionError> {
        if self.stats.failed_pages > 0 {
            return Err(Pdf2VisionError::PartialFailure {
                success: self.stats.processed_pages,
                failed: self.stats.failed_pages,
                total: self.stats.total_pages,
            });
        }
        Ok(self)
    }

    /// Errors of the failed pages, in page order.
    pub fn page_errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}
