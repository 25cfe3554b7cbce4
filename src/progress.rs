//! Observer trait for per-page run events and transcript appends.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::VisionConfigBuilder::observer`] to follow a run live:
//! page starts and failures, plus every chunk appended to the raw and text
//! transcripts. The library never touches a display; a terminal front end
//! draws a progress bar, a desktop shell would append to its text widgets.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2vision::{SessionObserver, VisionConfig};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct TextPane {
//!     buffer: Mutex<String>,
//! }
//!
//! impl SessionObserver for TextPane {
//!     fn on_text_output(&self, _page_num: usize, chunk: &str) {
//!         self.buffer.lock().unwrap().push_str(chunk);
//!     }
//! }
//!
//! let pane = Arc::new(TextPane::default());
//! let config = VisionConfig::builder()
//!     .endpoint_url("https://westeurope.api.cognitive.microsoft.com/vision/v2.0/ocr")
//!     .api_key("0123456789abcdef")
//!     .observer(pane as Arc<dyn SessionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;
use std::sync::Arc;

/// Called by the OCR stage as it works through the page list.
///
/// Pages are processed one at a time, so calls never overlap within a run,
/// but they arrive on a tokio worker thread, hence `Send + Sync`. Every
/// method has a no-op default.
pub trait SessionObserver: Send + Sync {
    /// Called once after rasterisation, before the first request.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the image of a page is uploaded.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called with each chunk appended to the raw (pretty JSON) transcript.
    fn on_raw_output(&self, page_num: usize, chunk: &str) {
        let _ = (page_num, chunk);
    }

    /// Called with each banner + text block appended to the text transcript.
    fn on_text_output(&self, page_num: usize, chunk: &str) {
        let _ = (page_num, chunk);
    }

    /// Called when a page has been recognised.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, word_count: usize) {
        let _ = (page_num, total_pages, word_count);
    }

    /// Called when a page fails. Processing continues with the next page.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &PageError) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::VisionConfig`].
pub type Observer = Arc<dyn SessionObserver>;
