//! # edgequake-pdf2vision
//!
//! Rasterise the pages of a PDF and run each one through a cloud OCR
//! endpoint (Computer Vision `ocr` operation), collecting the raw JSON
//! responses and the extracted plain text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   validate path, %PDF magic bytes
//!  ├─ 2. Render  pdfium → <image_dir>/<name><index>.jpeg at 300 DPI (spawn_blocking)
//!  ├─ 3. OCR     one POST per page, strictly in order, no retry
//!  ├─ 4. Format  pretty-print every body into the raw transcript
//!  └─ 5. Extract regions → lines → words into the text transcript
//! ```
//!
//! Rendering is all-or-nothing: a page that cannot be rasterised aborts the
//! run. OCR failures are per page: the failing page is reported and the
//! remaining pages are still processed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2vision::{convert, VisionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads PDF2VISION_API_KEY and PDF2VISION_ENDPOINT_URL
//!     let config = VisionConfig::from_env().build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.transcript.text());
//!     eprintln!("{}/{} pages recognised",
//!         output.stats.processed_pages,
//!         output.stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2vision` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! ## pdfium
//!
//! The library binds pdfium at run time: `PDFIUM_LIB_PATH` if set, else a
//! library in the working directory, else the system search path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod pretty;
pub mod progress;
pub mod stream;
pub mod task;
pub mod transcript;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{VisionConfig, VisionConfigBuilder};
pub use convert::{convert, convert_sync, convert_to_file};
pub use error::{PageError, Pdf2VisionError};
pub use output::{ConversionOutput, ConversionStats, PageImage, PageResult};
pub use pipeline::client::{OcrClient, RawResponse, VisionClient};
pub use pipeline::extract::OcrPage;
pub use pipeline::ocr::process_pages;
pub use pipeline::render::rasterize;
pub use pretty::{pretty_print, pretty_print_opt};
pub use progress::{NoopObserver, Observer, SessionObserver};
pub use stream::{convert_stream, PageStream};
pub use task::{RunHandle, Runner};
pub use transcript::Transcript;
