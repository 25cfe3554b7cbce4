//! Pipeline stages for PDF → OCR text.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ocr ──▶ client ──▶ extract
//! (path)    (pdfium,   (page    (HTTP     (typed JSON
//!            JPEG)      loop)    POST)     → text)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied PDF path
//! 2. [`render`]  — rasterise every page to `<image_dir>/<name><index>.jpeg`
//!    inside `spawn_blocking`; all-or-nothing
//! 3. [`ocr`]     — walk the images in order, one awaited request at a time,
//!    and fold the results into the transcripts; per-page failures are kept
//! 4. [`client`]  — the only stage with network I/O
//! 5. [`extract`] — `regions → lines → words` into plain text

pub mod client;
pub mod extract;
pub mod input;
pub mod ocr;
pub mod render;
