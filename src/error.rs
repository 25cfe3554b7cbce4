//! Error types for the edgequake-pdf2vision library.
//!
//! Two distinct error types reflect the two failure policies of a run:
//!
//! * [`Pdf2VisionError`] — **Fatal**: the run cannot proceed at all (bad
//!   input file, pdfium missing, a page that will not rasterise). Returned as
//!   `Err(Pdf2VisionError)` from the top-level `convert*` functions. No images
//!   are handed to the OCR stage when rasterisation fails.
//!
//! * [`PageError`] — **Non-fatal**: one page could not be recognised
//!   (network error, error status, body that is not the expected JSON). It is
//!   stored inside [`crate::output::PageResult`] and the remaining pages are
//!   still processed.
//!
//! Page failures are deliberately a single category: the user sees "page N
//! failed" plus a detail string, whatever the underlying cause was.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2vision library.
#[derive(Debug, Error)]
pub enum Pdf2VisionError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered page could not be written as a JPEG.
    #[error("Failed to write page image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the transcript file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during OCR")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The reqwest client could not be constructed (TLS backend, proxy config).
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Run control ───────────────────────────────────────────────────────
    /// A run is already in flight on this [`crate::task::Runner`].
    #[error("A run is already in progress; wait for it to finish or abort it")]
    Busy,

    /// The run was aborted through its [`crate::task::RunHandle`].
    #[error("Run was cancelled")]
    Cancelled,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Network failures, error statuses and malformed responses all land here;
/// `detail` carries the specific cause for logs and the user notification.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[error("Page {page}: OCR failed: {detail}")]
pub struct PageError {
    /// 1-indexed page number.
    pub page: usize,
    pub detail: String,
}

impl PageError {
    pub fn new(page: usize, detail: impl Into<String>) -> Self {
        Self {
            page,
            detail: detail.into(),
        }
    }
}
