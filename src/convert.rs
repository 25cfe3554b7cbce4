//! Eager (whole-document) entry points.
//!
//! [`convert`] rasterises every page, then runs OCR on each image in order
//! and returns once the last page has been attempted. Use
//! [`crate::stream::convert_stream`] to receive pages as they finish, or
//! [`crate::task::Runner`] to run in the background with a cancellable
//! handle.

use crate::config::VisionConfig;
use crate::error::Pdf2VisionError;
use crate::output::{ConversionOutput, ConversionStats, PageImage};
use crate::pipeline::client::{OcrClient, VisionClient};
use crate::pipeline::{input, ocr, render};
use crate::task::RunLease;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Rasterise a PDF and run every page through the OCR endpoint.
///
/// # Returns
/// `Ok(ConversionOutput)` once every page was attempted, even if some or all
/// pages failed (see `output.stats.failed_pages` and each page's `error`).
///
/// # Errors
/// Only fatal errors abort the run, before any request is sent:
/// - file not found / permission denied / not a PDF
/// - pdfium unavailable, wrong password, corrupt document
/// - any page that fails to render or to be written as JPEG
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &VisionConfig,
) -> Result<ConversionOutput, Pdf2VisionError> {
    convert_leased(pdf_path.as_ref(), config, None).await
}

/// [`convert`] on behalf of a [`crate::task::Runner`]; the render job keeps
/// a clone of `lease` for as long as it touches the image directory.
pub(crate) async fn convert_leased(
    pdf_path: &Path,
    config: &VisionConfig,
    lease: Option<RunLease>,
) -> Result<ConversionOutput, Pdf2VisionError> {
    let total_start = Instant::now();
    info!("Starting OCR run: {}", pdf_path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let pdf_path = input::resolve_input(pdf_path)?;

    // ── Step 2: Get/create client ────────────────────────────────────────
    let client = resolve_client(config)?;

    // ── Step 3: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let images = render::rasterize_leased(&pdf_path, config, lease).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        images.len(),
        render_duration_ms
    );

    // ── Step 4: OCR each page in order ───────────────────────────────────
    let mut output = recognise_images(client.as_ref(), images, config).await;
    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "OCR run complete: {}/{} pages, {} words, {}ms total",
        output.stats.processed_pages,
        output.stats.total_pages,
        output.stats.total_words,
        output.stats.total_duration_ms
    );

    Ok(output)
}

/// OCR stage on already rendered images, with observer notifications and
/// stats. Render and total durations are left for the caller to fill in.
pub async fn recognise_images(
    client: &dyn OcrClient,
    images: Vec<PageImage>,
    config: &VisionConfig,
) -> ConversionOutput {
    let total = images.len();
    let observer = config.observer.as_deref();

    if let Some(cb) = observer {
        cb.on_run_start(total);
    }

    let ocr_start = Instant::now();
    let (pages, transcript) = ocr::process_pages(client, &images, observer).await;
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    let processed = pages.iter().filter(|p| p.is_success()).count();
    debug!("{} of {} pages recognised", processed, total);

    if let Some(cb) = observer {
        cb.on_run_complete(total, processed);
    }

    let stats = ConversionStats {
        total_pages: total,
        processed_pages: processed,
        failed_pages: total - processed,
        total_words: pages.iter().map(|p| p.word_count).sum(),
        render_duration_ms: 0,
        ocr_duration_ms,
        total_duration_ms: ocr_duration_ms,
    };

    ConversionOutput {
        images,
        pages,
        transcript,
        stats,
    }
}

/// Run [`convert`] and write the text transcript to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &VisionConfig,
) -> Result<ConversionOutput, Pdf2VisionError> {
    let output = convert(pdf_path, config).await?;
    write_atomic(output_path.as_ref(), output.transcript.text()).await?;
    Ok(output)
}

/// Write `contents` to `path` through a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2VisionError> {
    let write_err = |source| Pdf2VisionError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &VisionConfig,
) -> Result<ConversionOutput, Pdf2VisionError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2VisionError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(pdf_path, config))
}

/// The injected client if any, otherwise a [`VisionClient`] built from the
/// endpoint settings.
pub(crate) fn resolve_client(config: &VisionConfig) -> Result<Arc<dyn OcrClient>, Pdf2VisionError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    Ok(Arc::new(VisionClient::from_config(config)?))
}
