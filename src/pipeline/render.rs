//! PDF rasterisation: every page → one JPEG on disk.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while rendering. [`rasterize`] moves the whole job onto
//! tokio's blocking pool so worker threads keep serving the runtime.
//!
//! ## All or nothing
//!
//! A page that fails to render or write aborts the job with no partial
//! result; the OCR stage never sees an incomplete page list.
//!
//! The write loop ([`rasterize_pages`]) only talks to a [`PageRenderer`], so
//! the file layout and failure policy are testable without pdfium.

use crate::config::VisionConfig;
use crate::error::Pdf2VisionError;
use crate::output::PageImage;
use crate::pipeline::input::source_file_name;
use crate::task::RunLease;
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Source of rendered pages.
pub trait PageRenderer {
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based). Errors are reported as detail strings
    /// and wrapped into [`Pdf2VisionError::RasterisationFailed`].
    fn render(&self, index: usize) -> Result<DynamicImage, String>;
}

/// Deterministic image path for page `index` of `source_name`:
/// `<image_dir>/<source_name><index>.jpeg`.
pub fn page_image_path(image_dir: &Path, source_name: &str, index: usize) -> PathBuf {
    image_dir.join(format!("{source_name}{index}.jpeg"))
}

/// Rasterise every page of `pdf_path` into `config`'s image directory.
pub async fn rasterize(
    pdf_path: &Path,
    config: &VisionConfig,
) -> Result<Vec<PageImage>, Pdf2VisionError> {
    rasterize_leased(pdf_path, config, None).await
}

/// The blocking job owns `lease`, so an aborted run keeps its runner busy
/// until pdfium stops writing, and stops before the next page.
pub(crate) async fn rasterize_leased(
    pdf_path: &Path,
    config: &VisionConfig,
    lease: Option<RunLease>,
) -> Result<Vec<PageImage>, Pdf2VisionError> {
    let path = pdf_path.to_path_buf();
    let image_dir = config.resolve_image_dir()?;
    let dpi = config.dpi;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        rasterize_blocking(&path, &image_dir, dpi, password.as_deref(), lease.as_ref())
    })
    .await
    .map_err(|e| Pdf2VisionError::Internal(format!("Render task panicked: {}", e)))?
}

fn rasterize_blocking(
    pdf_path: &Path,
    image_dir: &Path,
    dpi: u32,
    password: Option<&str>,
    lease: Option<&RunLease>,
) -> Result<Vec<PageImage>, Pdf2VisionError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2VisionError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2VisionError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2VisionError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let renderer = PdfiumPages::new(&document, dpi);
    info!(
        "PDF loaded: {} pages, rendering at {} DPI",
        renderer.page_count(),
        dpi
    );

    render_all(&renderer, &source_file_name(pdf_path), image_dir, lease)
}

/// Render every page of `renderer` and write it as a JPEG.
///
/// Creates `image_dir` if needed; any existing file at a page's path is
/// removed first, so a rerun leaves exactly the new images behind.
pub fn rasterize_pages(
    renderer: &dyn PageRenderer,
    source_name: &str,
    image_dir: &Path,
) -> Result<Vec<PageImage>, Pdf2VisionError> {
    render_all(renderer, source_name, image_dir, None)
}

fn render_all(
    renderer: &dyn PageRenderer,
    source_name: &str,
    image_dir: &Path,
    lease: Option<&RunLease>,
) -> Result<Vec<PageImage>, Pdf2VisionError> {
    let total = renderer.page_count();
    let mut images = Vec::with_capacity(total);

    for index in 0..total {
        if lease.is_some_and(RunLease::is_cancelled) {
            debug!("Rendering cancelled before page {}", index + 1);
            return Err(Pdf2VisionError::Cancelled);
        }

        let image = renderer
            .render(index)
            .map_err(|detail| Pdf2VisionError::RasterisationFailed {
                page: index + 1,
                detail,
            })?;

        let path = page_image_path(image_dir, source_name, index);
        write_jpeg(&image, image_dir, &path)?;

        debug!(
            "Rendered page {} → {}x{} px → {}",
            index + 1,
            image.width(),
            image.height(),
            path.display()
        );

        images.push(PageImage {
            index,
            path,
            width: image.width(),
            height: image.height(),
        });
    }

    Ok(images)
}

/// JPEG has no alpha channel, so the bitmap is flattened to RGB first.
fn write_jpeg(image: &DynamicImage, image_dir: &Path, path: &Path) -> Result<(), Pdf2VisionError> {
    let write_err = |detail: String| Pdf2VisionError::ImageWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    std::fs::create_dir_all(image_dir).map_err(|e| write_err(e.to_string()))?;
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| write_err(e.to_string()))?;
    }

    DynamicImage::ImageRgb8(image.to_rgb8())
        .save_with_format(path, ImageFormat::Jpeg)
        .map_err(|e| write_err(e.to_string()))
}

/// Bind pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library search path.
fn bind_pdfium() -> Result<Pdfium, Pdf2VisionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2VisionError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// [`PageRenderer`] over an open pdfium document.
struct PdfiumPages<'a, 'doc> {
    document: &'a PdfDocument<'doc>,
    render_config: PdfRenderConfig,
}

impl<'a, 'doc> PdfiumPages<'a, 'doc> {
    fn new(document: &'a PdfDocument<'doc>, dpi: u32) -> Self {
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(dpi as f32 / POINTS_PER_INCH)
            .render_form_data(true)
            .use_print_quality(true);

        Self {
            document,
            render_config,
        }
    }
}

impl PageRenderer for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render(&self, index: usize) -> Result<DynamicImage, String> {
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| format!("{:?}", e))?;

        let bitmap = page
            .render_with_config(&self.render_config)
            .map_err(|e| format!("{:?}", e))?;

        Ok(bitmap.as_image())
    }
}
