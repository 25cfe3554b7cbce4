//! End-to-end integration tests for edgequake-pdf2vision.
//!
//! These tests use real PDF files in `./test_cases/`, bind a real pdfium
//! library and make live OCR API calls. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDF2VISION_API_KEY=... PDF2VISION_ENDPOINT_URL=... \
//!   LD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture

use edgequake_pdf2vision::config::{ENV_API_KEY, ENV_ENDPOINT_URL};
use edgequake_pdf2vision::{
    convert, convert_stream, convert_to_file, rasterize, Pdf2VisionError, Runner, VisionConfig,
};
use futures::StreamExt;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn sample_pdf() -> PathBuf {
    test_cases_dir().join("sample.pdf")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// Skip unless the OCR endpoint credentials are present in the environment.
macro_rules! e2e_skip_unless_credentials {
    () => {{
        if std::env::var(ENV_API_KEY).is_err() || std::env::var(ENV_ENDPOINT_URL).is_err() {
            println!("SKIP — set {} and {}", ENV_API_KEY, ENV_ENDPOINT_URL);
            return;
        }
    }};
}

fn live_config(image_dir: PathBuf) -> VisionConfig {
    VisionConfig::from_env()
        .image_dir(image_dir)
        .build()
        .expect("credentials checked above")
}

// ── Rasterisation only (no network) ──────────────────────────────────────────

#[tokio::test]
async fn e2e_rasterize_writes_one_jpeg_per_page() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    let dir = tempfile::tempdir().unwrap();
    let config = VisionConfig::builder()
        .endpoint_url("https://unused.example.com/vision/v2.0/ocr")
        .api_key("unused")
        .image_dir(dir.path())
        .build()
        .unwrap();

    let images = rasterize(&pdf, &config).await.unwrap();
    assert!(!images.is_empty());

    for (i, image) in images.iter().enumerate() {
        assert_eq!(image.index, i);
        assert_eq!(
            image.path,
            dir.path().join(format!("sample.pdf{i}.jpeg"))
        );
        let bytes = std::fs::read(&image.path).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF], "not a JPEG: {:?}", image.path);
        // US Letter or A4 at 300 DPI is well above 2000 px on the long side.
        assert!(image.width.max(image.height) > 2000);
    }

    // A second run overwrites the same files.
    let again = rasterize(&pdf, &config).await.unwrap();
    assert_eq!(
        again.iter().map(|p| &p.path).collect::<Vec<_>>(),
        images.iter().map(|p| &p.path).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn e2e_not_a_pdf_is_rejected() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, b"GIF89a not a pdf").unwrap();
    let config = VisionConfig::builder()
        .endpoint_url("https://unused.example.com/vision/v2.0/ocr")
        .api_key("unused")
        .image_dir(dir.path())
        .build()
        .unwrap();

    let err = convert(&fake, &config).await.unwrap_err();
    assert!(matches!(err, Pdf2VisionError::NotAPdf { .. }), "{err}");
}

// ── Live OCR ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_convert_sample() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    e2e_skip_unless_credentials!();
    let dir = tempfile::tempdir().unwrap();
    let config = live_config(dir.path().to_path_buf());

    let output = convert(&pdf, &config).await.unwrap();

    println!("{}", output.transcript.text());
    assert_eq!(output.stats.total_pages, output.images.len());
    assert_eq!(output.pages.len(), output.images.len());
    assert!(output.stats.processed_pages > 0, "no page recognised");
    assert!(output.transcript.text().contains("New Page"));
    assert!(output.transcript.raw().contains("\"regions\": ["));
    assert!(output.stats.total_words > 0);
}

#[tokio::test]
async fn e2e_convert_to_file_writes_text_transcript() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    e2e_skip_unless_credentials!();
    let dir = tempfile::tempdir().unwrap();
    let config = live_config(dir.path().join("images"));
    let out = dir.path().join("out/sample.txt");

    let output = convert_to_file(&pdf, &out, &config).await.unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, output.transcript.text());
}

#[tokio::test]
async fn e2e_stream_yields_every_page_in_order() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    e2e_skip_unless_credentials!();
    let dir = tempfile::tempdir().unwrap();
    let config = live_config(dir.path().to_path_buf());

    let mut stream = convert_stream(&pdf, &config).await.unwrap();
    let mut seen = Vec::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(page) => seen.push(page.page_num),
            Err(e) => seen.push(e.page),
        }
    }

    let expected: Vec<usize> = (1..=seen.len()).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn e2e_invalid_key_fails_every_page_but_returns_output() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    e2e_skip_unless_credentials!();
    let dir = tempfile::tempdir().unwrap();
    let config = VisionConfig::from_env()
        .api_key("00000000000000000000000000000000")
        .image_dir(dir.path())
        .build()
        .unwrap();

    let output = convert(&pdf, &config).await.unwrap();

    assert_eq!(output.stats.processed_pages, 0);
    assert!(output.transcript.text().is_empty());
    for page in &output.pages {
        assert_eq!(page.status, Some(401));
    }
    // The service's error body is still visible.
    assert!(!output.transcript.raw().is_empty());
    assert!(matches!(
        output.into_result(),
        Err(Pdf2VisionError::PartialFailure { success: 0, .. })
    ));
}

#[tokio::test]
async fn e2e_runner_runs_in_background() {
    let pdf = e2e_skip_unless_ready!(sample_pdf());
    e2e_skip_unless_credentials!();
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(live_config(dir.path().to_path_buf()));

    let handle = runner.start(&pdf).unwrap();
    assert!(matches!(runner.start(&pdf), Err(Pdf2VisionError::Busy)));

    let output = handle.join().await.unwrap();
    assert!(output.stats.processed_pages > 0);
    assert!(!runner.is_busy());
}
