//! The page loop: upload each image in order, build both transcripts.
//!
//! Pages are processed strictly one after another; the next upload starts
//! only after the previous response was handled. There is no retry. A page
//! that fails, for any reason, becomes a [`PageError`] on its
//! [`PageResult`] and the loop moves on.
//!
//! ## Per-page steps
//!
//! 1. read the JPEG into memory
//! 2. [`OcrClient::analyze`] → status + body
//! 3. pretty-print the body into the raw transcript (also for error bodies)
//! 4. non-2xx status → page error, using the API's message when present
//! 5. parse the typed response, append banner + words to the text transcript

use crate::error::PageError;
use crate::output::{PageImage, PageResult};
use crate::pipeline::client::OcrClient;
use crate::pipeline::extract::{describe_error_body, OcrPage};
use crate::pretty::pretty_print;
use crate::progress::SessionObserver;
use crate::transcript::Transcript;
use std::time::Instant;
use tracing::{debug, warn};

/// What one page contributed, before it is folded into a [`Transcript`].
struct PageWork {
    status: Option<u16>,
    raw_output: String,
    text: String,
    word_count: usize,
    error: Option<PageError>,
}

/// Run OCR on a single page. Never fails: errors are stored in the result.
pub async fn process_page(client: &dyn OcrClient, image: &PageImage) -> PageResult {
    let start = Instant::now();
    let page_num = image.page_num();
    let work = recognise(client, image).await;

    match &work.error {
        None => debug!(
            "Page {}: {} words in {:?}",
            page_num,
            work.word_count,
            start.elapsed()
        ),
        Some(e) => warn!("{}", e),
    }

    PageResult {
        page_num,
        image_path: image.path.clone(),
        status: work.status,
        raw_output: work.raw_output,
        text: work.text,
        word_count: work.word_count,
        duration_ms: start.elapsed().as_millis() as u64,
        error: work.error,
    }
}

async fn recognise(client: &dyn OcrClient, image: &PageImage) -> PageWork {
    let page_num = image.page_num();
    let mut work = PageWork {
        status: None,
        raw_output: String::new(),
        text: String::new(),
        word_count: 0,
        error: None,
    };

    let bytes = match tokio::fs::read(&image.path).await {
        Ok(b) => b,
        Err(e) => {
            work.error = Some(PageError::new(
                page_num,
                format!("cannot read '{}': {e}", image.path.display()),
            ));
            return work;
        }
    };

    let response = match client.analyze(bytes).await {
        Ok(r) => r,
        Err(e) => {
            work.error = Some(PageError::new(page_num, e.to_string()));
            return work;
        }
    };

    work.status = Some(response.status);
    work.raw_output = pretty_print(&response.body);

    if !response.is_success() {
        let detail = describe_error_body(&response.body)
            .unwrap_or_else(|| snippet(&response.body));
        work.error = Some(PageError::new(
            page_num,
            format!("HTTP {}: {}", response.status, detail),
        ));
        return work;
    }

    match OcrPage::from_json(&response.body) {
        Ok(page) => {
            work.text = page.plain_text();
            work.word_count = page.word_count();
        }
        Err(e) => work.error = Some(PageError::new(page_num, e.to_string())),
    }

    work
}

/// Process `images` in order, folding every page into a fresh
/// [`Transcript`] and reporting to `observer` as it goes.
pub async fn process_pages(
    client: &dyn OcrClient,
    images: &[PageImage],
    observer: Option<&dyn SessionObserver>,
) -> (Vec<PageResult>, Transcript) {
    let total = images.len();
    let mut transcript = Transcript::new();
    let mut results = Vec::with_capacity(total);

    for image in images {
        let page_num = image.page_num();
        if let Some(cb) = observer {
            cb.on_page_start(page_num, total);
        }

        let result = process_page(client, image).await;
        record(&mut transcript, &result, total, observer);
        results.push(result);
    }

    (results, transcript)
}

/// Append a finished page to `transcript` and notify `observer`.
pub fn record(
    transcript: &mut Transcript,
    result: &PageResult,
    total: usize,
    observer: Option<&dyn SessionObserver>,
) {
    if result.status.is_some() {
        let chunk = transcript.append_raw(&result.raw_output);
        if let Some(cb) = observer {
            cb.on_raw_output(result.page_num, &chunk);
        }
    }

    match &result.error {
        None => {
            let chunk = transcript.append_page(&result.text);
            if let Some(cb) = observer {
                cb.on_text_output(result.page_num, &chunk);
                cb.on_page_complete(result.page_num, total, result.word_count);
            }
        }
        Some(e) => {
            if let Some(cb) = observer {
                cb.on_page_error(result.page_num, total, e);
            }
        }
    }
}

/// First line of a non-JSON error body, shortened for display.
fn snippet(body: &str) -> String {
    let line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.is_empty() {
        return "empty response body".to_string();
    }
    if line.chars().count() > 120 {
        let cut: String = line.chars().take(119).collect();
        format!("{cut}\u{2026}")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_shortens_long_bodies() {
        assert_eq!(snippet(""), "empty response body");
        assert_eq!(snippet("\n  Bad Gateway \n<html>"), "Bad Gateway");
        let long = "x".repeat(300);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), 120);
        assert!(s.ends_with('\u{2026}'));
    }
}
