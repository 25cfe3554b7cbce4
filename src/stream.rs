//! Streaming API: emit each page as soon as its request completes.
//!
//! [`convert_stream`] rasterises up front (fatal errors surface here, before
//! the stream exists), then returns a stream that performs one request per
//! poll cycle, in page order. Nothing is uploaded until the stream is polled;
//! dropping it stops the run after the in-flight page.
//!
//! The stream does not build a [`crate::transcript::Transcript`]; callers
//! that want one append each `Ok` item's text with
//! [`crate::transcript::Transcript::append_page`].

use crate::config::VisionConfig;
use crate::convert::resolve_client;
use crate::error::{PageError, Pdf2VisionError};
use crate::output::PageResult;
use crate::pipeline::{input, ocr, render};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, PageError>> + Send>>;

/// Rasterise a PDF, then stream OCR results page by page.
///
/// Successful pages are yielded as `Ok(PageResult)`, failed pages as
/// `Err(PageError)`; the stream always yields one item per page.
pub async fn convert_stream(
    pdf_path: impl AsRef<Path>,
    config: &VisionConfig,
) -> Result<PageStream, Pdf2VisionError> {
    let pdf_path = input::resolve_input(pdf_path.as_ref())?;
    info!("Starting streaming OCR run: {}", pdf_path.display());

    let client = resolve_client(config)?;
    let images = render::rasterize(&pdf_path, config).await?;

    let s = stream::iter(images).then(move |image| {
        let client = Arc::clone(&client);
        async move {
            let mut result = ocr::process_page(client.as_ref(), &image).await;
            match result.error.take() {
                None => Ok(result),
                Some(err) => Err(err),
            }
        }
    });

    Ok(Box::pin(s))
}
