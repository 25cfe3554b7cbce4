//! Session state: the two append-only buffers a run produces.
//!
//! `raw` accumulates the pretty-printed JSON of every response body that came
//! back, `text` accumulates one banner-prefixed block of extracted words per
//! recognised page. Nothing is ever removed or rewritten; presentation code
//! either reads the buffers at the end of a run or follows the appends live
//! through [`crate::progress::SessionObserver`].

use serde::{Deserialize, Serialize};

/// Rule line framing the "New Page" banner in the text transcript.
pub const PAGE_RULE: &str = "-----------------------------------------";

/// Middle line of the page banner.
pub const PAGE_BANNER: &str = "New Page";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    raw: String,
    text: String,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed responses, in page order.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Extracted text with page banners, in page order.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append one pretty-printed response, newline-terminated.
    /// Returns the appended chunk.
    pub fn append_raw(&mut self, pretty: &str) -> String {
        let mut chunk = String::with_capacity(pretty.len() + 1);
        chunk.push_str(pretty);
        if !chunk.ends_with('\n') {
            chunk.push('\n');
        }
        self.raw.push_str(&chunk);
        chunk
    }

    /// Append the banner followed by one page of extracted text.
    /// Returns the appended chunk.
    pub fn append_page(&mut self, page_text: &str) -> String {
        let chunk = page_block(page_text);
        self.text.push_str(&chunk);
        chunk
    }

    pub fn into_parts(self) -> (String, String) {
        (self.raw, self.text)
    }
}

/// Render the text-transcript block for a single page.
pub fn page_block(page_text: &str) -> String {
    format!("{PAGE_RULE}\n{PAGE_BANNER}\n{PAGE_RULE}\n{page_text}\n")
}
