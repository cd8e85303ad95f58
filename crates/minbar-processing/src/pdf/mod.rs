//! PDF page extraction.
//!
//! A multi-page PDF is rasterized into independent image artifacts, one
//! per page, with progress reported as each page finishes rendering.
//! Rendering sits behind the [`PageRenderer`] seam; production uses
//! [`PdftoppmRenderer`], tests substitute a synthetic renderer.

mod renderer;

pub use renderer::{PageRenderer, PdftoppmRenderer};

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

use minbar_core::Progress;

/// Extraction errors. `NoPages` is the hard failure case ("could not
/// extract pages"); individually invalid pages are a downstream concern
/// handled by the validity-majority rule.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Not a PDF document")]
    NotAPdf,

    #[error("Could not extract any pages")]
    NoPages,

    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),

    #[error("Page count could not be determined")]
    UnknownPageCount,

    #[error("Renderer failed: {0}")]
    Renderer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One rasterized page, 1-based page number plus PNG bytes.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub number: usize,
    pub data: Bytes,
}

/// Rasterizes every page of a PDF, reporting incremental progress.
pub struct PageExtractor {
    renderer: Arc<dyn PageRenderer>,
}

impl PageExtractor {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self { renderer }
    }

    /// Render every page in order, sending `(completed, total)` on
    /// `progress_tx` after each page finishes.
    ///
    /// Zero extracted pages is a hard error. The caller caps the
    /// returned sequence to its free artifact slots before validation;
    /// this extractor does not know about capacity.
    pub async fn extract(
        &self,
        data: &[u8],
        progress_tx: &mpsc::UnboundedSender<Progress>,
    ) -> Result<Vec<RenderedPage>, ExtractError> {
        if !data.starts_with(b"%PDF") {
            return Err(ExtractError::NotAPdf);
        }

        // Total is best-effort: when the renderer cannot count pages we
        // render until the first out-of-range page and report the pages
        // done so far as the total.
        let total = match self.renderer.page_count(data).await {
            Ok(n) => Some(n),
            Err(ExtractError::UnknownPageCount) => None,
            Err(e) => return Err(e),
        };

        let mut pages = Vec::new();
        let mut page = 1;
        loop {
            if let Some(total) = total {
                if page > total {
                    break;
                }
            }
            match self.renderer.render_page(data, page).await {
                Ok(data) => {
                    pages.push(RenderedPage { number: page, data });
                    let _ = progress_tx.send(Progress::new(page, total.unwrap_or(page)));
                }
                Err(ExtractError::PageOutOfRange(_)) if total.is_none() => break,
                Err(e) => {
                    if total.is_some() {
                        // Skip the broken page; the remaining pages may
                        // still carry a usable timetable.
                        tracing::warn!(page, error = %e, "Page failed to render, skipping");
                    } else {
                        tracing::warn!(page, error = %e, "Page failed to render, stopping");
                        break;
                    }
                }
            }
            page += 1;
        }

        if pages.is_empty() {
            return Err(ExtractError::NoPages);
        }
        tracing::info!(pages = pages.len(), "PDF extraction finished");
        Ok(pages)
    }
}

/// Best-effort page count from the PDF `/Count` entry in the page tree.
/// Works on documents with an uncompressed catalog; compressed xref
/// streams fall back to render-until-out-of-range.
pub(crate) fn probe_page_count(data: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(data);
    text.split("/Count")
        .nth(1)
        .and_then(|s| {
            let num: String = s
                .chars()
                .skip_while(|c| c.is_whitespace())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            num.parse().ok()
        })
        .filter(|&n| n > 0)
}
