//! Page rendering seam and the poppler-backed implementation.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use super::{probe_page_count, ExtractError};

/// Rasterizes single PDF pages. Implementations must be safe to call
/// page-by-page; the extractor drives the sequence and the progress.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document.
    ///
    /// `UnknownPageCount` is not a failure: the extractor then renders
    /// until the first out-of-range page.
    async fn page_count(&self, data: &[u8]) -> Result<usize, ExtractError>;

    /// Render one 1-based page to PNG bytes.
    async fn render_page(&self, data: &[u8], page: usize) -> Result<Bytes, ExtractError>;
}

/// Renderer shelling out to poppler's `pdftoppm`, one invocation per
/// page, in a scratch directory.
pub struct PdftoppmRenderer {
    binary_path: String,
    resolution_dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            resolution_dpi: 150,
        }
    }

    pub fn with_resolution(mut self, dpi: u32) -> Self {
        self.resolution_dpi = dpi;
        self
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn page_count(&self, data: &[u8]) -> Result<usize, ExtractError> {
        probe_page_count(data).ok_or(ExtractError::UnknownPageCount)
    }

    async fn render_page(&self, data: &[u8], page: usize) -> Result<Bytes, ExtractError> {
        let dir = tempfile::tempdir()?;
        let pdf_path = dir.path().join("input.pdf");
        tokio::fs::write(&pdf_path, data).await?;

        let prefix = dir.path().join("page");
        let output = Command::new(&self.binary_path)
            .arg("-png")
            .arg("-r")
            .arg(self.resolution_dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| {
                ExtractError::Renderer(format!("failed to run {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            return Err(ExtractError::Renderer(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        // pdftoppm writes page-{N}.png (page number zero-padded); a
        // single-page invocation produces at most one file.
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("png") {
                let bytes = tokio::fs::read(&path).await?;
                tracing::debug!(page, bytes = bytes.len(), "Rendered PDF page");
                return Ok(Bytes::from(bytes));
            }
        }

        // pdftoppm exits zero with no output when the page is past the
        // end of the document.
        Err(ExtractError::PageOutOfRange(page))
    }
}
