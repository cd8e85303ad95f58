//! Minbar Processing Library
//!
//! PDF page extraction (rasterization behind the [`PageRenderer`] seam)
//! and pre-ingestion file checks.

pub mod pdf;
pub mod precheck;

pub use pdf::{ExtractError, PageExtractor, PageRenderer, PdftoppmRenderer, RenderedPage};
pub use precheck::{precheck_source, PrecheckError};
