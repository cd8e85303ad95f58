//! Pre-ingestion file checks.
//!
//! Cheap local checks run before a file enters the flow, so an
//! oversized or empty file is rejected with actionable guidance instead
//! of failing later at upload time.

use minbar_core::SourceFile;

#[derive(Debug, thiserror::Error)]
pub enum PrecheckError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Empty file")]
    EmptyFile,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),
}

/// Validate a source file before classification.
pub fn precheck_source(file: &SourceFile, max_file_size: usize) -> Result<(), PrecheckError> {
    if file.name.trim().is_empty() || file.name.contains("..") {
        return Err(PrecheckError::InvalidFilename(file.name.clone()));
    }
    if file.data.is_empty() {
        return Err(PrecheckError::EmptyFile);
    }
    if file.data.len() > max_file_size {
        return Err(PrecheckError::FileTooLarge {
            size: file.data.len(),
            max: max_file_size,
        });
    }
    Ok(())
}
