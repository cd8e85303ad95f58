//! Artifact classifier.
//!
//! Assigns an incoming file one of four classes by inspecting the
//! declared content type first and the filename extension as a
//! fallback. Pure function, no I/O; the only failure mode is
//! `Unsupported`.

use std::path::Path;

/// Classification of a raw source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Image,
    Pdf,
    Csv,
    Unsupported,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "heic", "gif", "bmp"];

/// Classify a file by content type, then extension.
pub fn classify(name: &str, content_type: &str) -> FileClass {
    let content_type = content_type.to_lowercase();

    if content_type.starts_with("image/") {
        return FileClass::Image;
    }
    if content_type == "application/pdf" {
        return FileClass::Pdf;
    }
    if content_type == "text/csv" || content_type == "application/csv" {
        return FileClass::Csv;
    }

    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("pdf") => FileClass::Pdf,
        Some("csv") => FileClass::Csv,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => FileClass::Image,
        _ => FileClass::Unsupported,
    }
}

/// Declared content type for an image file whose source carried none,
/// derived from the extension. Unknown image extensions fall back to
/// JPEG, the overwhelmingly common phone-camera case.
pub fn image_content_type_for(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}
