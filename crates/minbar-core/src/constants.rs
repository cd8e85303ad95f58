//! Shared constants for the submission pipeline.

/// Maximum number of artifacts one submission session may hold.
pub const MAX_ARTIFACTS: usize = 12;

/// Maximum accepted size for a single source file, in bytes (20 MB).
pub const MAX_FILE_SIZE_BYTES: usize = 20 * 1024 * 1024;

/// Category tag sent with every upload grant request.
pub const UPLOAD_CATEGORY: &str = "prayer-timetables";

/// Discriminator for the review-queue registration payload.
pub const SUBMISSION_TYPE: &str = "prayer_times_document_set";

/// Default timeout for collaborator HTTP requests, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 60;
