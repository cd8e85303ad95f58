//! Data models for the submission pipeline
//!
//! Organized by domain: `artifact` holds the captured material tracked
//! through validation and tagging; `submission` holds the wire types
//! exchanged with the storage broker and the review queue.

mod artifact;
mod submission;

pub use artifact::*;
pub use submission::*;
