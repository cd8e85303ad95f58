//! Minbar Core Library
//!
//! This crate provides the domain models, artifact classifier, flow state
//! machine, error types, and configuration shared across all Minbar
//! components.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod flow;
pub mod models;
pub mod preview;

// Re-export commonly used types
pub use classifier::{classify, image_content_type_for, FileClass};
pub use config::Config;
pub use error::SubmitError;
pub use flow::{Step, SubmissionFlow};
pub use models::{
    ArtifactKind, CapturedImage, Period, Progress, RegistrationData, RegistrationRequest,
    RegistrationResponse, SourceFile, UploadGrant, UploadGrantRequest, UploadedArtifact,
    ValidationState, Verdict,
};
pub use preview::{NoopPreviewStore, PreviewRef, PreviewStore};
