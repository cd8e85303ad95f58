//! Wire types for the storage broker and review queue collaborators.
//!
//! Field names follow the backend contract (camelCase on the wire).

use serde::{Deserialize, Serialize};

use super::Period;

/// Request body for an upload grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrantRequest {
    pub owner_id: String,
    pub file_name: String,
    pub category: String,
    pub content_type: String,
}

/// Short-lived, single-use permission for one artifact's transfer.
///
/// `upload_url` receives the bytes; `public_url` is the durable
/// reference recorded for the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    pub upload_url: String,
    pub public_url: String,
}

/// Minimal projection of an uploaded artifact for registration.
/// Raw bytes and preview handles are deliberately dropped here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedArtifact {
    pub url: String,
    pub period: Period,
    #[serde(default)]
    pub detected_prayers: Vec<String>,
    #[serde(default)]
    pub detected_times: Vec<String>,
}

/// Inner data of a registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub artifacts: Vec<UploadedArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// One registration call per submission, sent once all uploads succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub submission_type: String,
    pub owner_id: String,
    pub data: RegistrationData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub queue_id: String,
}

/// Progress pair for UI feedback. `completed` denotes the item currently
/// being processed, not items fully done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }
}
