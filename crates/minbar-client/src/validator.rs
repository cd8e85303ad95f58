//! Content validator client.
//!
//! The validation service is an opaque, possibly slow collaborator: it
//! takes one artifact's bytes plus its kind and returns a plausibility
//! verdict. A transport failure here is a failed operation, never an
//! "invalid" verdict — the session records it as
//! [`ValidationState::Errored`](minbar_core::ValidationState).

use async_trait::async_trait;
use bytes::Bytes;

use minbar_core::{ArtifactKind, SubmitError, Verdict};

use crate::ApiClient;

/// Seam to the content-validation service.
#[async_trait]
pub trait ContentValidator: Send + Sync {
    async fn validate(&self, kind: ArtifactKind, data: &Bytes) -> Result<Verdict, SubmitError>;
}

/// HTTP implementation posting the raw payload with the kind as a query
/// parameter.
pub struct HttpContentValidator {
    client: ApiClient,
}

impl HttpContentValidator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContentValidator for HttpContentValidator {
    async fn validate(&self, kind: ArtifactKind, data: &Bytes) -> Result<Verdict, SubmitError> {
        let kind_param = match kind {
            ArtifactKind::Image | ArtifactKind::PdfPage => "image",
            ArtifactKind::Csv => "csv",
        };
        let path = format!("/api/v1/timetable-checks?kind={}", kind_param);
        self.client
            .post_bytes(&path, "application/octet-stream", data.clone())
            .await
    }
}
