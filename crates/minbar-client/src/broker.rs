//! Storage broker client.
//!
//! The broker issues short-lived upload grants and receives the byte
//! transfer. Both operations can fail with retryable network errors;
//! the orchestrator wraps them in the retry policy.

use async_trait::async_trait;
use bytes::Bytes;

use minbar_core::{SubmitError, UploadGrant, UploadGrantRequest};

use crate::{map_request_error, map_status, ApiClient};

/// Seam to the storage broker collaborator.
#[async_trait]
pub trait StorageBroker: Send + Sync {
    /// Request an upload grant for one artifact.
    async fn request_grant(&self, request: &UploadGrantRequest)
        -> Result<UploadGrant, SubmitError>;

    /// Transfer the raw payload to the granted destination.
    async fn transfer(
        &self,
        upload_url: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), SubmitError>;
}

/// HTTP implementation against the backend's grant endpoint, with a
/// plain PUT for the byte transfer.
pub struct HttpStorageBroker {
    client: ApiClient,
}

impl HttpStorageBroker {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageBroker for HttpStorageBroker {
    async fn request_grant(
        &self,
        request: &UploadGrantRequest,
    ) -> Result<UploadGrant, SubmitError> {
        self.client.post_json("/api/v1/uploads/grants", request).await
    }

    async fn transfer(
        &self,
        upload_url: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), SubmitError> {
        let response = self
            .client
            .inner()
            .put(upload_url)
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }
        Ok(())
    }
}
