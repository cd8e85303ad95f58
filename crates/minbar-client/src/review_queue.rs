//! Review queue client — the submission finalizer's single
//! registration call.
//!
//! Registration happens exactly once, after every artifact has a
//! durable reference. Any non-success response is a terminal failure of
//! the whole submission; there is no partial registration and no retry
//! at this layer.

use async_trait::async_trait;

use minbar_core::{RegistrationRequest, RegistrationResponse, SubmitError};

use crate::ApiClient;

/// Seam to the review-queue collaborator.
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError>;
}

pub struct HttpReviewQueue {
    client: ApiClient,
}

impl HttpReviewQueue {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReviewQueue for HttpReviewQueue {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError> {
        let response: RegistrationResponse = self
            .client
            .post_json("/api/v1/review-queue/submissions", request)
            .await?;
        tracing::info!(queue_id = %response.queue_id, "Submission registered");
        Ok(response)
    }
}
