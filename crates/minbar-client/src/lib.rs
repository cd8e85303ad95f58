//! Minbar Client Library
//!
//! HTTP clients for the pipeline's collaborators (storage broker,
//! content validator, review queue), the upload retry policy, the
//! upload orchestrator, and the [`SubmissionSession`] coordinator that
//! drives the flow state machine end to end.

pub mod broker;
pub mod orchestrator;
pub mod retry;
pub mod review_queue;
pub mod session;
pub mod validator;

pub use broker::{HttpStorageBroker, StorageBroker};
pub use orchestrator::UploadOrchestrator;
pub use retry::RetryPolicy;
pub use review_queue::{HttpReviewQueue, ReviewQueue};
pub use session::SubmissionSession;
pub use validator::{ContentValidator, HttpContentValidator};

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use minbar_core::SubmitError;

/// Minimal HTTP client for the Minbar backend with `X-API-Key` auth and
/// JSON helpers. Collaborator clients share one instance.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying reqwest client, for requests outside the base URL
    /// (e.g. byte transfer to a granted upload URL).
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// POST a JSON body to a path under the base URL and deserialize
    /// the JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SubmitError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }
        response
            .json()
            .await
            .map_err(|e| SubmitError::Internal(format!("Malformed response: {}", e)))
    }

    /// POST a raw byte payload to a path under the base URL and
    /// deserialize the JSON response. Carries the same auth header as
    /// [`ApiClient::post_json`].
    pub async fn post_bytes<T: DeserializeOwned>(
        &self,
        path: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<T, SubmitError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", &self.api_key)
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }
        response
            .json()
            .await
            .map_err(|e| SubmitError::Internal(format!("Malformed response: {}", e)))
    }
}

/// Map a reqwest transport failure into the error taxonomy.
pub(crate) fn map_request_error(err: reqwest::Error) -> SubmitError {
    if err.is_timeout() {
        SubmitError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        SubmitError::Connectivity(err.to_string())
    } else {
        SubmitError::Internal(err.to_string())
    }
}

/// Map a non-success HTTP status into the error taxonomy.
pub(crate) fn map_status(status: StatusCode, body: String) -> SubmitError {
    match status.as_u16() {
        401 | 403 => SubmitError::Unauthorized(format!("status {}", status.as_u16())),
        408 => SubmitError::Timeout(if body.is_empty() {
            "The server timed out reading the request".to_string()
        } else {
            body
        }),
        413 => SubmitError::PayloadTooLarge(if body.is_empty() {
            "The file exceeds the server's size limit".to_string()
        } else {
            body
        }),
        s if s >= 500 => SubmitError::Server {
            status: s,
            message: body,
        },
        s => SubmitError::Internal(format!("Unexpected status {}: {}", s, body)),
    }
}
