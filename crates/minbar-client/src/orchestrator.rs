//! Upload orchestrator.
//!
//! Uploads artifacts strictly sequentially, in insertion order. Per
//! artifact one retry-wrapped unit of three sub-steps: request a grant,
//! transfer the bytes, record the public reference from the grant.
//! Sequential on purpose: progress stays meaningful and monotonic, a
//! mobile uplink is not saturated with parallel transfers, and failures
//! name a definite "file N of M".

use std::sync::Arc;

use tokio::sync::mpsc;

use minbar_core::constants::UPLOAD_CATEGORY;
use minbar_core::{CapturedImage, Progress, SubmitError, UploadGrantRequest, UploadedArtifact};

use crate::broker::StorageBroker;
use crate::retry::RetryPolicy;

pub struct UploadOrchestrator {
    broker: Arc<dyn StorageBroker>,
    retry: RetryPolicy,
    owner_id: String,
}

impl UploadOrchestrator {
    pub fn new(broker: Arc<dyn StorageBroker>, retry: RetryPolicy, owner_id: String) -> Self {
        Self {
            broker,
            retry,
            owner_id,
        }
    }

    /// Upload every artifact in order, producing the registration
    /// projections. Progress `(index + 1, total)` is sent as each
    /// artifact's unit starts — it denotes "artifact currently being
    /// processed", not "artifacts fully done".
    #[tracing::instrument(skip(self, artifacts, progress_tx), fields(total = artifacts.len()))]
    pub async fn upload_all(
        &self,
        artifacts: &[CapturedImage],
        progress_tx: &mpsc::UnboundedSender<Progress>,
    ) -> Result<Vec<UploadedArtifact>, SubmitError> {
        let total = artifacts.len();
        let mut uploaded = Vec::with_capacity(total);

        for (index, artifact) in artifacts.iter().enumerate() {
            let _ = progress_tx.send(Progress::new(index + 1, total));
            tracing::info!(
                artifact_id = %artifact.id,
                kind = ?artifact.kind,
                position = index + 1,
                total,
                "Uploading artifact"
            );

            let request = UploadGrantRequest {
                owner_id: self.owner_id.clone(),
                file_name: format!("{}.{}", artifact.id, artifact.extension()),
                category: UPLOAD_CATEGORY.to_string(),
                content_type: artifact.content_type.clone(),
            };

            let broker = self.broker.clone();
            let content_type = artifact.content_type.clone();
            let data = artifact.data.clone();
            let public_url = self
                .retry
                .run("upload_artifact", move || {
                    let broker = broker.clone();
                    let request = request.clone();
                    let content_type = content_type.clone();
                    let data = data.clone();
                    async move {
                        let grant = broker.request_grant(&request).await?;
                        broker
                            .transfer(&grant.upload_url, &content_type, data)
                            .await?;
                        // The durable reference comes from the grant,
                        // not from the transfer response.
                        Ok(grant.public_url)
                    }
                })
                .await?;

            let projection = artifact.to_uploaded(public_url).ok_or_else(|| {
                SubmitError::InvalidState(format!(
                    "Artifact {} has no period tag",
                    artifact.file_name
                ))
            })?;
            uploaded.push(projection);
        }

        Ok(uploaded)
    }
}
