//! Submission session.
//!
//! The session owns the flow state machine and the collaborator seams,
//! and is the only component that mutates flow state — the classifier,
//! extractor, validator, and orchestrator return values that the
//! session applies. All I/O is sequential per session: one validation,
//! transfer, or registration call in flight at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use minbar_core::constants::SUBMISSION_TYPE;
use minbar_core::{
    classify, CapturedImage, Config, FileClass, NoopPreviewStore, Period, PreviewStore, Progress,
    RegistrationData, RegistrationRequest, RegistrationResponse, SourceFile, SubmissionFlow,
    SubmitError, ValidationState,
};
use minbar_processing::{precheck_source, PageExtractor, PdftoppmRenderer, PrecheckError};

use crate::broker::HttpStorageBroker;
use crate::orchestrator::UploadOrchestrator;
use crate::retry::RetryPolicy;
use crate::review_queue::{HttpReviewQueue, ReviewQueue};
use crate::validator::{ContentValidator, HttpContentValidator};
use crate::ApiClient;

pub struct SubmissionSession {
    flow: SubmissionFlow,
    validator: Arc<dyn ContentValidator>,
    extractor: PageExtractor,
    orchestrator: UploadOrchestrator,
    review_queue: Arc<dyn ReviewQueue>,
    previews: Arc<dyn PreviewStore>,
    owner_id: String,
    max_file_size: usize,
}

impl SubmissionSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        validator: Arc<dyn ContentValidator>,
        extractor: PageExtractor,
        orchestrator: UploadOrchestrator,
        review_queue: Arc<dyn ReviewQueue>,
        previews: Arc<dyn PreviewStore>,
        owner_id: String,
        max_file_size: usize,
    ) -> Self {
        Self {
            flow: SubmissionFlow::new(previews.clone()),
            validator,
            extractor,
            orchestrator,
            review_queue,
            previews,
            owner_id,
            max_file_size,
        }
    }

    /// Build a session wired to the HTTP collaborators and the
    /// poppler-backed page renderer.
    pub fn from_config(config: &Config) -> Result<Self, SubmitError> {
        let client = ApiClient::new(
            config.api_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?;
        let broker = Arc::new(HttpStorageBroker::new(client.clone()));
        Ok(Self::new(
            Arc::new(HttpContentValidator::new(client.clone())),
            PageExtractor::new(Arc::new(PdftoppmRenderer::new(config.pdftoppm_path.clone()))),
            UploadOrchestrator::new(broker, RetryPolicy::default(), config.owner_id.clone()),
            Arc::new(HttpReviewQueue::new(client)),
            Arc::new(NoopPreviewStore),
            config.owner_id.clone(),
            config.max_file_size_bytes,
        ))
    }

    pub fn flow(&self) -> &SubmissionFlow {
        &self.flow
    }

    /// Ingest one operator-selected file: precheck, classify, extract
    /// PDF pages if needed, validate each resulting artifact, and apply
    /// the majority rule. Returns whether the flow advanced to period
    /// selection.
    #[tracing::instrument(skip(self, file), fields(file = %file.name))]
    pub async fn add_file(&mut self, file: SourceFile) -> Result<bool, SubmitError> {
        precheck_source(&file, self.max_file_size).map_err(|e| match e {
            PrecheckError::FileTooLarge { .. } => SubmitError::PayloadTooLarge(e.to_string()),
            other => SubmitError::UnsupportedFile(other.to_string()),
        })?;

        let batch = match classify(&file.name, &file.content_type) {
            FileClass::Image => {
                let content_type = if file.content_type.is_empty() {
                    minbar_core::image_content_type_for(&file.name).to_string()
                } else {
                    file.content_type
                };
                let mut artifact = CapturedImage::new(
                    minbar_core::ArtifactKind::Image,
                    file.name,
                    content_type,
                    file.data,
                    None,
                );
                artifact.preview = Some(self.previews.create(artifact.id, &artifact.data));
                vec![artifact]
            }
            FileClass::Csv => vec![CapturedImage::new(
                minbar_core::ArtifactKind::Csv,
                file.name,
                "text/csv",
                file.data,
                None,
            )],
            FileClass::Pdf => self.extract_pdf(file).await?,
            FileClass::Unsupported => return Err(SubmitError::UnsupportedFile(file.name)),
        };

        let ids = self.flow.begin_analysis(batch)?;
        Ok(self.validate_batch(&ids).await)
    }

    /// Re-run validation for one artifact whose earlier validator call
    /// errored (or was judged invalid and replaced server-side).
    pub async fn retry_validation(&mut self, id: Uuid) -> Result<bool, SubmitError> {
        if self.flow.artifact(id).is_none() {
            return Err(SubmitError::InvalidState(format!("Unknown artifact {}", id)));
        }
        Ok(self.validate_batch(&[id]).await)
    }

    pub fn tag_period(&mut self, period: Period) -> Result<(), SubmitError> {
        self.flow.tag_active_period(period)
    }

    pub fn remove_artifact(&mut self, id: Uuid) -> Result<(), SubmitError> {
        self.flow.remove_artifact(id)
    }

    pub fn set_contact_email(&mut self, email: Option<String>) {
        self.flow.set_contact_email(email);
    }

    pub fn open_detail(&mut self, index: usize) -> Result<(), SubmitError> {
        self.flow.open_detail(index)
    }

    pub fn close_detail(&mut self) -> Result<(), SubmitError> {
        self.flow.close_detail()
    }

    pub fn resume_capture(&mut self) -> Result<(), SubmitError> {
        self.flow.resume_capture()
    }

    pub fn reset(&mut self) {
        self.flow.reset();
    }

    /// Upload every artifact in order, then register the set with the
    /// review queue. Any failure returns the flow to review with a
    /// user-safe message, preserving all tagging for a retry.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&mut self) -> Result<RegistrationResponse, SubmitError> {
        self.flow.begin_submission()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = self.orchestrator.upload_all(self.flow.artifacts(), &tx).await;
        drop(tx);
        while let Ok(progress) = rx.try_recv() {
            self.flow.set_upload_progress(progress);
        }

        let uploaded = match result {
            Ok(uploaded) => uploaded,
            Err(err) => {
                let progress = self.flow.upload_progress();
                self.flow.fail_submission(format!(
                    "Failed to upload file {} of {}: {}",
                    progress.completed.max(1),
                    progress.total,
                    err.client_message()
                ));
                return Err(err);
            }
        };

        let request = RegistrationRequest {
            submission_type: SUBMISSION_TYPE.to_string(),
            owner_id: self.owner_id.clone(),
            data: RegistrationData {
                artifacts: uploaded,
                contact_email: self.flow.contact_email().map(String::from),
            },
        };

        match self.review_queue.register(&request).await {
            Ok(response) => {
                self.flow.complete_submission();
                Ok(response)
            }
            Err(err) => {
                self.flow.fail_submission(err.client_message());
                Err(err)
            }
        }
    }

    /// Rasterize a PDF into page artifacts, capped to the free slots.
    async fn extract_pdf(&mut self, file: SourceFile) -> Result<Vec<CapturedImage>, SubmitError> {
        let free = self.flow.free_slots();
        if free == 0 {
            return Err(SubmitError::CapacityExceeded {
                current: self.flow.artifacts().len(),
                max: minbar_core::constants::MAX_ARTIFACTS,
                requested: 1,
            });
        }
        self.flow.set_conversion_progress(Progress::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = self.extractor.extract(&file.data, &tx).await;
        drop(tx);
        while let Ok(progress) = rx.try_recv() {
            self.flow.set_conversion_progress(progress);
        }
        let pages = result.map_err(|e| SubmitError::Extraction(e.to_string()))?;

        if pages.len() > free {
            // Excess pages are silently discarded rather than erroring.
            tracing::warn!(
                pages = pages.len(),
                kept = free,
                "PDF has more pages than free slots, discarding the rest"
            );
        }

        Ok(pages
            .into_iter()
            .take(free)
            .map(|page| {
                let mut artifact =
                    CapturedImage::pdf_page(&file.name, page.number, page.data, None);
                artifact.preview = Some(self.previews.create(artifact.id, &artifact.data));
                artifact
            })
            .collect())
    }

    /// Validate a batch sequentially and conclude with the majority
    /// rule. A validator transport failure marks the artifact `Errored`
    /// — a failed operation, observably distinct from "invalid".
    async fn validate_batch(&mut self, ids: &[Uuid]) -> bool {
        for id in ids {
            let (kind, data) = match self.flow.artifact(*id) {
                Some(artifact) => (artifact.kind, artifact.data.clone()),
                None => continue,
            };
            let _ = self.flow.apply_validation(*id, ValidationState::Analyzing);

            let state = match self.validator.validate(kind, &data).await {
                Ok(verdict) => {
                    tracing::info!(artifact_id = %id, is_valid = verdict.is_valid, "Artifact validated");
                    ValidationState::Checked(verdict)
                }
                Err(err) => {
                    tracing::warn!(artifact_id = %id, error = %err, "Validation call failed");
                    ValidationState::Errored(err.client_message())
                }
            };
            let _ = self.flow.apply_validation(*id, state);
        }
        self.flow.conclude_analysis(ids)
    }
}
