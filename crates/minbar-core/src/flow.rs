//! Flow state machine.
//!
//! Owns the ordered artifact collection and the current step, enforces
//! legal step transitions, and derives submit-readiness. One instance
//! per submission session; collaborators (validator, extractor, upload
//! orchestrator) never mutate this state directly — they return values
//! that the session applies through the methods here.

use std::sync::Arc;

use uuid::Uuid;

use crate::constants::MAX_ARTIFACTS;
use crate::error::SubmitError;
use crate::models::{CapturedImage, Period, Progress, ValidationState};
use crate::preview::PreviewStore;

/// Steps of the submission flow, in nominal forward order.
///
/// Back-edges: `ImageDetail -> Review` (inspect one artifact and return)
/// and `Review -> Capture` (add another artifact). A failed submission
/// returns to `Review`, never to a dead-end error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Capture,
    Analyzing,
    PeriodSelection,
    Review,
    ImageDetail,
    Submitting,
    Success,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Capture => "capture",
            Step::Analyzing => "analyzing",
            Step::PeriodSelection => "period_selection",
            Step::Review => "review",
            Step::ImageDetail => "image_detail",
            Step::Submitting => "submitting",
            Step::Success => "success",
        };
        write!(f, "{}", name)
    }
}

/// The flow aggregate. Artifacts are held in insertion order, which is
/// also the upload and registration order.
pub struct SubmissionFlow {
    step: Step,
    artifacts: Vec<CapturedImage>,
    active_index: usize,
    contact_email: Option<String>,
    last_error: Option<String>,
    upload_progress: Progress,
    conversion_progress: Progress,
    previews: Arc<dyn PreviewStore>,
}

impl SubmissionFlow {
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            step: Step::Capture,
            artifacts: Vec::new(),
            active_index: 0,
            contact_email: None,
            last_error: None,
            upload_progress: Progress::default(),
            conversion_progress: Progress::default(),
            previews,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn artifacts(&self) -> &[CapturedImage] {
        &self.artifacts
    }

    pub fn artifact(&self, id: Uuid) -> Option<&CapturedImage> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.contact_email.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn upload_progress(&self) -> Progress {
        self.upload_progress
    }

    pub fn conversion_progress(&self) -> Progress {
        self.conversion_progress
    }

    /// Remaining artifact slots. The page extractor's output is capped
    /// to this before validation.
    pub fn free_slots(&self) -> usize {
        MAX_ARTIFACTS - self.artifacts.len()
    }

    /// Insert a batch of artifacts and force the flow into `Analyzing`,
    /// before any validation verdict lands. A batch that would exceed
    /// capacity is rejected without mutating anything.
    pub fn begin_analysis(&mut self, batch: Vec<CapturedImage>) -> Result<Vec<Uuid>, SubmitError> {
        match self.step {
            Step::Submitting | Step::Success => {
                return Err(SubmitError::InvalidState(format!(
                    "Cannot add files while in step {}",
                    self.step
                )));
            }
            _ => {}
        }
        if batch.is_empty() {
            return Err(SubmitError::InvalidState("Empty batch".to_string()));
        }
        if self.artifacts.len() + batch.len() > MAX_ARTIFACTS {
            return Err(SubmitError::CapacityExceeded {
                current: self.artifacts.len(),
                max: MAX_ARTIFACTS,
                requested: batch.len(),
            });
        }

        self.active_index = self.artifacts.len();
        let ids: Vec<Uuid> = batch.iter().map(|a| a.id).collect();
        self.artifacts.extend(batch);
        self.step = Step::Analyzing;
        self.last_error = None;

        tracing::info!(
            batch_size = ids.len(),
            total = self.artifacts.len(),
            "Artifacts entered analysis"
        );
        Ok(ids)
    }

    /// Write a validation result back to one artifact.
    pub fn apply_validation(
        &mut self,
        id: Uuid,
        state: ValidationState,
    ) -> Result<(), SubmitError> {
        let artifact = self
            .artifacts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| SubmitError::InvalidState(format!("Unknown artifact {}", id)))?;
        artifact.validation = state;
        Ok(())
    }

    /// Decide whether a just-analyzed batch advances the flow.
    ///
    /// The batch advances to `PeriodSelection` iff a strict majority of
    /// its members carries a valid verdict (`valid * 2 > total`). A
    /// single image or CSV is a batch of one. Otherwise the flow stays
    /// in `Analyzing` so the operator can see which pages failed and
    /// retry or remove them.
    pub fn conclude_analysis(&mut self, batch_ids: &[Uuid]) -> bool {
        let present: Vec<&CapturedImage> = self
            .artifacts
            .iter()
            .filter(|a| batch_ids.contains(&a.id))
            .collect();
        if present.is_empty() {
            // Whole batch was removed while analyzing; results discarded.
            return false;
        }
        let valid = present.iter().filter(|a| a.validation.is_valid()).count();
        let advanced = valid * 2 > present.len();

        if advanced {
            if let Some(first) = present.first() {
                let first_id = first.id;
                self.active_index = self
                    .artifacts
                    .iter()
                    .position(|a| a.id == first_id)
                    .unwrap_or(0);
            }
            self.step = Step::PeriodSelection;
        }

        tracing::info!(
            valid,
            total = present.len(),
            advanced,
            "Analysis concluded for batch"
        );
        advanced
    }

    /// Tag the artifact at `active_index` with a period and move to
    /// review.
    pub fn tag_active_period(&mut self, period: Period) -> Result<(), SubmitError> {
        match self.step {
            Step::PeriodSelection | Step::Review | Step::ImageDetail => {}
            _ => {
                return Err(SubmitError::InvalidState(format!(
                    "Cannot tag a period in step {}",
                    self.step
                )));
            }
        }
        let index = self.active_index;
        let artifact = self.artifacts.get_mut(index).ok_or_else(|| {
            SubmitError::InvalidState(format!("No artifact at index {}", index))
        })?;
        artifact.period = Some(period);
        self.step = Step::Review;
        Ok(())
    }

    /// Remove one artifact, releasing its preview handle exactly once.
    /// Removing the last remaining artifact forces the flow back to
    /// `Capture`.
    pub fn remove_artifact(&mut self, id: Uuid) -> Result<(), SubmitError> {
        let index = self
            .artifacts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| SubmitError::InvalidState(format!("Unknown artifact {}", id)))?;

        let mut removed = self.artifacts.remove(index);
        if let Some(preview) = removed.preview.take() {
            self.previews.revoke(preview);
        }

        if self.artifacts.is_empty() {
            self.step = Step::Capture;
            self.active_index = 0;
        } else {
            if self.active_index >= self.artifacts.len() {
                self.active_index = self.artifacts.len() - 1;
            }
            self.reconsider_analysis();
        }
        Ok(())
    }

    /// Removing an artifact can flip the majority verdict of a batch
    /// that failed to advance. Re-evaluate over every remaining
    /// artifact, once none is still awaiting its validation call.
    fn reconsider_analysis(&mut self) {
        if self.step != Step::Analyzing {
            return;
        }
        let settled = self.artifacts.iter().all(|a| {
            !matches!(
                a.validation,
                ValidationState::Pending | ValidationState::Analyzing
            )
        });
        if !settled {
            return;
        }
        let valid = self
            .artifacts
            .iter()
            .filter(|a| a.validation.is_valid())
            .count();
        if valid * 2 > self.artifacts.len() {
            self.active_index = self
                .artifacts
                .iter()
                .position(|a| a.period.is_none())
                .unwrap_or(0);
            self.step = Step::PeriodSelection;
            tracing::info!(
                valid,
                total = self.artifacts.len(),
                "Majority restored after removal"
            );
        }
    }

    /// Derived, never stored: true iff there is at least one artifact
    /// and every artifact carries a valid verdict, a period tag, and no
    /// in-flight analysis.
    pub fn can_submit(&self) -> bool {
        !self.artifacts.is_empty() && self.artifacts.iter().all(|a| a.is_submittable())
    }

    /// Inspect one artifact's detail (`Review -> ImageDetail`).
    pub fn open_detail(&mut self, index: usize) -> Result<(), SubmitError> {
        if self.step != Step::Review {
            return Err(SubmitError::InvalidState(format!(
                "Cannot open detail from step {}",
                self.step
            )));
        }
        if index >= self.artifacts.len() {
            return Err(SubmitError::InvalidState(format!(
                "No artifact at index {}",
                index
            )));
        }
        self.active_index = index;
        self.step = Step::ImageDetail;
        Ok(())
    }

    /// Return from detail to review (`ImageDetail -> Review`).
    pub fn close_detail(&mut self) -> Result<(), SubmitError> {
        if self.step != Step::ImageDetail {
            return Err(SubmitError::InvalidState(format!(
                "Not in image detail (step {})",
                self.step
            )));
        }
        self.step = Step::Review;
        Ok(())
    }

    /// Back-edge for adding another artifact (`Review -> Capture`).
    pub fn resume_capture(&mut self) -> Result<(), SubmitError> {
        if self.step != Step::Review {
            return Err(SubmitError::InvalidState(format!(
                "Cannot resume capture from step {}",
                self.step
            )));
        }
        self.step = Step::Capture;
        Ok(())
    }

    pub fn set_contact_email(&mut self, email: Option<String>) {
        self.contact_email = email.filter(|e| !e.trim().is_empty());
    }

    pub fn set_upload_progress(&mut self, progress: Progress) {
        self.upload_progress = progress;
    }

    pub fn set_conversion_progress(&mut self, progress: Progress) {
        self.conversion_progress = progress;
    }

    /// Enter `Submitting`, gated by [`SubmissionFlow::can_submit`].
    pub fn begin_submission(&mut self) -> Result<(), SubmitError> {
        if !self.can_submit() {
            return Err(SubmitError::InvalidState(
                "Not ready to submit: every file needs a valid verdict and a period".to_string(),
            ));
        }
        self.step = Step::Submitting;
        self.last_error = None;
        self.upload_progress = Progress::new(0, self.artifacts.len());
        Ok(())
    }

    /// A failed submission goes back to `Review` with the error
    /// recorded, preserving every artifact and its tagging so the
    /// operator can retry without re-tagging.
    pub fn fail_submission(&mut self, message: String) {
        tracing::warn!(error = %message, "Submission failed, returning to review");
        self.step = Step::Review;
        self.last_error = Some(message);
    }

    pub fn complete_submission(&mut self) {
        self.step = Step::Success;
        self.last_error = None;
    }

    /// Bulk teardown: every remaining preview handle is revoked exactly
    /// once, covering artifacts never individually removed.
    pub fn reset(&mut self) {
        for mut artifact in self.artifacts.drain(..) {
            if let Some(preview) = artifact.preview.take() {
                self.previews.revoke(preview);
            }
        }
        self.step = Step::Capture;
        self.active_index = 0;
        self.contact_email = None;
        self.last_error = None;
        self.upload_progress = Progress::default();
        self.conversion_progress = Progress::default();
    }
}
