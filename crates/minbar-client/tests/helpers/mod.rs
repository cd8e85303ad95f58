//! Test helpers: mock collaborators and session wiring.
//!
//! Run from workspace root: `cargo test -p minbar-client --test session_test`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use minbar_client::broker::StorageBroker;
use minbar_client::review_queue::ReviewQueue;
use minbar_client::validator::ContentValidator;
use minbar_client::{RetryPolicy, SubmissionSession, UploadOrchestrator};
use minbar_core::{
    ArtifactKind, PreviewRef, PreviewStore, RegistrationRequest, RegistrationResponse, SourceFile,
    SubmitError, UploadGrant, UploadGrantRequest, Verdict,
};
use minbar_processing::{ExtractError, PageExtractor, PageRenderer};

pub const OWNER_ID: &str = "masjid-42";
pub const MAX_TEST_FILE_SIZE: usize = 1024 * 1024;

/// Validator that pops scripted outcomes, defaulting to a valid verdict.
#[derive(Default)]
pub struct ScriptedValidator {
    script: Mutex<VecDeque<Result<Verdict, SubmitError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn push_valid(&self) {
        self.script.lock().unwrap().push_back(Ok(valid_verdict()));
    }

    pub fn push_invalid(&self) {
        self.script.lock().unwrap().push_back(Ok(Verdict {
            is_valid: false,
            message: "No timetable found".into(),
            detected_prayers: vec![],
            detected_times: vec![],
        }));
    }

    pub fn push_error(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(SubmitError::Connectivity("refused".into())));
    }
}

#[async_trait]
impl ContentValidator for ScriptedValidator {
    async fn validate(&self, _kind: ArtifactKind, _data: &Bytes) -> Result<Verdict, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(valid_verdict()))
    }
}

pub fn valid_verdict() -> Verdict {
    Verdict {
        is_valid: true,
        message: "Prayer timetable detected".into(),
        detected_prayers: vec!["Fajr".into(), "Maghrib".into()],
        detected_times: vec!["05:12".into(), "20:41".into()],
    }
}

/// Broker recording every grant and transfer.
#[derive(Default)]
pub struct RecordingBroker {
    pub grants: Mutex<Vec<UploadGrantRequest>>,
    pub transfers: Mutex<Vec<String>>,
    pub fail_transfers: AtomicUsize,
}

#[async_trait]
impl StorageBroker for RecordingBroker {
    async fn request_grant(
        &self,
        request: &UploadGrantRequest,
    ) -> Result<UploadGrant, SubmitError> {
        self.grants.lock().unwrap().push(request.clone());
        Ok(UploadGrant {
            upload_url: format!("https://bucket.example.com/put/{}", request.file_name),
            public_url: format!("https://cdn.example.com/{}", request.file_name),
        })
    }

    async fn transfer(
        &self,
        upload_url: &str,
        _content_type: &str,
        _data: Bytes,
    ) -> Result<(), SubmitError> {
        let remaining = self.fail_transfers.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_transfers.store(remaining - 1, Ordering::SeqCst);
            return Err(SubmitError::Connectivity("reset by peer".into()));
        }
        self.transfers.lock().unwrap().push(upload_url.to_string());
        Ok(())
    }
}

/// Review queue recording registrations; optionally failing first.
#[derive(Default)]
pub struct RecordingReviewQueue {
    pub registrations: Mutex<Vec<RegistrationRequest>>,
    pub fail_next: AtomicUsize,
}

#[async_trait]
impl ReviewQueue for RecordingReviewQueue {
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationResponse, SubmitError> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(SubmitError::Server {
                status: 500,
                message: "queue unavailable".into(),
            });
        }
        self.registrations.lock().unwrap().push(request.clone());
        Ok(RegistrationResponse {
            queue_id: "queue-1".into(),
        })
    }
}

/// Preview store counting revocations.
#[derive(Default)]
pub struct CountingPreviewStore {
    pub revoked: Mutex<Vec<String>>,
}

impl PreviewStore for CountingPreviewStore {
    fn create(&self, artifact_id: Uuid, _data: &Bytes) -> PreviewRef {
        PreviewRef::new(format!("preview:{}", artifact_id))
    }

    fn revoke(&self, preview: PreviewRef) {
        self.revoked.lock().unwrap().push(preview.token().to_string());
    }
}

/// Renderer producing `pages` synthetic PNG pages per document.
pub struct FakeRenderer {
    pub pages: usize,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn page_count(&self, _data: &[u8]) -> Result<usize, ExtractError> {
        if self.pages == 0 {
            // An unreadable document: the count probe and every render
            // both come up empty.
            return Err(ExtractError::UnknownPageCount);
        }
        Ok(self.pages)
    }

    async fn render_page(&self, _data: &[u8], page: usize) -> Result<Bytes, ExtractError> {
        if page > self.pages {
            return Err(ExtractError::PageOutOfRange(page));
        }
        Ok(Bytes::from(format!("png page {}", page)))
    }
}

/// Everything a scenario needs to observe the collaborators.
pub struct TestHarness {
    pub session: SubmissionSession,
    pub validator: Arc<ScriptedValidator>,
    pub broker: Arc<RecordingBroker>,
    pub review_queue: Arc<RecordingReviewQueue>,
    pub previews: Arc<CountingPreviewStore>,
}

pub fn harness_with_pdf_pages(pages: usize) -> TestHarness {
    let validator = Arc::new(ScriptedValidator::default());
    let broker = Arc::new(RecordingBroker::default());
    let review_queue = Arc::new(RecordingReviewQueue::default());
    let previews = Arc::new(CountingPreviewStore::default());

    let session = SubmissionSession::new(
        validator.clone(),
        PageExtractor::new(Arc::new(FakeRenderer { pages })),
        UploadOrchestrator::new(broker.clone(), RetryPolicy::default(), OWNER_ID.into()),
        review_queue.clone(),
        previews.clone(),
        OWNER_ID.into(),
        MAX_TEST_FILE_SIZE,
    );

    TestHarness {
        session,
        validator,
        broker,
        review_queue,
        previews,
    }
}

pub fn harness() -> TestHarness {
    harness_with_pdf_pages(1)
}

pub fn jpeg_file(name: &str) -> SourceFile {
    SourceFile::new(name, "image/jpeg", Bytes::from_static(b"jpeg bytes"))
}

pub fn csv_file(name: &str) -> SourceFile {
    SourceFile::new(name, "text/csv", Bytes::from_static(b"prayer,time\nfajr,05:12"))
}

pub fn pdf_file(name: &str) -> SourceFile {
    SourceFile::new(
        name,
        "application/pdf",
        Bytes::from_static(b"%PDF-1.4 synthetic timetable"),
    )
}
