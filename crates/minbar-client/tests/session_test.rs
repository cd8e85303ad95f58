//! End-to-end session scenarios with mock collaborators.

mod helpers;

use helpers::*;
use minbar_core::{Period, Progress, Step, SubmitError, ValidationState};

#[tokio::test]
async fn test_jpeg_and_csv_end_to_end() {
    let mut h = harness();

    // Add one valid JPEG and tag it "day"
    let advanced = h.session.add_file(jpeg_file("board.jpg")).await.unwrap();
    assert!(advanced);
    assert_eq!(h.session.flow().step(), Step::PeriodSelection);
    h.session.tag_period(Period::Day).unwrap();
    assert_eq!(h.session.flow().step(), Step::Review);

    // Add one valid CSV and tag it "week"
    let advanced = h.session.add_file(csv_file("times.csv")).await.unwrap();
    assert!(advanced);
    h.session.tag_period(Period::Week).unwrap();

    h.session.set_contact_email(Some("a@b.com".into()));
    assert!(h.session.flow().can_submit());

    let response = h.session.submit().await.unwrap();
    assert_eq!(response.queue_id, "queue-1");
    assert_eq!(h.session.flow().step(), Step::Success);

    // Two grants, two transfers, one registration
    assert_eq!(h.broker.grants.lock().unwrap().len(), 2);
    assert_eq!(h.broker.transfers.lock().unwrap().len(), 2);
    let registrations = h.review_queue.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);

    let registration = &registrations[0];
    assert_eq!(registration.submission_type, "prayer_times_document_set");
    assert_eq!(registration.owner_id, OWNER_ID);
    assert_eq!(registration.data.contact_email.as_deref(), Some("a@b.com"));
    let periods: Vec<_> = registration.data.artifacts.iter().map(|a| a.period).collect();
    assert_eq!(periods, vec![Period::Day, Period::Week]);
}

#[tokio::test]
async fn test_pdf_minority_valid_stays_in_analyzing() {
    let mut h = harness_with_pdf_pages(4);
    h.validator.push_valid();
    h.validator.push_valid();
    h.validator.push_invalid();
    h.validator.push_invalid();

    // 2 of 4 is not a strict majority
    let advanced = h.session.add_file(pdf_file("ramadan.pdf")).await.unwrap();
    assert!(!advanced);
    assert_eq!(h.session.flow().step(), Step::Analyzing);
    assert_eq!(h.session.flow().artifacts().len(), 4);
}

#[tokio::test]
async fn test_pdf_majority_valid_advances() {
    let mut h = harness_with_pdf_pages(5);
    h.validator.push_valid();
    h.validator.push_valid();
    h.validator.push_valid();
    h.validator.push_invalid();
    h.validator.push_invalid();

    let advanced = h.session.add_file(pdf_file("ramadan.pdf")).await.unwrap();
    assert!(advanced);
    assert_eq!(h.session.flow().step(), Step::PeriodSelection);

    // Every page keeps the parent document's name for grouping
    for artifact in h.session.flow().artifacts() {
        assert_eq!(artifact.origin_file_name.as_deref(), Some("ramadan.pdf"));
    }
}

#[tokio::test]
async fn test_pdf_pages_are_capped_to_free_slots() {
    let mut h = harness_with_pdf_pages(8);

    // Fill 10 of 12 slots with images
    for i in 0..10 {
        h.session
            .add_file(jpeg_file(&format!("img{}.jpg", i)))
            .await
            .unwrap();
        h.session.tag_period(Period::Day).unwrap();
    }

    // An 8-page PDF only contributes the 2 remaining slots
    h.session.add_file(pdf_file("big.pdf")).await.unwrap();
    assert_eq!(h.session.flow().artifacts().len(), 12);
}

#[tokio::test]
async fn test_conversion_progress_resets_per_extraction() {
    let mut h = harness_with_pdf_pages(2);
    h.session.add_file(pdf_file("ramadan.pdf")).await.unwrap();
    assert_eq!(h.session.flow().conversion_progress(), Progress::new(2, 2));

    // A second document failing before any page renders must not leave
    // the previous document's progress behind
    let bogus = minbar_core::SourceFile::new(
        "shawwal.pdf",
        "application/pdf",
        bytes::Bytes::from_static(b"not a pdf"),
    );
    let err = h.session.add_file(bogus).await.unwrap_err();
    assert!(matches!(err, SubmitError::Extraction(_)));
    assert_eq!(h.session.flow().conversion_progress(), Progress::default());
}

#[tokio::test]
async fn test_image_without_declared_type_gets_extension_content_type() {
    let mut h = harness();
    let file = minbar_core::SourceFile::new(
        "board.png",
        "",
        bytes::Bytes::from_static(b"png bytes"),
    );
    h.session.add_file(file).await.unwrap();
    assert_eq!(h.session.flow().artifacts()[0].content_type, "image/png");
    h.session.tag_period(Period::Day).unwrap();

    // The grant declares the derived type, not a hardcoded JPEG
    h.session.submit().await.unwrap();
    let grants = h.broker.grants.lock().unwrap();
    assert_eq!(grants[0].content_type, "image/png");
}

#[tokio::test]
async fn test_zero_page_pdf_is_a_terminal_extraction_failure() {
    let mut h = harness_with_pdf_pages(0);
    let err = h.session.add_file(pdf_file("broken.pdf")).await.unwrap_err();
    assert!(matches!(err, SubmitError::Extraction(_)));
    assert!(h.session.flow().artifacts().is_empty());
}

#[tokio::test]
async fn test_validator_transport_failure_marks_artifact_errored() {
    let mut h = harness();
    h.validator.push_error();

    let advanced = h.session.add_file(jpeg_file("board.jpg")).await.unwrap();
    assert!(!advanced);

    let artifact = &h.session.flow().artifacts()[0];
    assert!(matches!(artifact.validation, ValidationState::Errored(_)));
    assert!(!artifact.validation.is_valid());

    // Retrying validation (next scripted outcome defaults to valid)
    // advances the artifact
    let id = artifact.id;
    let advanced = h.session.retry_validation(id).await.unwrap();
    assert!(advanced);
    assert_eq!(h.session.flow().step(), Step::PeriodSelection);
}

#[tokio::test(start_paused = true)]
async fn test_failed_registration_returns_to_review_and_retry_succeeds() {
    let mut h = harness();
    h.review_queue
        .fail_next
        .store(1, std::sync::atomic::Ordering::SeqCst);

    h.session.add_file(jpeg_file("board.jpg")).await.unwrap();
    h.session.tag_period(Period::Month).unwrap();

    let err = h.session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Server { status: 500, .. }));
    assert_eq!(h.session.flow().step(), Step::Review);
    assert!(h.session.flow().last_error().is_some());
    // Tagging survives the failure
    assert_eq!(h.session.flow().artifacts()[0].period, Some(Period::Month));

    // Retry without re-tagging
    let response = h.session.submit().await.unwrap();
    assert_eq!(response.queue_id, "queue-1");
    assert_eq!(h.session.flow().step(), Step::Success);
}

#[tokio::test(start_paused = true)]
async fn test_transient_transfer_failure_is_retried_transparently() {
    let mut h = harness();
    h.broker
        .fail_transfers
        .store(2, std::sync::atomic::Ordering::SeqCst);

    h.session.add_file(jpeg_file("board.jpg")).await.unwrap();
    h.session.tag_period(Period::Day).unwrap();

    let response = h.session.submit().await.unwrap();
    assert_eq!(response.queue_id, "queue-1");
    // Three grant requests were made (one per attempt), one transfer landed
    assert_eq!(h.broker.grants.lock().unwrap().len(), 3);
    assert_eq!(h.broker.transfers.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_upload_names_the_failing_file() {
    let mut h = harness();
    h.broker
        .fail_transfers
        .store(usize::MAX, std::sync::atomic::Ordering::SeqCst);

    h.session.add_file(jpeg_file("board.jpg")).await.unwrap();
    h.session.tag_period(Period::Day).unwrap();
    h.session.add_file(csv_file("times.csv")).await.unwrap();
    h.session.tag_period(Period::Week).unwrap();

    let err = h.session.submit().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(h.session.flow().step(), Step::Review);
    let message = h.session.flow().last_error().unwrap();
    assert!(message.contains("file 1 of 2"));
    assert!(message.contains("check your internet connection"));
}

#[tokio::test]
async fn test_reset_revokes_previews_for_undeleted_artifacts() {
    let mut h = harness_with_pdf_pages(3);
    h.session.add_file(pdf_file("ramadan.pdf")).await.unwrap();
    assert_eq!(h.session.flow().artifacts().len(), 3);

    h.session.reset();
    assert_eq!(h.previews.revoked.lock().unwrap().len(), 3);
    assert_eq!(h.session.flow().step(), Step::Capture);
}

#[tokio::test]
async fn test_oversized_file_is_rejected_up_front() {
    let mut h = harness();
    let big = minbar_core::SourceFile::new(
        "huge.jpg",
        "image/jpeg",
        bytes::Bytes::from(vec![0u8; MAX_TEST_FILE_SIZE + 1]),
    );
    let err = h.session.add_file(big).await.unwrap_err();
    assert!(matches!(err, SubmitError::PayloadTooLarge(_)));
    assert!(err.client_message().contains("smaller file"));
    assert!(h.session.flow().artifacts().is_empty());
}

#[tokio::test]
async fn test_unsupported_file_is_rejected() {
    let mut h = harness();
    let file = minbar_core::SourceFile::new(
        "notes.txt",
        "text/plain",
        bytes::Bytes::from_static(b"not a timetable"),
    );
    let err = h.session.add_file(file).await.unwrap_err();
    assert!(matches!(err, SubmitError::UnsupportedFile(_)));
}
