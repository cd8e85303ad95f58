use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preview::PreviewRef;

/// A raw file as handed over by the operator, before classification.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Kind of a captured artifact once it has entered the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Image,
    PdfPage,
    Csv,
}

/// The time period a timetable artifact covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Day => write!(f, "day"),
            Period::Week => write!(f, "week"),
            Period::Month => write!(f, "month"),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(format!("Unknown period: {}", other)),
        }
    }
}

/// Verdict returned by the content-validation service for one artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_valid: bool,
    pub message: String,
    #[serde(default)]
    pub detected_prayers: Vec<String>,
    #[serde(default)]
    pub detected_times: Vec<String>,
}

/// Validation lifecycle of one artifact.
///
/// `Errored` is distinct from both `Analyzing` and an invalid `Checked`
/// verdict: the validator call itself failed, the artifact was never
/// judged, and the operation is reported as failed rather than "invalid".
#[derive(Debug, Clone)]
pub enum ValidationState {
    /// Not yet attempted.
    Pending,
    /// Validation call is in flight.
    Analyzing,
    /// The validator returned a verdict.
    Checked(Verdict),
    /// The validator call failed outright.
    Errored(String),
}

impl ValidationState {
    pub fn is_analyzing(&self) -> bool {
        matches!(self, ValidationState::Analyzing)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationState::Checked(v) if v.is_valid)
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            ValidationState::Checked(v) => Some(v),
            _ => None,
        }
    }
}

/// One unit of submitted material tracked through validation, tagging,
/// and upload.
///
/// The name is kept from the running system even though it covers
/// non-image kinds (PDF pages and CSV files ride the same record).
/// `data` is exclusively owned here until upload completes; the durable
/// URL recorded by the upload orchestrator supersedes it.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub id: Uuid,
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
    pub kind: ArtifactKind,
    /// Revocable preview handle; images and PDF pages only. Revoked
    /// exactly once, on removal or on flow teardown.
    pub preview: Option<PreviewRef>,
    pub validation: ValidationState,
    pub period: Option<Period>,
    /// Parent document name for pages extracted from a multi-page PDF,
    /// used for display grouping.
    pub origin_file_name: Option<String>,
}

impl CapturedImage {
    pub fn new(
        kind: ArtifactKind,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
        preview: Option<PreviewRef>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            file_name: file_name.into(),
            content_type: content_type.into(),
            kind,
            preview,
            validation: ValidationState::Pending,
            period: None,
            origin_file_name: None,
        }
    }

    /// An artifact for one page rasterized out of a multi-page PDF.
    pub fn pdf_page(
        origin_file_name: &str,
        page_number: usize,
        data: Bytes,
        preview: Option<PreviewRef>,
    ) -> Self {
        let mut artifact = Self::new(
            ArtifactKind::PdfPage,
            format!("{} (page {})", origin_file_name, page_number),
            "image/png",
            data,
            preview,
        );
        artifact.origin_file_name = Some(origin_file_name.to_string());
        artifact
    }

    /// Whether this artifact blocks submission: it must carry a valid
    /// verdict, a period tag, and no in-flight analysis.
    pub fn is_submittable(&self) -> bool {
        self.validation.is_valid() && self.period.is_some() && !self.validation.is_analyzing()
    }

    /// Projection for registration once this artifact's durable URL is
    /// known. Requires a period tag; bytes and preview are dropped.
    pub fn to_uploaded(&self, url: String) -> Option<super::UploadedArtifact> {
        let period = self.period?;
        let (detected_prayers, detected_times) = match self.validation.verdict() {
            Some(v) => (v.detected_prayers.clone(), v.detected_times.clone()),
            None => (Vec::new(), Vec::new()),
        };
        Some(super::UploadedArtifact {
            url,
            period,
            detected_prayers,
            detected_times,
        })
    }

    /// File extension used when generating the upload object name.
    pub fn extension(&self) -> &str {
        let fallback = match self.kind {
            ArtifactKind::Image => "jpg",
            ArtifactKind::PdfPage => "png",
            ArtifactKind::Csv => "csv",
        };
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                ext
            }
            _ => fallback,
        }
    }
}
