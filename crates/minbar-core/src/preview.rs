//! Preview handle lifecycle.
//!
//! Image and PDF-page artifacts carry a revocable preview handle (the
//! running system's blob URL). The handle is the one resource requiring
//! manual lifecycle management: the flow revokes it exactly once, on
//! artifact removal or on whole-flow teardown. Exactly-once is enforced
//! structurally with `Option::take` at the two release sites.

use bytes::Bytes;
use uuid::Uuid;

/// Opaque revocable handle to a derived preview resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Issues and revokes preview handles.
///
/// The flow state machine holds this as a trait object so tests can
/// count revocations and embedders can back it with whatever preview
/// mechanism their surface uses.
pub trait PreviewStore: Send + Sync {
    /// Create a preview handle for an artifact's bytes.
    fn create(&self, artifact_id: Uuid, data: &Bytes) -> PreviewRef;

    /// Release a handle. Called exactly once per issued handle.
    fn revoke(&self, preview: PreviewRef);
}

/// Store for surfaces with no preview mechanism (e.g. the CLI).
#[derive(Debug, Default)]
pub struct NoopPreviewStore;

impl PreviewStore for NoopPreviewStore {
    fn create(&self, artifact_id: Uuid, _data: &Bytes) -> PreviewRef {
        PreviewRef::new(format!("preview:{}", artifact_id))
    }

    fn revoke(&self, _preview: PreviewRef) {}
}
