//! Error types module
//!
//! All failures in the submission pipeline are unified under the
//! [`SubmitError`] enum. Each variant self-describes whether it is
//! retryable and what message is safe to show the operator, so the
//! upload retry policy and the flow state machine never have to
//! pattern-match on raw diagnostics.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Connection failed: {0}")]
    Connectivity(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Could not extract pages: {0}")]
    Extraction(String),

    #[error("Capacity exceeded: {current} of {max} artifact slots used, {requested} more requested")]
    CapacityExceeded {
        current: usize,
        max: usize,
        requested: usize,
    },

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Invalid flow state: {0}")]
    InvalidState(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubmitError {
    /// Whether the retry policy may re-attempt the failed operation.
    ///
    /// Only the three network classes are retryable; everything else is
    /// surfaced on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmitError::Connectivity(_) | SubmitError::Timeout(_) | SubmitError::Server { .. }
        )
    }

    /// Short, operator-safe message. Raw diagnostic detail is collapsed
    /// into guidance the operator can act on.
    pub fn client_message(&self) -> String {
        match self {
            SubmitError::Connectivity(_) => {
                "Unable to connect. Please check your internet connection.".to_string()
            }
            SubmitError::Timeout(_) => {
                "The request took too long. Please try again.".to_string()
            }
            SubmitError::Server { .. } => {
                "The server could not process the request. Please try again shortly.".to_string()
            }
            SubmitError::PayloadTooLarge(msg) => {
                format!("{}. Please use a smaller file.", msg)
            }
            SubmitError::Unauthorized(_) => {
                "You are not authorized to submit. Please sign in again.".to_string()
            }
            SubmitError::Extraction(_) => {
                "Could not extract any pages from this PDF. Please try a different file."
                    .to_string()
            }
            SubmitError::CapacityExceeded { max, .. } => {
                format!("A submission can hold at most {} files.", max)
            }
            SubmitError::UnsupportedFile(name) => {
                format!("{} is not a supported file type.", name)
            }
            SubmitError::InvalidState(msg) => msg.clone(),
            SubmitError::Registration(_) => {
                "The submission could not be registered. Please try again.".to_string()
            }
            SubmitError::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<io::Error> for SubmitError {
    fn from(err: io::Error) -> Self {
        SubmitError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(err: serde_json::Error) -> Self {
        SubmitError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classes_are_retryable() {
        assert!(SubmitError::Connectivity("refused".into()).is_retryable());
        assert!(SubmitError::Timeout("60s elapsed".into()).is_retryable());
        assert!(SubmitError::Server {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_terminal_classes_are_not_retryable() {
        assert!(!SubmitError::PayloadTooLarge("25 MB".into()).is_retryable());
        assert!(!SubmitError::Unauthorized("expired key".into()).is_retryable());
        assert!(!SubmitError::Extraction("0 pages".into()).is_retryable());
        assert!(!SubmitError::Registration("409".into()).is_retryable());
    }

    #[test]
    fn test_client_message_hides_diagnostics() {
        let err = SubmitError::Connectivity("dns error: no record for broker.invalid".into());
        let msg = err.client_message();
        assert_eq!(msg, "Unable to connect. Please check your internet connection.");
        assert!(!msg.contains("dns"));
    }

    #[test]
    fn test_payload_too_large_keeps_guidance() {
        let err = SubmitError::PayloadTooLarge("File too large: 25 MB (max: 20 MB)".into());
        assert!(err.client_message().contains("smaller file"));
    }
}
