//! Configuration module
//!
//! Environment-based configuration for the submission pipeline. All
//! values come from environment variables (with `.env` support via
//! dotenvy) so the CLI and any embedding process configure the pipeline
//! the same way.

use std::env;

use crate::constants;
use crate::SubmitError;

/// Pipeline configuration, one instance per process.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the backend that issues upload grants and hosts the
    /// review queue.
    pub api_url: String,
    /// API key sent as `X-API-Key` on every collaborator request.
    pub api_key: String,
    /// Identifier of the masjid this submission belongs to.
    pub owner_id: String,
    /// Path to the `pdftoppm` binary used to rasterize PDF pages.
    pub pdftoppm_path: String,
    /// Maximum accepted size for a single source file, in bytes.
    pub max_file_size_bytes: usize,
    /// Timeout for collaborator HTTP requests, in seconds.
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `MINBAR_API_URL` and `MINBAR_OWNER_ID` are required;
    /// `MINBAR_API_KEY`, `MINBAR_PDFTOPPM_PATH`, `MINBAR_MAX_FILE_SIZE`,
    /// and `MINBAR_HTTP_TIMEOUT_SECS` have defaults.
    pub fn from_env() -> Result<Self, SubmitError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("MINBAR_API_URL")
            .map_err(|_| SubmitError::Internal("MINBAR_API_URL is not set".to_string()))?;
        let owner_id = env::var("MINBAR_OWNER_ID")
            .map_err(|_| SubmitError::Internal("MINBAR_OWNER_ID is not set".to_string()))?;
        let api_key = env::var("MINBAR_API_KEY").unwrap_or_default();
        let pdftoppm_path =
            env::var("MINBAR_PDFTOPPM_PATH").unwrap_or_else(|_| "pdftoppm".to_string());
        let max_file_size_bytes = env::var("MINBAR_MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(constants::MAX_FILE_SIZE_BYTES);
        let http_timeout_secs = env::var("MINBAR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(constants::HTTP_TIMEOUT_SECS);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            owner_id,
            pdftoppm_path,
            max_file_size_bytes,
            http_timeout_secs,
        })
    }
}
