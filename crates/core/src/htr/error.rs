//! Error types for the remote recognition client.

use thiserror::Error;

/// Errors that can occur talking to the remote recognition service.
#[derive(Debug, Error)]
pub enum HtrError {
    /// Authentication against the token endpoint failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The remote job is no longer retrievable. This is a distinct signal,
    /// not a failure: callers absorb it into an expired page state.
    #[error("Remote job {process_id} has expired")]
    JobExpired { process_id: i64 },

    /// Any other non-2xx response from the service.
    #[error("Recognition service returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a payload we could not interpret.
    #[error("Unexpected response from recognition service: {0}")]
    InvalidResponse(String),
}

impl HtrError {
    /// Returns true if this is the job-expiry signal rather than a failure.
    pub fn is_expired(&self) -> bool {
        matches!(self, HtrError::JobExpired { .. })
    }
}
