//! Remote recognition service abstraction.
//!
//! Provides an `HtrClient` trait for submitting page images to a remote
//! handwritten-text-recognition service and retrieving results, plus the
//! Transkribus implementation with its credential-refresh protocol and the
//! submission throttle.

mod error;
mod throttle;
mod token;
mod transkribus;

pub use error::HtrError;
pub use throttle::Throttle;
pub use transkribus::TranskribusClient;

use async_trait::async_trait;

/// The only job status with semantic meaning; every other value means the
/// job is still running.
pub const FINISHED_STATUS: &str = "FINISHED";

/// Returns true if the status string marks a finished job.
pub fn is_finished(status: &str) -> bool {
    status == FINISHED_STATUS
}

/// A client for the remote recognition service.
#[async_trait]
pub trait HtrClient: Send + Sync {
    /// Submit a page image for recognition with the given model.
    /// Returns the job id assigned by the service.
    async fn submit(&self, model_id: i64, image: &[u8]) -> Result<i64, HtrError>;

    /// Fetch the current status of a job.
    async fn status(&self, process_id: i64) -> Result<String, HtrError>;

    /// Fetch the finished recognition result as an XML document.
    async fn result(&self, process_id: i64) -> Result<String, HtrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_finished() {
        assert!(is_finished("FINISHED"));
        assert!(!is_finished("RUNNING"));
        assert!(!is_finished("finished"));
        assert!(!is_finished(""));
    }
}
