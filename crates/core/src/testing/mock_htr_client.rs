//! Mock recognition client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::htr::{HtrClient, HtrError, FINISHED_STATUS};

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub model_id: i64,
    pub image: Vec<u8>,
}

/// Mock implementation of the `HtrClient` trait.
///
/// Provides controllable behavior for testing:
/// - Track submissions for assertions
/// - Script job statuses and results
/// - Expire jobs to exercise the not-found path
/// - Simulate submission failures
#[derive(Debug, Default)]
pub struct MockHtrClient {
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    statuses: Arc<RwLock<HashMap<i64, String>>>,
    results: Arc<RwLock<HashMap<i64, String>>>,
    expired: Arc<RwLock<HashSet<i64>>>,
    next_process_id: Arc<RwLock<i64>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockHtrClient {
    pub fn new() -> Self {
        Self {
            next_process_id: Arc::new(RwLock::new(1000)),
            ..Self::default()
        }
    }

    /// All recorded submissions.
    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Script the status string returned for a job.
    pub async fn set_status(&self, process_id: i64, status: &str) {
        self.statuses
            .write()
            .await
            .insert(process_id, status.to_string());
    }

    /// Mark a job finished with the given result document.
    pub async fn finish(&self, process_id: i64, result_xml: &str) {
        self.set_status(process_id, FINISHED_STATUS).await;
        self.results
            .write()
            .await
            .insert(process_id, result_xml.to_string());
    }

    /// Make status and result calls for a job answer not-found.
    pub async fn expire(&self, process_id: i64) {
        self.expired.write().await.insert(process_id);
    }

    /// Make the next submission fail with a service error.
    pub async fn fail_next_submit(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }
}

#[async_trait]
impl HtrClient for MockHtrClient {
    async fn submit(&self, model_id: i64, image: &[u8]) -> Result<i64, HtrError> {
        if let Some(message) = self.next_error.write().await.take() {
            return Err(HtrError::Api {
                status: 500,
                body: message,
            });
        }

        let process_id = {
            let mut next = self.next_process_id.write().await;
            let id = *next;
            *next += 1;
            id
        };

        self.submissions.write().await.push(RecordedSubmission {
            model_id,
            image: image.to_vec(),
        });
        // Keep a status scripted ahead of the submission.
        self.statuses
            .write()
            .await
            .entry(process_id)
            .or_insert_with(|| "RUNNING".to_string());

        Ok(process_id)
    }

    async fn status(&self, process_id: i64) -> Result<String, HtrError> {
        if self.expired.read().await.contains(&process_id) {
            return Err(HtrError::JobExpired { process_id });
        }
        self.statuses
            .read()
            .await
            .get(&process_id)
            .cloned()
            .ok_or(HtrError::JobExpired { process_id })
    }

    async fn result(&self, process_id: i64) -> Result<String, HtrError> {
        if self.expired.read().await.contains(&process_id) {
            return Err(HtrError::JobExpired { process_id });
        }
        self.results
            .read()
            .await
            .get(&process_id)
            .cloned()
            .ok_or(HtrError::JobExpired { process_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::htr::is_finished;

    #[tokio::test]
    async fn test_submit_assigns_sequential_ids() {
        let client = MockHtrClient::new();
        let first = client.submit(5, b"a").await.unwrap();
        let second = client.submit(5, b"b").await.unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(client.submissions().await.len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_finish() {
        let client = MockHtrClient::new();
        let id = client.submit(5, b"a").await.unwrap();
        assert!(!is_finished(&client.status(id).await.unwrap()));

        client.finish(id, "<alto/>").await;
        assert!(is_finished(&client.status(id).await.unwrap()));
        assert_eq!(client.result(id).await.unwrap(), "<alto/>");
    }

    #[tokio::test]
    async fn test_expired_job() {
        let client = MockHtrClient::new();
        let id = client.submit(5, b"a").await.unwrap();
        client.expire(id).await;

        let err = client.status(id).await.unwrap_err();
        assert!(err.is_expired());
        let err = client.result(id).await.unwrap_err();
        assert!(err.is_expired());
    }

    #[tokio::test]
    async fn test_fail_next_submit_is_one_shot() {
        let client = MockHtrClient::new();
        client.fail_next_submit("boom").await;
        assert!(client.submit(5, b"a").await.is_err());
        assert!(client.submit(5, b"a").await.is_ok());
    }
}
