//! Page storage trait.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::page::{NewPage, Page};

/// Error type for page store operations.
#[derive(Debug)]
pub enum PageError {
    /// No page with that process id.
    NotFound(i64),
    /// A page with that process id already exists.
    Duplicate(i64),
    /// The page already reached a terminal state.
    AlreadyTerminal { process_id: i64, state: String },
    /// Database error.
    Database(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::NotFound(id) => write!(f, "Page not found: process {}", id),
            PageError::Duplicate(id) => write!(f, "Page already recorded: process {}", id),
            PageError::AlreadyTerminal { process_id, state } => write!(
                f,
                "Page for process {} is already {}, cannot transition again",
                process_id, state
            ),
            PageError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for PageError {}

/// Trait for page storage backends.
pub trait PageStore: Send + Sync {
    /// Record a freshly submitted job. In-progress, not downloaded.
    fn insert(&self, page: NewPage) -> Result<Page, PageError>;

    /// Get a page by its process id.
    fn get(&self, process_id: i64) -> Result<Option<Page>, PageError>;

    /// All pages still awaiting a terminal outcome.
    fn in_progress(&self) -> Result<Vec<Page>, PageError>;

    /// Number of pages still awaiting a terminal outcome.
    fn count_in_progress(&self) -> Result<i64, PageError>;

    /// All pages recorded for a repository identifier, newest first.
    fn pages_for(&self, pid: &str) -> Result<Vec<Page>, PageError>;

    /// Pages for a repository identifier that block a non-override
    /// re-submission: still in progress, or already downloaded.
    fn conflicts_for(&self, pid: &str) -> Result<Vec<Page>, PageError>;

    /// Record a successful result retrieval. Terminal.
    fn mark_finished(
        &self,
        process_id: i64,
        downloaded: DateTime<Utc>,
    ) -> Result<Page, PageError>;

    /// Record that the remote job expired before retrieval. Terminal,
    /// `downloaded` stays unset.
    fn mark_expired(&self, process_id: i64) -> Result<Page, PageError>;
}
