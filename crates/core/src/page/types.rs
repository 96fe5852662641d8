//! Core page data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived lifecycle state of a page.
///
/// State machine flow:
/// ```text
/// Submitted -> Finished   (result fetched, downloaded stamped)
/// Submitted -> Expired    (remote job no longer retrievable)
/// ```
/// Both `Finished` and `Expired` are terminal; a terminal page is never
/// revisited by polling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Job submitted to the remote service, result not yet retrieved.
    Submitted,
    /// Recognition result was downloaded.
    Finished,
    /// Remote job expired before the result could be retrieved.
    Expired,
}

impl PageState {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PageState::Submitted)
    }

    /// Returns the state as a string (for diagnostics).
    pub fn as_str(&self) -> &'static str {
        match self {
            PageState::Submitted => "submitted",
            PageState::Finished => "finished",
            PageState::Expired => "expired",
        }
    }
}

impl std::fmt::Display for PageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted record of a single submitted recognition job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    /// Job identifier assigned by the remote service. Unique and immutable.
    pub process_id: i64,

    /// Repository identifier of the page. Absent in single-page flows that
    /// bypass the repository. Re-submissions create additional rows with the
    /// same pid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,

    /// Recognition model the job was submitted with.
    pub htr_id: i64,

    /// True from creation until a terminal outcome is recorded.
    pub in_progress: bool,

    /// Identity on whose behalf the job was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Submission time.
    pub uploaded: DateTime<Utc>,

    /// Set only when the recognition result was successfully retrieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded: Option<DateTime<Utc>>,
}

impl Page {
    /// Derive the lifecycle state from the stored fields.
    pub fn state(&self) -> PageState {
        if self.in_progress {
            PageState::Submitted
        } else if self.downloaded.is_some() {
            PageState::Finished
        } else {
            PageState::Expired
        }
    }
}

/// Request to record a freshly submitted job.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub process_id: i64,
    pub pid: Option<String>,
    pub htr_id: i64,
    pub user: Option<String>,
}
