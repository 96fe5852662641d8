//! Per-invocation pipeline options.

use std::path::PathBuf;

/// Repository flags shared by every verb, overriding configured defaults.
#[derive(Debug, Clone, Default)]
pub struct RepoOptions {
    pub root: Option<String>,
    pub user: Option<String>,
    pub uri: Option<String>,
}

/// Options for uploading a document's pages.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub repo: RepoOptions,
    /// Item whose pages are resolved through the repository.
    pub pid: Option<String>,
    /// Pre-resolved page pid file; takes precedence over `pid`.
    pub pid_file: Option<PathBuf>,
    /// Recognition model to submit with.
    pub htr_id: i64,
    /// Identity recorded on the page rows.
    pub user: Option<String>,
    /// Submit even when a live or published job exists for a page.
    pub overwrite: bool,
}

/// Options for the single-page recognition flow.
#[derive(Debug, Clone)]
pub struct SinglePageOptions {
    pub htr_id: i64,
}

/// Options for regenerating plain-text datastreams from published markup.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    pub repo: RepoOptions,
    pub pid: Option<String>,
    pub pid_file: Option<PathBuf>,
}
