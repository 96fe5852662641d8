//! Mock repository tool for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{Datastream, RepoContext, Repository, ToolError};

/// A file captured from a publish call.
#[derive(Debug, Clone)]
pub struct PushedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// One recorded publish call with a snapshot of the directory contents.
#[derive(Debug, Clone)]
pub struct PushedDirectory {
    pub dir: PathBuf,
    pub files: Vec<PushedFile>,
}

/// Mock implementation of the `Repository` trait.
///
/// Serves registered fixture datastreams into the destination directory and
/// snapshots pushed directories for assertions.
#[derive(Debug, Default)]
pub struct MockRepository {
    page_pids: Arc<RwLock<Vec<String>>>,
    datastreams: Arc<RwLock<HashMap<&'static str, Vec<PushedFile>>>>,
    pushed: Arc<RwLock<Vec<PushedDirectory>>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page pids written out by `fetch_page_ids`.
    pub async fn set_page_pids(&self, pids: &[&str]) {
        *self.page_pids.write().await = pids.iter().map(|p| p.to_string()).collect();
    }

    /// Register a fixture file served by `fetch_datastreams` for a kind.
    pub async fn add_datastream(&self, dsid: Datastream, name: &str, bytes: &[u8]) {
        self.datastreams
            .write()
            .await
            .entry(dsid.dsid())
            .or_default()
            .push(PushedFile {
                name: name.to_string(),
                bytes: bytes.to_vec(),
            });
    }

    /// All recorded publish calls, in order.
    pub async fn pushed(&self) -> Vec<PushedDirectory> {
        self.pushed.read().await.clone()
    }

    /// Make the next call fail like a nonzero tool exit.
    pub async fn fail_next(&self, stderr: &str) {
        *self.next_error.write().await = Some(stderr.to_string());
    }

    async fn take_error(&self) -> Result<(), ToolError> {
        if let Some(stderr) = self.next_error.write().await.take() {
            return Err(ToolError::Failed {
                program: "drush".to_string(),
                code: 1,
                stderr,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MockRepository {
    async fn fetch_page_ids(
        &self,
        _ctx: &RepoContext,
        _item_pid: &str,
        pid_file: &Path,
    ) -> Result<(), ToolError> {
        self.take_error().await?;
        let pids = self.page_pids.read().await.join("\n");
        std::fs::write(pid_file, pids)?;
        Ok(())
    }

    async fn fetch_datastreams(
        &self,
        _ctx: &RepoContext,
        _pid_file: &Path,
        dest_dir: &Path,
        dsid: Datastream,
    ) -> Result<(), ToolError> {
        self.take_error().await?;
        std::fs::create_dir_all(dest_dir)?;
        if let Some(files) = self.datastreams.read().await.get(dsid.dsid()) {
            for file in files {
                std::fs::write(dest_dir.join(&file.name), &file.bytes)?;
            }
        }
        Ok(())
    }

    async fn push_datastreams(
        &self,
        _ctx: &RepoContext,
        source_dir: &Path,
    ) -> Result<(), ToolError> {
        self.take_error().await?;

        let mut files = Vec::new();
        for entry in std::fs::read_dir(source_dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(PushedFile {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    bytes: std::fs::read(&path)?,
                });
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));

        self.pushed.write().await.push(PushedDirectory {
            dir: source_dir.to_path_buf(),
            files,
        });
        Ok(())
    }
}
