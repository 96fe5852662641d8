//! Scoped staging directories.
//!
//! Every intermediate artifact of a pipeline run lives in a directory named
//! after the run id, owned by the operation that created it and removed on
//! every exit path, including failures.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// A run-scoped staging directory. Created lazily via [`StagingDir::ensure`],
/// deleted recursively when dropped.
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Derive the directory path for a stage label and run id. Nothing is
    /// created on disk until [`ensure`](Self::ensure) is called.
    pub fn new(root: Option<&Path>, label: &str, run_id: Uuid) -> Self {
        let base = root
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            path: base.join(format!("scrivano_{}_{}", label, run_id.simple())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory if needed and return its path.
    pub fn ensure(&self) -> io::Result<&Path> {
        std::fs::create_dir_all(&self.path)?;
        Ok(&self.path)
    }

    /// Sorted regular files currently in the directory. A directory that was
    /// never created reads as empty.
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove staging directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// The file listing the page pids of one run. A provided file belongs to the
/// caller; a scoped one is removed when the run is done with it.
pub enum PidFile {
    Provided(PathBuf),
    Scoped(PathBuf),
}

impl PidFile {
    pub fn path(&self) -> &Path {
        match self {
            PidFile::Provided(path) | PidFile::Scoped(path) => path,
        }
    }

    /// Path for a run-scoped pid file.
    pub fn scoped_path(root: Option<&Path>, run_id: Uuid) -> PathBuf {
        let base = root
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        base.join(format!("scrivano_pids_{}.txt", run_id.simple()))
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let PidFile::Scoped(path) = self {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove pid file {}: {}", path.display(), e);
                }
            }
        }
    }
}
