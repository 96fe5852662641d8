//! Error type for pipeline runs.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::hocr::HocrError;
use crate::htr::HtrError;
use crate::page::PageError;
use crate::tools::ToolError;

/// Errors that abort a pipeline run.
///
/// Staging directories are cleaned up on every path out of a run; page rows
/// already marked terminal stay as they are.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An external tool exited nonzero.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The remote recognition service failed.
    #[error(transparent)]
    Htr(#[from] HtrError),

    /// The page store failed.
    #[error(transparent)]
    Page(#[from] PageError),

    /// Markup processing failed.
    #[error(transparent)]
    Hocr(#[from] HocrError),

    /// Neither a page identifier nor a pid file was given.
    #[error("Either a page identifier or a pid file must be given")]
    MissingPageSet,

    /// A polling loop ran past its configured bound.
    #[error("Polling deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// A single-file stage found something other than exactly one file.
    #[error("Expected exactly one file in {}, found {count}", dir.display())]
    SingleFileExpected { dir: PathBuf, count: usize },

    /// I/O error around staging.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
