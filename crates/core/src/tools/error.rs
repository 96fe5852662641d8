//! Error types for external tool invocations.

use thiserror::Error;

/// Errors that can occur running an external tool.
///
/// Tool failures are never retried: the captured standard error stream is
/// carried up to the run's top level.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be found.
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    /// The process could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The process exited with a nonzero code.
    #[error("{program} exited with code {code}{}", format_stderr(.stderr))]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    /// I/O error around the invocation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        ".".to_string()
    } else {
        format!(": {}", stderr.trim())
    }
}
