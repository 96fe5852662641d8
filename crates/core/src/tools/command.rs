//! Shared subprocess runner.

use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::ToolError;

/// Run a command to completion, capturing its standard error stream.
/// A nonzero exit becomes a `ToolError::Failed` carrying that stream.
pub(crate) async fn run_and_capture(program: &str, args: &[String]) -> Result<(), ToolError> {
    debug!(program, ?args, "Running external tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound {
                    program: program.to_string(),
                }
            } else {
                ToolError::Spawn {
                    program: program.to_string(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_successful_command() {
        run_and_capture("sh", &args(&["-c", "exit 0"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_nonzero_exit_captures_stderr() {
        let err = run_and_capture("sh", &args(&["-c", "echo bad input >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            ToolError::Failed {
                program,
                code,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, 3);
                assert!(stderr.contains("bad input"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_and_capture("scrivano-no-such-tool", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }
}
