//! Command-line surface: verbs for the batch flows and the server, plus the
//! request arguments the HTTP façade receives through headers.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use scrivano_core::{OcrOptions, RepoOptions, UploadOptions};

#[derive(Debug, Parser)]
#[command(name = "scrivano", version, about = "HTR pipeline for repository page images")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "SCRIVANO_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a document's pages and poll until every job completes.
    Process(UploadArgs),
    /// Upload a document's pages and return.
    Upload(UploadArgs),
    /// Poll outstanding jobs once and publish whatever finished.
    Check(RepoArgs),
    /// Regenerate plain-text datastreams from published markup.
    Ocr(OcrArgs),
    /// Run the HTTP façade.
    Serve,
}

/// Repository flags shared by every verb, overriding configured defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct RepoArgs {
    #[arg(long)]
    pub root: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub uri: Option<String>,
}

impl RepoArgs {
    pub fn to_options(&self) -> RepoOptions {
        RepoOptions {
            root: self.root.clone(),
            user: self.user.clone(),
            uri: self.uri.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Item whose pages are resolved through the repository.
    #[arg(long)]
    pub pid: Option<String>,

    /// Pre-resolved page pid file; takes precedence over --pid.
    #[arg(long)]
    pub pid_file: Option<PathBuf>,

    /// Recognition model id (falls back to the configured default).
    #[arg(long)]
    pub htr_id: Option<i64>,

    /// Submit even when a live or published job exists for a page.
    #[arg(long)]
    pub overwrite: bool,
}

impl UploadArgs {
    pub fn to_options(&self, htr_id: i64) -> UploadOptions {
        UploadOptions {
            repo: self.repo.to_options(),
            pid: self.pid.clone(),
            pid_file: self.pid_file.clone(),
            htr_id,
            user: self.repo.user.clone(),
            overwrite: self.overwrite,
        }
    }
}

#[derive(Debug, Args)]
pub struct OcrArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    #[arg(long)]
    pub pid: Option<String>,

    #[arg(long)]
    pub pid_file: Option<PathBuf>,
}

impl OcrArgs {
    pub fn to_options(&self) -> OcrOptions {
        OcrOptions {
            repo: self.repo.to_options(),
            pid: self.pid.clone(),
            pid_file: self.pid_file.clone(),
        }
    }
}

/// Arguments the façade receives through the `X-Islandora-Args` header,
/// parsed after quote-aware splitting.
#[derive(Debug, Parser)]
#[command(name = "scrivano-request", no_binary_name = true)]
pub enum RequestCommand {
    /// Recognize the referenced image and return the finished markup.
    Page(PageRequestArgs),
    /// Extract plain text from the referenced markup file.
    Ocr,
}

#[derive(Debug, Args)]
pub struct PageRequestArgs {
    /// Recognition model id (falls back to the configured default).
    #[arg(long)]
    pub htr_id: Option<i64>,
}

/// Split a header value into argv-style tokens, honoring single and double
/// quotes.
pub fn split_args(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut pending = false;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
            }
            Some(_) => {
                current.push(c);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                pending = true;
            }
            None if c.is_whitespace() => {
                if pending || !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            None => {
                current.push(c);
            }
        }
    }
    if pending || !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_args() {
        assert_eq!(
            split_args("page --htr-id 42"),
            vec!["page", "--htr-id", "42"]
        );
    }

    #[test]
    fn test_split_quoted_args() {
        assert_eq!(
            split_args(r#"page --htr-id "42" 'two words'"#),
            vec!["page", "--htr-id", "42", "two words"]
        );
    }

    #[test]
    fn test_split_empty_quotes_produce_empty_token() {
        assert_eq!(split_args(r#"a "" b"#), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_collapses_whitespace() {
        assert_eq!(split_args("  ocr   "), vec!["ocr"]);
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_request_command_page() {
        let command = RequestCommand::try_parse_from(split_args("page --htr-id 42")).unwrap();
        match command {
            RequestCommand::Page(args) => assert_eq!(args.htr_id, Some(42)),
            other => panic!("Expected page command, got {:?}", other),
        }
    }

    #[test]
    fn test_request_command_ocr() {
        let command = RequestCommand::try_parse_from(split_args("ocr")).unwrap();
        assert!(matches!(command, RequestCommand::Ocr));
    }

    #[test]
    fn test_request_command_rejects_unknown_verb() {
        assert!(RequestCommand::try_parse_from(split_args("transcode")).is_err());
    }

    #[test]
    fn test_cli_parses_process_verb() {
        let cli = Cli::try_parse_from([
            "scrivano",
            "process",
            "--pid",
            "book:1",
            "--htr-id",
            "42",
            "--overwrite",
        ])
        .unwrap();
        match cli.command {
            Command::Process(args) => {
                assert_eq!(args.pid.as_deref(), Some("book:1"));
                assert_eq!(args.htr_id, Some(42));
                assert!(args.overwrite);
            }
            other => panic!("Expected process command, got {:?}", other),
        }
    }
}
