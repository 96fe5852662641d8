//! Repository export/publish tool contract and the drush implementation.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::config::RepositoryConfig;

use super::command::run_and_capture;
use super::ToolError;

/// Datastream kinds the pipeline exchanges with the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datastream {
    /// JPEG 2000 source page images.
    Jp2,
    /// hOCR markup produced from recognition results.
    Hocr,
}

impl Datastream {
    pub fn dsid(&self) -> &'static str {
        match self {
            Datastream::Jp2 => "JP2",
            Datastream::Hocr => "HOCR",
        }
    }
}

/// Per-invocation repository settings, resolved against config defaults.
#[derive(Debug, Clone, Default)]
pub struct RepoContext {
    pub root: Option<String>,
    pub user: Option<String>,
    pub uri: Option<String>,
}

impl RepoContext {
    /// Resolve command-line overrides against configured defaults.
    pub fn resolve(
        defaults: &RepositoryConfig,
        root: Option<String>,
        user: Option<String>,
        uri: Option<String>,
    ) -> Self {
        Self {
            root: root.or_else(|| defaults.root.clone()),
            user: user.or_else(|| defaults.user.clone()),
            uri: uri.or_else(|| defaults.uri.clone()),
        }
    }
}

/// Access to the repository's item/datastream export tool.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Resolve the page identifiers belonging to an item and write them,
    /// one per line, to `pid_file`.
    async fn fetch_page_ids(
        &self,
        ctx: &RepoContext,
        item_pid: &str,
        pid_file: &Path,
    ) -> Result<(), ToolError>;

    /// Download the named datastream of every page listed in `pid_file`
    /// into `dest_dir`.
    async fn fetch_datastreams(
        &self,
        ctx: &RepoContext,
        pid_file: &Path,
        dest_dir: &Path,
        dsid: Datastream,
    ) -> Result<(), ToolError>;

    /// Publish every file in `source_dir` back as datastreams.
    async fn push_datastreams(&self, ctx: &RepoContext, source_dir: &Path)
        -> Result<(), ToolError>;
}

/// Repository access through the drush datastream CRUD commands.
pub struct DrushRepository {
    program: String,
}

impl DrushRepository {
    pub fn new() -> Self {
        Self {
            program: "drush".to_string(),
        }
    }

    fn common_args(ctx: &RepoContext) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(root) = &ctx.root {
            args.push(format!("--root={}", root));
        }
        if let Some(user) = &ctx.user {
            args.push(format!("--user={}", user));
        }
        if let Some(uri) = &ctx.uri {
            args.push(format!("--uri={}", uri));
        }
        args
    }

    /// Solr membership query matching the pages of an item.
    fn membership_query(item_pid: &str) -> String {
        format!(
            "RELS_EXT_isMemberOf_uri_ms:info\\:fedora/{}",
            item_pid.replace(':', "\\:")
        )
    }
}

impl Default for DrushRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for DrushRepository {
    async fn fetch_page_ids(
        &self,
        ctx: &RepoContext,
        item_pid: &str,
        pid_file: &Path,
    ) -> Result<(), ToolError> {
        info!("Getting page PIDs from {}...", item_pid);
        let mut args = Self::common_args(ctx);
        args.push("idcrudfp".to_string());
        args.push(format!("--solr_query={}", Self::membership_query(item_pid)));
        args.push(format!("--pid_file={}", pid_file.display()));
        run_and_capture(&self.program, &args).await
    }

    async fn fetch_datastreams(
        &self,
        ctx: &RepoContext,
        pid_file: &Path,
        dest_dir: &Path,
        dsid: Datastream,
    ) -> Result<(), ToolError> {
        info!("Fetching {} datastreams...", dsid.dsid());
        let mut args = Self::common_args(ctx);
        args.push("idcrudfd".to_string());
        args.push("-y".to_string());
        args.push(format!("--pid_file={}", pid_file.display()));
        args.push(format!("--datastreams_directory={}", dest_dir.display()));
        args.push(format!("--dsid={}", dsid.dsid()));
        run_and_capture(&self.program, &args).await
    }

    async fn push_datastreams(
        &self,
        ctx: &RepoContext,
        source_dir: &Path,
    ) -> Result<(), ToolError> {
        info!("Pushing datastreams from {}...", source_dir.display());
        let mut args = Self::common_args(ctx);
        args.push("idcrudpd".to_string());
        args.push(format!(
            "--datastreams_source_directory={}",
            source_dir.display()
        ));
        run_and_capture(&self.program, &args).await
    }
}
