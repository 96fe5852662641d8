//! Pipeline run implementation.
//!
//! Drives pages through the recognition pipeline:
//! stage images -> convert -> submit -> poll -> transform -> publish.
//!
//! A `PipelineRun` is one isolated run: it owns a fresh run id, every staging
//! directory derives from that id, and directories are removed on every path
//! out of an operation. Concurrent runs against the same store and client do
//! not share any staging state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{PipelineConfig, RepositoryConfig};
use crate::hocr::naming::{markup_file_name, pid_from_image_name, RESULT_SUFFIX};
use crate::hocr::{run_chain, HeaderRewriter, OcrExtractor};
use crate::htr::{is_finished, HtrClient, HtrError, Throttle};
use crate::page::{NewPage, Page, PageStore};
use crate::tools::{Datastream, MarkupTransformer, RasterConverter, RepoContext, Repository};

use super::options::{OcrOptions, RepoOptions, SinglePageOptions, UploadOptions};
use super::staging::{PidFile, StagingDir};
use super::PipelineError;

/// One isolated pipeline run.
pub struct PipelineRun<R, C, T>
where
    R: Repository,
    C: RasterConverter,
    T: MarkupTransformer,
{
    config: PipelineConfig,
    repo_defaults: RepositoryConfig,
    store: Arc<dyn PageStore>,
    htr: Arc<dyn HtrClient>,
    throttle: Arc<Throttle>,
    repository: Arc<R>,
    raster: Arc<C>,
    transformer: Arc<T>,
    run_id: Uuid,
}

impl<R, C, T> PipelineRun<R, C, T>
where
    R: Repository,
    C: RasterConverter,
    T: MarkupTransformer,
{
    /// Create a run with a fresh id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PipelineConfig,
        repo_defaults: RepositoryConfig,
        store: Arc<dyn PageStore>,
        htr: Arc<dyn HtrClient>,
        throttle: Arc<Throttle>,
        repository: Arc<R>,
        raster: Arc<C>,
        transformer: Arc<T>,
    ) -> Self {
        Self {
            config,
            repo_defaults,
            store,
            htr,
            throttle,
            repository,
            raster,
            transformer,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn staging(&self, label: &str) -> StagingDir {
        StagingDir::new(self.config.staging_root.as_deref(), label, self.run_id)
    }

    fn repo_ctx(&self, options: &RepoOptions) -> RepoContext {
        RepoContext::resolve(
            &self.repo_defaults,
            options.root.clone(),
            options.user.clone(),
            options.uri.clone(),
        )
    }

    /// Upload a document: fetch its page images, convert them, and submit
    /// each one to the recognition service, recording a page row per job.
    pub async fn upload_document(&self, options: &UploadOptions) -> Result<(), PipelineError> {
        let sources = self.staging("jp2s");
        let rasters = self.staging("jpgs");
        let ctx = self.repo_ctx(&options.repo);

        let pid_file = self
            .resolve_pid_file(&ctx, options.pid.as_deref(), options.pid_file.as_deref())
            .await?;
        self.repository
            .fetch_datastreams(&ctx, pid_file.path(), sources.ensure()?, Datastream::Jp2)
            .await?;
        self.convert_sources(&sources, &rasters).await?;
        self.submit_images(&rasters, options).await?;

        Ok(())
    }

    /// Poll every submitted page once; download, transform, and publish
    /// whatever finished. Expired jobs become terminal without aborting the
    /// pass.
    pub async fn check_progress(&self, options: &RepoOptions) -> Result<(), PipelineError> {
        let results = self.staging("altos");
        let markup = self.staging("hocrs");
        let texts = self.staging("ocrs");

        self.fetch_finished_results(&results).await?;
        if results.files()?.is_empty() {
            return Ok(());
        }

        self.transform_results(&results, &markup).await?;

        let extractor = OcrExtractor::new(texts.path());
        let header = HeaderRewriter::new(None, None);
        run_chain(markup.path(), &[&extractor, &header])?;

        let ctx = self.repo_ctx(options);
        self.repository.push_datastreams(&ctx, markup.path()).await?;
        self.repository.push_datastreams(&ctx, texts.path()).await?;

        Ok(())
    }

    /// Upload a document and keep polling until no page is left in
    /// progress, bounded by the configured deadline.
    pub async fn process_document(&self, options: &UploadOptions) -> Result<(), PipelineError> {
        self.upload_document(options).await?;

        let deadline_span = Duration::from_secs(self.config.poll_deadline_secs);
        let deadline = Instant::now() + deadline_span;
        sleep(Duration::from_secs(self.config.initial_poll_delay_secs)).await;

        while self.store.count_in_progress()? > 0 {
            if Instant::now() >= deadline {
                return Err(PipelineError::DeadlineExceeded(deadline_span));
            }
            self.check_progress(&options.repo).await?;
        }

        Ok(())
    }

    /// Recognize one directly supplied image and return the finished
    /// markup. The page is tracked without a repository identifier; any
    /// non-transient error propagates.
    pub async fn process_single_page(
        &self,
        file_name: &str,
        image: &[u8],
        options: &SinglePageOptions,
    ) -> Result<Vec<u8>, PipelineError> {
        let sources = self.staging("jp2s");
        let rasters = self.staging("jpgs");
        let results = self.staging("altos");
        let markup = self.staging("hocrs");

        tokio::fs::write(sources.ensure()?.join(base_name(file_name)), image).await?;
        self.convert_sources(&sources, &rasters).await?;

        let converted = single_file(&rasters)?;
        let image_bytes = tokio::fs::read(&converted).await?;
        let process_id = self
            .throttle
            .run(|| self.htr.submit(options.htr_id, &image_bytes))
            .await?;
        self.store.insert(NewPage {
            process_id,
            pid: None,
            htr_id: options.htr_id,
            user: None,
        })?;

        let deadline_span = Duration::from_secs(self.config.poll_deadline_secs);
        let deadline = Instant::now() + deadline_span;
        loop {
            let status = self.htr.status(process_id).await?;
            if is_finished(&status) {
                break;
            }
            if Instant::now() >= deadline {
                return Err(PipelineError::DeadlineExceeded(deadline_span));
            }
            sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }

        let xml = self.htr.result(process_id).await?;
        let stem = pid_from_image_name(&converted);
        tokio::fs::write(
            results.ensure()?.join(format!("{}{}", stem, RESULT_SUFFIX)),
            xml,
        )
        .await?;
        self.store.mark_finished(process_id, Utc::now())?;

        self.transform_results(&results, &markup).await?;
        let header = HeaderRewriter::new(Some(options.htr_id), None);
        run_chain(markup.path(), &[&header])?;

        let markup_file = single_file(&markup)?;
        Ok(tokio::fs::read(&markup_file).await?)
    }

    /// Extract the plain text of one directly supplied markup file without
    /// touching the recognition service.
    pub async fn extract_single_page_text(
        &self,
        file_name: &str,
        markup_bytes: &[u8],
    ) -> Result<Vec<u8>, PipelineError> {
        let markup = self.staging("hocrs");
        let texts = self.staging("ocrs");

        tokio::fs::write(markup.ensure()?.join(base_name(file_name)), markup_bytes).await?;

        let extractor = OcrExtractor::new(texts.path());
        run_chain(markup.path(), &[&extractor])?;

        let text_file = single_file(&texts)?;
        Ok(tokio::fs::read(&text_file).await?)
    }

    /// Regenerate plain-text datastreams from already published markup.
    pub async fn generate_text_datastreams(
        &self,
        options: &OcrOptions,
    ) -> Result<(), PipelineError> {
        let markup = self.staging("hocrs");
        let texts = self.staging("ocrs");
        let ctx = self.repo_ctx(&options.repo);

        let pid_file = self
            .resolve_pid_file(&ctx, options.pid.as_deref(), options.pid_file.as_deref())
            .await?;
        self.repository
            .fetch_datastreams(&ctx, pid_file.path(), markup.ensure()?, Datastream::Hocr)
            .await?;

        let extractor = OcrExtractor::new(texts.path());
        run_chain(markup.path(), &[&extractor])?;

        self.repository.push_datastreams(&ctx, texts.path()).await?;

        Ok(())
    }

    async fn resolve_pid_file(
        &self,
        ctx: &RepoContext,
        pid: Option<&str>,
        pid_file: Option<&Path>,
    ) -> Result<PidFile, PipelineError> {
        match (pid_file, pid) {
            (Some(path), _) => Ok(PidFile::Provided(path.to_path_buf())),
            (None, Some(pid)) => {
                let path =
                    PidFile::scoped_path(self.config.staging_root.as_deref(), self.run_id);
                self.repository.fetch_page_ids(ctx, pid, &path).await?;
                Ok(PidFile::Scoped(path))
            }
            (None, None) => Err(PipelineError::MissingPageSet),
        }
    }

    async fn convert_sources(
        &self,
        sources: &StagingDir,
        rasters: &StagingDir,
    ) -> Result<(), PipelineError> {
        info!("Converting source images...");
        rasters.ensure()?;
        for source in sources.files()? {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = rasters.path().join(format!("{}.jpg", stem));
            self.raster.convert(&source, &output).await?;
        }
        Ok(())
    }

    async fn submit_images(
        &self,
        rasters: &StagingDir,
        options: &UploadOptions,
    ) -> Result<(), PipelineError> {
        info!("Uploading images to the recognition service...");
        for file in rasters.files()? {
            let pid = pid_from_image_name(&file);

            if !options.overwrite {
                let conflicts = self.store.conflicts_for(&pid)?;
                if !conflicts.is_empty() {
                    warn!("{}", conflict_diagnostic(&pid, options.htr_id, &conflicts));
                    warn!("Run with the overwrite flag to disregard this and re-upload.");
                    continue;
                }
            }

            let image = tokio::fs::read(&file).await?;
            let process_id = self
                .throttle
                .run(|| self.htr.submit(options.htr_id, &image))
                .await?;
            self.store.insert(NewPage {
                process_id,
                pid: Some(pid),
                htr_id: options.htr_id,
                user: options.user.clone(),
            })?;
        }
        Ok(())
    }

    /// Poll every in-progress page and download the results of finished
    /// jobs. A not-found answer marks the page expired and the pass moves
    /// on; any other service error aborts.
    async fn fetch_finished_results(&self, results: &StagingDir) -> Result<(), PipelineError> {
        info!("Checking for finished pages...");
        results.ensure()?;

        for page in self.store.in_progress()? {
            match self.htr.status(page.process_id).await {
                Ok(status) if !is_finished(&status) => continue,
                Ok(_) => {}
                Err(HtrError::JobExpired { .. }) => {
                    warn!("Recognition job for page {} has expired.", page_label(&page));
                    self.store.mark_expired(page.process_id)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            info!("{} is done processing, downloading...", page_label(&page));
            let xml = match self.htr.result(page.process_id).await {
                Ok(xml) => xml,
                Err(HtrError::JobExpired { .. }) => {
                    warn!("Recognition job for page {} has expired.", page_label(&page));
                    self.store.mark_expired(page.process_id)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let file_name = format!("{}{}", page_label(&page), RESULT_SUFFIX);
            tokio::fs::write(results.path().join(file_name), xml).await?;
            self.store.mark_finished(page.process_id, Utc::now())?;
        }

        Ok(())
    }

    async fn transform_results(
        &self,
        results: &StagingDir,
        markup: &StagingDir,
    ) -> Result<(), PipelineError> {
        info!("Converting recognition results to hOCR...");
        markup.ensure()?;
        for result in results.files()? {
            let output = markup.path().join(markup_file_name(&result));
            self.transformer
                .transform(&self.config.stylesheet, &result, &output)
                .await?;
        }
        Ok(())
    }
}

/// Label a page by its repository identifier, falling back to the job id.
fn page_label(page: &Page) -> String {
    page.pid
        .clone()
        .unwrap_or_else(|| page.process_id.to_string())
}

/// Diagnostic listing why each existing row blocks a re-submission.
fn conflict_diagnostic(pid: &str, htr_id: i64, conflicts: &[Page]) -> String {
    let details: Vec<String> = conflicts
        .iter()
        .map(|page| {
            let model = if page.htr_id == htr_id {
                "with the same model ".to_string()
            } else {
                format!("with another model ({}) ", page.htr_id)
            };
            let outcome = if page.in_progress {
                "and is currently processing"
            } else {
                "and its markup has already been pushed"
            };
            format!("{}{}", model, outcome)
        })
        .collect();
    format!(
        "Page {} has already been uploaded {}.",
        pid,
        details.join(", ")
    )
}

/// The one file a single-page stage is expected to hold.
fn single_file(dir: &StagingDir) -> Result<std::path::PathBuf, PipelineError> {
    let mut files = dir.files()?;
    if files.len() == 1 {
        Ok(files.remove(0))
    } else {
        Err(PipelineError::SingleFileExpected {
            dir: dir.path().to_path_buf(),
            count: files.len(),
        })
    }
}

/// Strip any directory components from an externally supplied file name.
fn base_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(process_id: i64, htr_id: i64, in_progress: bool) -> Page {
        Page {
            process_id,
            pid: Some("book:1".to_string()),
            htr_id,
            in_progress,
            user: None,
            uploaded: Utc::now(),
            downloaded: if in_progress { None } else { Some(Utc::now()) },
        }
    }

    #[test]
    fn test_conflict_diagnostic_same_model_in_progress() {
        let message = conflict_diagnostic("book:1", 5, &[page(1, 5, true)]);
        assert_eq!(
            message,
            "Page book:1 has already been uploaded with the same model and is currently processing."
        );
    }

    #[test]
    fn test_conflict_diagnostic_other_model_published() {
        let message = conflict_diagnostic("book:1", 5, &[page(1, 9, false)]);
        assert_eq!(
            message,
            "Page book:1 has already been uploaded with another model (9) and its markup has already been pushed."
        );
    }

    #[test]
    fn test_conflict_diagnostic_lists_every_row() {
        let message = conflict_diagnostic("book:1", 5, &[page(1, 5, true), page(2, 9, false)]);
        assert!(message.contains("with the same model and is currently processing"));
        assert!(message.contains("with another model (9) and its markup has already been pushed"));
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("scan_JP2.jp2"), "scan_JP2.jp2");
        assert_eq!(base_name("/srv/files/scan_JP2.jp2"), "scan_JP2.jp2");
        assert_eq!(base_name("../scan_JP2.jp2"), "scan_JP2.jp2");
    }

    #[test]
    fn test_page_label_prefers_pid() {
        assert_eq!(page_label(&page(7, 5, true)), "book:1");
        let mut anonymous = page(7, 5, true);
        anonymous.pid = None;
        assert_eq!(page_label(&anonymous), "7");
    }
}
