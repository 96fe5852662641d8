use std::sync::Arc;
use std::time::Duration;

use scrivano_core::{
    Config, DrushRepository, HtrClient, ImageMagickConverter, PageStore, PipelineRun,
    SanitizedConfig, Throttle, XsltTransformer,
};

/// Shared application state.
///
/// The page store, recognition client, and throttle are shared across
/// requests; each request gets its own `PipelineRun` so staging stays
/// isolated per request.
pub struct AppState {
    config: Config,
    store: Arc<dyn PageStore>,
    htr: Arc<dyn HtrClient>,
    throttle: Arc<Throttle>,
    repository: Arc<DrushRepository>,
    raster: Arc<ImageMagickConverter>,
    transformer: Arc<XsltTransformer>,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn PageStore>, htr: Arc<dyn HtrClient>) -> Self {
        let throttle = Arc::new(Throttle::new(Duration::from_secs(
            config.pipeline.submit_interval_secs,
        )));
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.htr.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            store,
            htr,
            throttle,
            repository: Arc::new(DrushRepository::new()),
            raster: Arc::new(ImageMagickConverter::new()),
            transformer: Arc::new(XsltTransformer::new()),
            http,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Build a fresh run for one request.
    pub fn create_run(
        &self,
    ) -> PipelineRun<DrushRepository, ImageMagickConverter, XsltTransformer> {
        PipelineRun::new(
            self.config.pipeline.clone(),
            self.config.repository.clone(),
            Arc::clone(&self.store),
            Arc::clone(&self.htr),
            Arc::clone(&self.throttle),
            Arc::clone(&self.repository),
            Arc::clone(&self.raster),
            Arc::clone(&self.transformer),
        )
    }

    /// Fetch the source file a request references.
    pub async fn fetch_resource(&self, uri: &str) -> reqwest::Result<Vec<u8>> {
        let response = self.http.get(uri).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
