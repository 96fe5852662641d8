use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrivano_core::{
    load_config, validate_config, Config, DrushRepository, HtrClient, ImageMagickConverter,
    PageStore, PipelineRun, SqlitePageStore, Throttle, TranskribusClient, XsltTransformer,
};

use scrivano_server::api::create_router;
use scrivano_server::cli::{Cli, Command};
use scrivano_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Create SQLite page store
    let store: Arc<dyn PageStore> = Arc::new(
        SqlitePageStore::new(&config.database.path).context("Failed to create page store")?,
    );
    info!("Page store initialized");

    // Create recognition client
    let htr: Arc<dyn HtrClient> = Arc::new(TranskribusClient::new(config.htr.clone()));

    match cli.command {
        Command::Process(args) => {
            let htr_id = resolve_model(&config, args.htr_id)?;
            let run = create_run(&config, &store, &htr);
            run.process_document(&args.to_options(htr_id))
                .await
                .context("Document processing failed")?;
        }
        Command::Upload(args) => {
            let htr_id = resolve_model(&config, args.htr_id)?;
            let run = create_run(&config, &store, &htr);
            run.upload_document(&args.to_options(htr_id))
                .await
                .context("Document upload failed")?;
        }
        Command::Check(args) => {
            let run = create_run(&config, &store, &htr);
            run.check_progress(&args.to_options())
                .await
                .context("Progress check failed")?;
        }
        Command::Ocr(args) => {
            let run = create_run(&config, &store, &htr);
            run.generate_text_datastreams(&args.to_options())
                .await
                .context("Text datastream generation failed")?;
        }
        Command::Serve => {
            serve(config, store, htr).await?;
        }
    }

    Ok(())
}

fn resolve_model(config: &Config, htr_id: Option<i64>) -> Result<i64> {
    match htr_id.or(config.htr.default_model) {
        Some(id) => Ok(id),
        None => bail!("No recognition model given with --htr-id and none configured"),
    }
}

fn create_run(
    config: &Config,
    store: &Arc<dyn PageStore>,
    htr: &Arc<dyn HtrClient>,
) -> PipelineRun<DrushRepository, ImageMagickConverter, XsltTransformer> {
    PipelineRun::new(
        config.pipeline.clone(),
        config.repository.clone(),
        Arc::clone(store),
        Arc::clone(htr),
        Arc::new(Throttle::new(std::time::Duration::from_secs(
            config.pipeline.submit_interval_secs,
        ))),
        Arc::new(DrushRepository::new()),
        Arc::new(ImageMagickConverter::new()),
        Arc::new(XsltTransformer::new()),
    )
}

async fn serve(config: Config, store: Arc<dyn PageStore>, htr: Arc<dyn HtrClient>) -> Result<()> {
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, store, htr));
    let app = create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
