mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slidepress_core::{
    load_config, validate_config, Converter, JobPipeline, JobRegistry, Scheduler, SofficeConverter,
    StoreClient,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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

    // Determine config path
    let config_path = std::env::var("SLIDEPRESS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!("Store backend: {:?}", config.store.backend);
    info!(
        concurrency = config.pipeline.concurrency,
        conversion_timeout_secs = config.converter.timeout_secs,
        max_input_size_mb = config.pipeline.max_input_size_mb,
        "Pipeline settings"
    );

    // Ensure the scratch directory exists before accepting jobs
    tokio::fs::create_dir_all(&config.pipeline.scratch_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create scratch directory {:?}",
                config.pipeline.scratch_dir
            )
        })?;
    info!("Scratch directory ready: {:?}", config.pipeline.scratch_dir);

    // Create store client
    let store = Arc::new(
        StoreClient::from_config(&config.store).context("Failed to create store client")?,
    );
    info!("Store client initialized");

    // Create converter and probe the engine binary. A missing binary is not
    // fatal at startup; jobs will fail with a conversion error instead.
    let converter: Arc<dyn Converter> = Arc::new(SofficeConverter::new(config.converter.clone()));
    match converter.validate().await {
        Ok(()) => info!("Converter ready: {}", converter.name()),
        Err(e) => warn!("Converter validation failed: {}", e),
    }

    // Create job registry and pipeline
    let registry = Arc::new(JobRegistry::new());
    let pipeline = Arc::new(JobPipeline::new(
        config.pipeline.clone(),
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::clone(&converter),
    ));

    // Start the worker pool
    let scheduler = Arc::new(Scheduler::start(config.pipeline.concurrency, pipeline));
    info!("Scheduler started");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&registry),
        Arc::clone(&scheduler),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop workers between jobs; an in-flight job finishes first
    info!("Server shutting down...");
    scheduler.shutdown().await;

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
