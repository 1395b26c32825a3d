//! Environmental Quality Score Service - Main Entry Point
//!
//! Loads the air, water and soil models once, then serves assessments over HTTP.

use anyhow::{Context, Result};
use environmental_quality_api::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::InferenceEngine,
    narrative::{NarrativeGenerator, Narrator},
    server,
    service::AssessmentService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "environmental_quality_api={0},eqs_server={0},tower_http=info",
                config.level
            ))
        })
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Environmental Quality Score service");
    info!(
        "Scoring: weights air={:.2} water={:.2} soil={:.2}, water scale {:?}, categories {:?}",
        config.scoring.weights.air,
        config.scoring.weights.water,
        config.scoring.weights.soil,
        config.scoring.water_scale,
        config.scoring.category_scheme
    );

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());

    // Load models once; they stay immutable for the life of the process
    let engine = Arc::new(InferenceEngine::new(&config)?);
    info!("Inference engine ready with models: {:?}", engine.model_names());

    let narrator = Narrator::from_config(&config.narrative)?;
    info!(enabled = narrator.is_enabled(), "Narrative generator configured");

    let service = Arc::new(AssessmentService::new(
        engine,
        narrator,
        metrics.clone(),
        Duration::from_millis(config.narrative.timeout_ms),
    ));

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.server.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, server::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
