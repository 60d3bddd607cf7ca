//! Disease Predictor - symptom-based veterinary prediction service
//!
//! Loads the trained classifier bundle from disk and serves ranked,
//! confidence-banded disease predictions over HTTP.

use anyhow::Result;
use predictor_lib::{
    extractor::KeywordExtractor,
    health::{components, HealthRegistry},
    DiseasePredictor, ModelStore, PredictorMetrics, StructuredLogger,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting disease-predictor");

    // Load configuration
    let config = config::ServiceConfig::load()?;
    info!(model_dir = %config.model_dir, api_port = config.api_port, "Service configured");

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::PREDICTOR).await;
    health_registry.register(components::EXTRACTOR).await;

    // Initialize metrics and structured logger
    let metrics = PredictorMetrics::new();
    let logger = StructuredLogger::new("disease-predictor");

    // Build the model store and attempt a warm load; a missing artifact is
    // not fatal, the first predict call retries lazily
    let store = Arc::new(ModelStore::new(config.store_config()));
    match store.get_or_load() {
        Ok(bundle) => {
            metrics.set_model_info(&bundle.classifier.model_type, &bundle.metadata.checksum);
        }
        Err(e) => {
            warn!(error = %e, "Model bundle not loaded at startup");
            health_registry
                .set_degraded(components::MODEL_STORE, format!("No bundle loaded: {e}"))
                .await;
        }
    }
    let model_loaded = store.is_loaded();

    let predictor = Arc::new(DiseasePredictor::new(store));
    let extractor = Arc::new(KeywordExtractor::new());

    logger.log_startup(SERVICE_VERSION, model_loaded);

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        predictor,
        extractor,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    // Mark service as ready after initialization
    health_registry.set_ready(true).await;

    // Start the API server
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
