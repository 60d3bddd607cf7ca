//! Observability infrastructure for the prediction service
//!
//! Provides:
//! - Prometheus metrics (inference latency, prediction counts, category
//!   fallbacks, schema drift, loaded-model info)
//! - Structured JSON logging helpers for the significant domain events

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (seconds); inference is a single
/// linear-model evaluation, so the interesting range is sub-millisecond to
/// tens of milliseconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
];

/// Global metrics instance (registered once per process)
static GLOBAL_METRICS: OnceLock<PredictorMetricsInner> = OnceLock::new();

struct PredictorMetricsInner {
    inference_latency_seconds: Histogram,
    predictions_total: IntCounter,
    prediction_errors_total: IntCounter,
    category_fallbacks_total: IntCounter,
    schema_drift_total: IntCounter,
    model_info: GaugeVec,
}

impl PredictorMetricsInner {
    fn new() -> Self {
        Self {
            inference_latency_seconds: register_histogram!(
                "disease_predictor_inference_latency_seconds",
                "Time spent encoding input and evaluating the classifier",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register inference_latency_seconds"),

            predictions_total: register_int_counter!(
                "disease_predictor_predictions_total",
                "Total number of completed inference calls"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter!(
                "disease_predictor_prediction_errors_total",
                "Total number of inference calls that failed"
            )
            .expect("Failed to register prediction_errors_total"),

            category_fallbacks_total: register_int_counter!(
                "disease_predictor_category_fallbacks_total",
                "Unknown categorical values substituted with the encoder's first class"
            )
            .expect("Failed to register category_fallbacks_total"),

            schema_drift_total: register_int_counter!(
                "disease_predictor_schema_drift_total",
                "Model-declared features the encoder could not populate"
            )
            .expect("Failed to register schema_drift_total"),

            model_info: register_gauge_vec!(
                "disease_predictor_model_info",
                "Information about the currently loaded model bundle",
                &["model_type", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Lightweight handle to the global prediction metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PredictorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PredictorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_inference_latency(&self, duration_secs: f64) {
        self.inner().inference_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    pub fn add_category_fallbacks(&self, count: u64) {
        self.inner().category_fallbacks_total.inc_by(count);
    }

    pub fn add_schema_drift(&self, count: u64) {
        self.inner().schema_drift_total.inc_by(count);
    }

    /// Record the loaded bundle; resets the previous model's series
    pub fn set_model_info(&self, model_type: &str, checksum: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[model_type, checksum])
            .set(1.0);
    }
}

/// Structured logger for prediction-service events.
///
/// Keeps the `event` field consistent so downstream log queries stay simple.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_prediction(
        &self,
        animal_type: &str,
        top_disease: &str,
        probability: f64,
        n_results: usize,
        model_checksum: &str,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service_name,
            animal_type = %animal_type,
            top_disease = %top_disease,
            probability = probability,
            n_results = n_results,
            model_checksum = %model_checksum,
            "Generated disease prediction"
        );
    }

    pub fn log_urgency(&self, animal_type: &str, alert: &str) {
        warn!(
            event = "urgency_detected",
            service = %self.service_name,
            animal_type = %animal_type,
            alert = %alert,
            "Urgency criteria met"
        );
    }

    pub fn log_model_reload(&self, success: bool, detail: &str) {
        if success {
            info!(
                event = "model_reloaded",
                service = %self.service_name,
                detail = %detail,
                "Model bundle reloaded"
            );
        } else {
            warn!(
                event = "model_reload_failed",
                service = %self.service_name,
                detail = %detail,
                "Model reload failed, previous bundle kept"
            );
        }
    }

    pub fn log_startup(&self, version: &str, model_loaded: bool) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            model_loaded = model_loaded,
            "Disease prediction service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Disease prediction service shutting down"
        );
    }
}
