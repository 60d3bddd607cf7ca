//! HTTP API: prediction endpoints plus health checks and Prometheus metrics
//!
//! Thin wrappers only; all prediction semantics live in `predictor-lib`.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    extractor::SymptomExtractor,
    health::{components, ComponentStatus, HealthRegistry},
    models::{
        DiseasePrediction, PatientRecord, SymptomMap, DEFAULT_TOP_K, DISCLAIMER, MAX_TOP_K,
        MIN_TOP_K,
    },
    triage, DiseasePredictor, PredictorError, PredictorMetrics, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<DiseasePredictor>,
    pub extractor: Arc<dyn SymptomExtractor>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: Arc<DiseasePredictor>,
        extractor: Arc<dyn SymptomExtractor>,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor,
            extractor,
            health_registry,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn error_response(err: PredictorError) -> (StatusCode, Json<ErrorBody>) {
    let status = if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Prediction request: demographics plus binary symptom flags
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub animal_type: String,
    pub age: f64,
    pub size: String,
    pub life_stage: String,
    pub weight_kg: f64,
    pub sex: String,
    pub vaccination_up_to_date: u8,
    #[serde(default)]
    pub symptoms: HashMap<String, i64>,
    #[serde(default)]
    pub vitals: HashMap<String, f64>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<DiseasePrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<f64>,
    pub disclaimer: String,
    pub generated_at: i64,
}

/// Validate symptom values and top_k, returning the checked inputs
fn validate_inputs(
    symptoms: &HashMap<String, i64>,
    top_k: Option<usize>,
) -> Result<(SymptomMap, usize), String> {
    let mut flags = SymptomMap::new();
    for (name, value) in symptoms {
        match *value {
            0 | 1 => {
                flags.insert(name.clone(), *value as u8);
            }
            other => {
                return Err(format!("symptom '{name}' must be 0 or 1, got {other}"));
            }
        }
    }

    let top_k = top_k.unwrap_or(DEFAULT_TOP_K);
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        return Err(format!(
            "top_k must be between {MIN_TOP_K} and {MAX_TOP_K}, got {top_k}"
        ));
    }

    Ok((flags, top_k))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> impl IntoResponse {
    let (symptoms, top_k) = match validate_inputs(&request.symptoms, request.top_k) {
        Ok(v) => v,
        Err(message) => return bad_request(message).into_response(),
    };

    let record = PatientRecord {
        animal_type: request.animal_type,
        age: request.age,
        size: request.size,
        life_stage: request.life_stage,
        weight_kg: request.weight_kg,
        sex: request.sex,
        vaccination_up_to_date: request.vaccination_up_to_date,
        vitals: request.vitals,
    };

    match state.predictor.predict_refined(&record, &symptoms, top_k) {
        Ok(predictions) => {
            if let Some(top) = predictions.first() {
                let checksum = state
                    .predictor
                    .model_info()
                    .checksum
                    .unwrap_or_default();
                state.logger.log_prediction(
                    &record.animal_type,
                    &top.disease,
                    top.probability,
                    predictions.len(),
                    &checksum,
                );
            }
            let response = PredictResponse {
                predictions,
                model_accuracy: state.predictor.model_info().test_accuracy,
                disclaimer: DISCLAIMER.to_string(),
                generated_at: chrono::Utc::now().timestamp(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}

/// Free-text prediagnosis request; missing demographics take defaults
#[derive(Debug, Deserialize)]
pub struct PrediagnoseRequest {
    pub text: String,
    pub animal_type: Option<String>,
    pub age: Option<f64>,
    pub size: Option<String>,
    pub life_stage: Option<String>,
    pub weight_kg: Option<f64>,
    pub sex: Option<String>,
    pub vaccination_up_to_date: Option<u8>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PrediagnoseResponse {
    pub predictions: Vec<DiseasePrediction>,
    pub detected_symptoms: Vec<String>,
    pub symptom_burden: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency_alert: Option<String>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<f64>,
    pub disclaimer: String,
}

/// Life stage from age when the caller did not provide one
fn infer_life_stage(animal_type: &str, age: f64) -> String {
    let is_cat = animal_type.to_lowercase().contains("gat") || animal_type.to_lowercase().contains("cat");
    if age < 1.0 {
        if is_cat { "Kitten" } else { "Puppy" }.to_string()
    } else if age < 7.0 {
        "Adult".to_string()
    } else {
        "Senior".to_string()
    }
}

async fn prediagnose(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PrediagnoseRequest>,
) -> impl IntoResponse {
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        return bad_request(format!(
            "top_k must be between {MIN_TOP_K} and {MAX_TOP_K}, got {top_k}"
        ))
        .into_response();
    }

    let symptoms = state.extractor.extract(&request.text);

    let animal_type = request.animal_type.unwrap_or_else(|| "Perro".to_string());
    let age = request.age.unwrap_or(3.0);
    let life_stage = request
        .life_stage
        .unwrap_or_else(|| infer_life_stage(&animal_type, age));

    let record = PatientRecord {
        animal_type,
        age,
        size: request.size.unwrap_or_else(|| "Medium".to_string()),
        life_stage,
        weight_kg: request.weight_kg.unwrap_or(15.0),
        sex: request.sex.unwrap_or_else(|| "Male".to_string()),
        vaccination_up_to_date: request.vaccination_up_to_date.unwrap_or(0),
        vitals: HashMap::new(),
    };

    let predictions = match state.predictor.predict_refined(&record, &symptoms, top_k) {
        Ok(predictions) => predictions,
        Err(err) => return error_response(err).into_response(),
    };

    let urgency_alert = triage::assess_urgency(&symptoms);
    if let Some(alert) = urgency_alert {
        state.logger.log_urgency(&record.animal_type, alert);
    }
    let recommendation = triage::recommendation(predictions.first(), urgency_alert);
    let symptom_burden = match triage::symptom_burden(&symptoms) {
        triage::SymptomBurden::High => "high",
        triage::SymptomBurden::Medium => "medium",
        triage::SymptomBurden::Low => "low",
    }
    .to_string();

    let mut detected_symptoms: Vec<String> = symptoms
        .iter()
        .filter(|(_, v)| **v == 1)
        .map(|(k, _)| k.clone())
        .collect();
    detected_symptoms.sort();

    let response = PrediagnoseResponse {
        predictions,
        detected_symptoms,
        symptom_burden,
        urgency_alert: urgency_alert.map(String::from),
        recommendation,
        model_accuracy: state.predictor.model_info().test_accuracy,
        disclaimer: DISCLAIMER.to_string(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub symptoms: SymptomMap,
    pub symptoms_list: Vec<String>,
}

async fn extract_symptoms(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> impl IntoResponse {
    let symptoms = state.extractor.extract(&request.text);
    let mut symptoms_list: Vec<String> = symptoms.keys().cloned().collect();
    symptoms_list.sort();

    Json(ExtractResponse {
        symptoms,
        symptoms_list,
    })
}

async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.model_info())
}

#[derive(Debug, Serialize)]
struct SymptomsResponse {
    symptoms: Vec<String>,
    total: usize,
}

async fn symptoms_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Mirrors load state: empty until a bundle is loaded
    let symptoms = state.predictor.symptom_vocabulary();
    let total = symptoms.len();
    Json(SymptomsResponse { symptoms, total })
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    message: String,
    model_type: Option<String>,
}

async fn reload_model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.predictor.reload() {
        Ok(info) => {
            state.logger.log_model_reload(true, "reload requested via API");
            state
                .health_registry
                .set_healthy(components::MODEL_STORE)
                .await;
            (
                StatusCode::OK,
                Json(ReloadResponse {
                    message: "Model bundle reloaded".to_string(),
                    model_type: info.model_type,
                }),
            )
                .into_response()
        }
        Err(err) => {
            state.logger.log_model_reload(false, &err.to_string());
            error_response(err).into_response()
        }
    }
}

/// Health check: 200 while operational, 503 once any component fails
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/prediagnose", post(prediagnose))
        .route("/api/v1/extract-symptoms", post(extract_symptoms))
        .route("/api/v1/model/info", get(model_info))
        .route("/api/v1/model/reload", post(reload_model))
        .route("/api/v1/symptoms", get(symptoms_list))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
