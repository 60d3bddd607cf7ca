//! Integration tests for the prediction API endpoints
//!
//! The binary crate exposes no library target, so the thin handlers are
//! rebuilt here around the real `predictor-lib` core and driven with
//! `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    models::{PatientRecord, SymptomMap, DISCLAIMER},
    DiseasePredictor, ModelStore, StoreConfig,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Clone)]
struct AppState {
    predictor: Arc<DiseasePredictor>,
    health_registry: HealthRegistry,
}

#[derive(serde::Deserialize)]
struct PredictRequest {
    animal_type: String,
    age: f64,
    size: String,
    life_stage: String,
    weight_kg: f64,
    sex: String,
    vaccination_up_to_date: u8,
    #[serde(default)]
    symptoms: HashMap<String, i64>,
    top_k: Option<usize>,
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> impl IntoResponse {
    let mut symptoms = SymptomMap::new();
    for (name, value) in &request.symptoms {
        match *value {
            0 | 1 => {
                symptoms.insert(name.clone(), *value as u8);
            }
            other => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("symptom '{name}' must be 0 or 1, got {other}") })),
                )
                    .into_response();
            }
        }
    }

    let top_k = request.top_k.unwrap_or(3);
    if !(1..=10).contains(&top_k) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "top_k must be between 1 and 10" })),
        )
            .into_response();
    }

    let record = PatientRecord {
        animal_type: request.animal_type,
        age: request.age,
        size: request.size,
        life_stage: request.life_stage,
        weight_kg: request.weight_kg,
        sex: request.sex,
        vaccination_up_to_date: request.vaccination_up_to_date,
        vitals: HashMap::new(),
    };

    match state.predictor.predict_refined(&record, &symptoms, top_k) {
        Ok(predictions) => (
            StatusCode::OK,
            Json(json!({
                "predictions": predictions,
                "disclaimer": DISCLAIMER,
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.model_info())
}

async fn reload_model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.predictor.reload() {
        Ok(info) => (StatusCode::OK, Json(json!({ "model_type": info.model_type }))).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK,
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

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/model/info", get(model_info))
        .route("/api/v1/model/reload", post(reload_model))
        .with_state(state)
}

/// Write a complete artifact set the store can load
fn write_artifacts(dir: &std::path::Path) {
    let classifier = json!({
        "model_type": "LogisticRegression",
        "classes": ["Gastroenteritis", "Moquillo", "Parvovirosis"],
        "feature_names": [
            "animal_type", "age", "size", "life_stage", "weight_kg", "sex",
            "vaccination_up_to_date", "fever", "vomiting", "diarrhea",
            "lethargy", "sneezing"
        ],
        "coefficients": [
            [0.0, 0.1, 0.0, 0.0, 0.05, 0.0, 0.0, 0.2, 0.8, 0.9, 0.1, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.2, 0.4, 0.0, 0.0, 0.3, 1.2],
            [0.5, -0.2, 0.0, 0.1, 0.0, 0.0, -0.8, 0.6, 1.1, 1.0, 0.5, 0.0]
        ],
        "intercepts": [0.2, -0.1, -0.3]
    });
    let encoders = json!({
        "le_animal": { "classes": ["Gato", "Perro"] },
        "le_size": { "classes": ["Large", "Medium", "Small"] },
        "le_life": { "classes": ["Adult", "Kitten", "Puppy", "Senior"] },
        "le_sex": { "classes": ["Female", "Male"] },
        "le_vacc": { "classes": ["0", "1"] },
        "scaler": {
            "feature_order": ["weight_kg", "age"],
            "mean": [12.0, 4.0],
            "scale": [6.0, 3.0]
        }
    });

    std::fs::write(
        dir.join("best_model_logistic_regression.json"),
        classifier.to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("encoders_and_scaler.json"), encoders.to_string()).unwrap();
}

async fn setup_app(with_artifacts: bool) -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    if with_artifacts {
        write_artifacts(dir.path());
    }

    let store = Arc::new(ModelStore::new(StoreConfig {
        model_dir: dir.path().to_path_buf(),
        ..Default::default()
    }));
    let predictor = Arc::new(DiseasePredictor::new(store));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL_STORE).await;
    health_registry.register(components::PREDICTOR).await;

    let state = Arc::new(AppState {
        predictor,
        health_registry,
    });
    let router = create_test_router(state.clone());

    (router, state, dir)
}

fn predict_body(symptoms: serde_json::Value, top_k: Option<usize>) -> String {
    let mut body = json!({
        "animal_type": "Perro",
        "age": 3.5,
        "size": "Medium",
        "life_stage": "Adult",
        "weight_kg": 15.0,
        "sex": "Male",
        "vaccination_up_to_date": 1,
        "symptoms": symptoms,
    });
    if let Some(k) = top_k {
        body["top_k"] = json!(k);
    }
    body.to_string()
}

async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, _dir) = setup_app(true).await;

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state, _dir) = setup_app(true).await;

    let response = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state, _dir) = setup_app(true).await;
    state.health_registry.set_ready(true).await;

    let response = app
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_predict_without_artifacts_returns_503() {
    let (app, _state, _dir) = setup_app(false).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/predict",
        predict_body(json!({ "fever": 1 }), None),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("not loaded"));
}

#[tokio::test]
async fn test_predict_returns_ranked_predictions() {
    let (app, _state, _dir) = setup_app(true).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/predict",
        predict_body(
            json!({ "vomiting": 1, "diarrhea": 1, "fever": 1, "lethargy": 1 }),
            Some(3),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);

    let probs: Vec<f64> = predictions
        .iter()
        .map(|p| p["probability"].as_f64().unwrap())
        .collect();
    assert!(probs[0] >= probs[1] && probs[1] >= probs[2]);
    assert!(probs.iter().sum::<f64>() <= 1.0 + 1e-9);
    assert_eq!(body["disclaimer"].as_str().unwrap(), DISCLAIMER);
}

#[tokio::test]
async fn test_predict_top_k_one() {
    let (app, _state, _dir) = setup_app(true).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/predict",
        predict_body(json!({ "fever": 1 }), Some(1)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_top_k() {
    let (app, _state, _dir) = setup_app(true).await;

    for top_k in [0usize, 11] {
        let (status, _) = post_json(
            &app,
            "/api/v1/predict",
            predict_body(json!({}), Some(top_k)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "top_k = {top_k}");
    }
}

#[tokio::test]
async fn test_predict_rejects_non_binary_symptom_values() {
    let (app, _state, _dir) = setup_app(true).await;

    let (status, body) = post_json(
        &app,
        "/api/v1/predict",
        predict_body(json!({ "fever": 2 }), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fever"));
}

#[tokio::test]
async fn test_predict_with_empty_symptoms_succeeds() {
    let (app, _state, _dir) = setup_app(true).await;

    let (status, body) = post_json(&app, "/api/v1/predict", predict_body(json!({}), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_model_info_reflects_load_state() {
    let (app, _state, _dir) = setup_app(true).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/model/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let info: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(info["loaded"], false);

    // A prediction triggers the lazy load
    let (status, _) = post_json(&app, "/api/v1/predict", predict_body(json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/model/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let info: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(info["loaded"], true);
    assert_eq!(info["model_type"], "LogisticRegression");
    assert_eq!(info["n_classes"], 3);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_bundle_serving() {
    let (app, _state, dir) = setup_app(true).await;

    // Load via a successful prediction
    let (status, _) = post_json(&app, "/api/v1/predict", predict_body(json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);

    // Remove the artifacts, then ask for a reload
    std::fs::remove_file(dir.path().join("best_model_logistic_regression.json")).unwrap();
    let (status, _) = post_json(&app, "/api/v1/model/reload", String::from("{}")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The previously loaded bundle still answers predictions
    let (status, body) = post_json(&app, "/api/v1/predict", predict_body(json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 3);
}
