//! Core library for the veterinary disease-prediction service
//!
//! This crate provides:
//! - Model artifact loading and caching (classifier + encoders + scaler)
//! - Categorical normalization and feature-vector encoding
//! - Symptom-based inference with ranked, confidence-banded output
//! - Heuristic post-processing (species filter, symptom-coherence rules)
//! - Free-text symptom extraction and urgency triage
//! - Health checks and observability

pub mod artifacts;
pub mod error;
pub mod extractor;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod store;
pub mod triage;

pub use error::PredictorError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::DiseasePredictor;
pub use store::{ModelStore, StoreConfig};
