//! Core data models for the disease-prediction service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Disclaimer attached to every prediction response. Fixed wording: the
/// confidence thresholds below anchor this language.
pub const DISCLAIMER: &str = "This is an automated, symptom-based screening. \
It is not a substitute for examination and diagnosis by a licensed veterinarian.";

/// Default number of ranked predictions returned per inference
pub const DEFAULT_TOP_K: usize = 3;

/// Inclusive bounds accepted for `top_k`
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

/// Probability at or above which a prediction is labelled high confidence
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Probability at or above which a prediction is labelled medium confidence
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Demographic features every model generation expects, in canonical order
pub const DEMOGRAPHIC_FEATURES: [&str; 7] = [
    "animal_type",
    "age",
    "size",
    "life_stage",
    "weight_kg",
    "sex",
    "vaccination_up_to_date",
];

/// Canonical binary symptom-flag vocabulary (snake_case English).
///
/// Any symptom key outside this list is ignored at the encoder boundary;
/// any entry absent from input defaults to 0.
pub const SYMPTOM_FEATURES: [&str; 43] = [
    "fever",
    "vomiting",
    "diarrhea",
    "diarrhea_hemorrhagic",
    "loss_appetite",
    "lethargy",
    "dehydration",
    "abdominal_pain",
    "cough",
    "nasal_discharge",
    "ocular_discharge",
    "sneezing",
    "salivation",
    "mouth_ulcers",
    "conjunctivitis",
    "breathing_difficulty",
    "tachypnea",
    "weight_loss",
    "increased_thirst",
    "increased_urination",
    "increased_appetite",
    "seizures",
    "convulsions",
    "neurologic_signs",
    "alopecia",
    "itching",
    "skin_crusts",
    "thickened_skin",
    "ear_discharge",
    "ear_odor",
    "head_shaking",
    "limping",
    "stiff_gait",
    "difficulty_rising",
    "reluctance_to_jump",
    "joint_pain",
    "hyperactivity",
    "unkempt_coat",
    "wheezing",
    "open_mouth_breathing",
    "dry_cough",
    "exercise_intolerance",
    "painful_belly",
];

/// Binary symptom flags keyed by canonical symptom name, values 0/1
pub type SymptomMap = HashMap<String, u8>;

/// Demographic record for one patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub animal_type: String,
    /// Age in years
    pub age: f64,
    pub size: String,
    pub life_stage: String,
    pub weight_kg: f64,
    pub sex: String,
    /// 0 = not up to date, 1 = up to date
    pub vaccination_up_to_date: u8,
    /// Optional vital-sign scalars (e.g. "body_temperature", "heart_rate")
    /// that some artifact generations include as numeric features
    #[serde(default)]
    pub vitals: HashMap<String, f64>,
}

/// Coarse confidence band derived from a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_CONFIDENCE_THRESHOLD {
            Confidence::High
        } else if probability >= MEDIUM_CONFIDENCE_THRESHOLD {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// One ranked disease prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseasePrediction {
    pub disease: String,
    pub probability: f64,
    pub confidence: Confidence,
}

/// Snapshot of the currently loaded model, populated at load time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    pub n_features: usize,
    pub n_classes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<i64>,
    /// True when the classifier artifact itself declared its feature order
    pub feature_manifest_from_model: bool,
    pub symptoms: Vec<String>,
}

impl ModelInfo {
    /// Info reported while no bundle is loaded
    pub fn not_loaded() -> Self {
        Self {
            loaded: false,
            model_type: None,
            n_features: 0,
            n_classes: 0,
            test_accuracy: None,
            cv_mean: None,
            checksum: None,
            loaded_at: None,
            feature_manifest_from_model: false,
            symptoms: Vec::new(),
        }
    }
}

/// Returns true for features filled from the demographic record
pub fn is_demographic_feature(name: &str) -> bool {
    DEMOGRAPHIC_FEATURES.contains(&name)
}

/// Returns true for features in the canonical symptom vocabulary
pub fn is_symptom_feature(name: &str) -> bool {
    SYMPTOM_FEATURES.contains(&name)
}
