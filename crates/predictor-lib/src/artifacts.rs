//! Trained model artifact types
//!
//! A bundle is three JSON files in the models directory: the classifier (a
//! fitted multinomial logistic model), the paired label encoders and scaler,
//! and optional training metadata. Everything here is fitted offline and
//! immutable after load.

use crate::error::PredictorError;
use crate::models::{is_symptom_feature, DEMOGRAPHIC_FEATURES, SYMPTOM_FEATURES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Label encoder fitted at training time.
///
/// `classes` holds the known labels in code order: a label's integer code is
/// its index. The first class doubles as the documented fallback for values
/// the encoder has never seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    /// Integer code of an exact class label
    pub fn code_of(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    /// Find the stored class matching `raw` case-insensitively
    pub fn match_ignore_case(&self, raw: &str) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw))
            .map(String::as_str)
    }

    /// Deterministic fallback class for unknown input
    pub fn fallback_class(&self) -> &str {
        &self.classes[0]
    }
}

/// Fitted numeric transform (per-feature mean/scale).
///
/// Transforms by the feature order recorded at fit time, never by the order
/// features happen to appear in a record; fit order and final model order
/// have diverged across dataset generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_order: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scale a named feature value, or None if the scaler was not fitted on it
    pub fn transform(&self, name: &str, value: f64) -> Option<f64> {
        let idx = self.feature_order.iter().position(|f| f == name)?;
        let scale = self.scale[idx];
        if scale.abs() < f64::EPSILON {
            // Zero-variance feature: center only
            Some(value - self.mean[idx])
        } else {
            Some((value - self.mean[idx]) / scale)
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.feature_order.len() || self.scale.len() != self.feature_order.len() {
            return Err(format!(
                "scaler arrays disagree: {} features, {} means, {} scales",
                self.feature_order.len(),
                self.mean.len(),
                self.scale.len()
            ));
        }
        Ok(())
    }
}

/// The label encoders and scaler saved alongside the classifier.
///
/// JSON keys keep the names the training pipeline writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSet {
    #[serde(rename = "le_animal")]
    pub animal_type: LabelEncoder,
    #[serde(rename = "le_size")]
    pub size: LabelEncoder,
    #[serde(rename = "le_life")]
    pub life_stage: LabelEncoder,
    #[serde(rename = "le_sex")]
    pub sex: LabelEncoder,
    #[serde(rename = "le_vacc")]
    pub vaccination: LabelEncoder,
    pub scaler: StandardScaler,
}

impl EncoderSet {
    fn validate(&self) -> Result<(), String> {
        for (name, enc) in [
            ("le_animal", &self.animal_type),
            ("le_size", &self.size),
            ("le_life", &self.life_stage),
            ("le_sex", &self.sex),
            ("le_vacc", &self.vaccination),
        ] {
            if enc.classes.is_empty() {
                return Err(format!("{name} has no classes"));
            }
        }
        self.scaler.validate()
    }
}

/// Serialized classifier: one coefficient row and intercept per class,
/// scored with softmax over `x . w_c + b_c`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub model_type: String,
    pub classes: Vec<String>,
    /// Feature-name manifest recorded at fit time; authoritative for feature
    /// ordering when present
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl ClassifierArtifact {
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.first().map(Vec::len).unwrap_or(0)
    }

    /// Full class-probability distribution for one feature vector
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, PredictorError> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(PredictorError::FeatureMismatch {
                expected,
                got: features.len(),
            });
        }

        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, intercept)| {
                row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + intercept
            })
            .collect();

        // Softmax, shifted by the max score for numerical stability
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.iter().map(|e| e / total).collect())
    }

    fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("classifier has no classes".to_string());
        }
        if self.coefficients.len() != self.classes.len() {
            return Err(format!(
                "{} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            ));
        }
        if self.intercepts.len() != self.classes.len() {
            return Err(format!(
                "{} intercepts for {} classes",
                self.intercepts.len(),
                self.classes.len()
            ));
        }
        let width = self.n_features();
        if width == 0 {
            return Err("classifier has no features".to_string());
        }
        if self.coefficients.iter().any(|row| row.len() != width) {
            return Err("coefficient rows have inconsistent widths".to_string());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != width {
                return Err(format!(
                    "feature manifest lists {} names but coefficients have {} columns",
                    names.len(),
                    width
                ));
            }
        }
        Ok(())
    }
}

/// Optional metadata the training pipeline writes next to the model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingMetadata {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub test_accuracy: Option<f64>,
    #[serde(default)]
    pub cv_mean: Option<f64>,
    #[serde(default)]
    pub trained_at: Option<String>,
}

/// Ordered list of input features the classifier expects
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    pub names: Vec<String>,
    /// True when the ordering came from the classifier's own manifest rather
    /// than the canonical default
    pub from_model_manifest: bool,
}

impl FeatureSpec {
    pub fn from_manifest(names: Vec<String>) -> Self {
        Self {
            names,
            from_model_manifest: true,
        }
    }

    /// Canonical ordering: demographics first, then the symptom vocabulary
    pub fn canonical_default() -> Self {
        let names = DEMOGRAPHIC_FEATURES
            .iter()
            .chain(SYMPTOM_FEATURES.iter())
            .map(|s| s.to_string())
            .collect();
        Self {
            names,
            from_model_manifest: false,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Symptom-flag features this spec declares
    pub fn symptom_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| is_symptom_feature(n))
            .cloned()
            .collect()
    }
}

/// Load-time facts about a bundle
#[derive(Debug, Clone)]
pub struct BundleMetadata {
    pub model_path: PathBuf,
    pub checksum: String,
    pub loaded_at: i64,
    pub training: Option<TrainingMetadata>,
}

/// Classifier + encoders + feature spec, loaded together and shared as one
/// immutable unit
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub classifier: ClassifierArtifact,
    pub encoders: EncoderSet,
    pub feature_spec: FeatureSpec,
    pub metadata: BundleMetadata,
}

impl ModelBundle {
    /// Assemble and cross-validate a bundle; the reason string feeds
    /// `ArtifactCorrupt`
    pub fn assemble(
        classifier: ClassifierArtifact,
        encoders: EncoderSet,
        metadata: BundleMetadata,
    ) -> Result<Self, String> {
        classifier.validate()?;
        encoders.validate()?;

        let feature_spec = match &classifier.feature_names {
            Some(names) => FeatureSpec::from_manifest(names.clone()),
            None => FeatureSpec::canonical_default(),
        };
        if feature_spec.len() != classifier.n_features() {
            return Err(format!(
                "feature spec has {} entries but the classifier expects {}",
                feature_spec.len(),
                classifier.n_features()
            ));
        }

        Ok(Self {
            classifier,
            encoders,
            feature_spec,
            metadata,
        })
    }
}
