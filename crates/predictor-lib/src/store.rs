//! Model artifact loading and caching
//!
//! Locates the best-model classifier in the configured directory, loads it
//! together with the paired encoders/scaler as one unit, and caches the
//! bundle for the life of the process. Reload builds and validates a
//! complete replacement before a single pointer swap; a failed reload
//! leaves the previous bundle serving.

use crate::artifacts::{BundleMetadata, ClassifierArtifact, EncoderSet, ModelBundle, TrainingMetadata};
use crate::error::PredictorError;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

/// Artifact discovery configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the trained artifacts
    pub model_dir: PathBuf,
    /// Classifier file loaded when present
    pub preferred_model_file: String,
    /// Paired encoders/scaler bundle, always at this fixed name
    pub encoders_file: String,
    /// Optional training metadata
    pub metadata_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/saved_models"),
            preferred_model_file: "best_model_logistic_regression.json".to_string(),
            encoders_file: "encoders_and_scaler.json".to_string(),
            metadata_file: "training_metadata.json".to_string(),
        }
    }
}

/// Prefix/suffix for fallback classifier discovery
const MODEL_FILE_PREFIX: &str = "best_model_";
const MODEL_FILE_SUFFIX: &str = ".json";

/// Process-wide holder of the loaded [`ModelBundle`].
///
/// Readers take cheap `Arc` snapshots; first load and reload are serialized
/// through one guard so concurrent callers never trigger overlapping loads.
pub struct ModelStore {
    config: StoreConfig,
    bundle: RwLock<Option<Arc<ModelBundle>>>,
    load_guard: Mutex<()>,
}

impl ModelStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            bundle: RwLock::new(None),
            load_guard: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle().is_some()
    }

    /// Snapshot of the cached bundle, if any
    pub fn bundle(&self) -> Option<Arc<ModelBundle>> {
        self.bundle
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Return the cached bundle, loading it on first use.
    ///
    /// Callers racing on the first load queue on the guard and reuse the
    /// winner's result instead of loading again.
    pub fn get_or_load(&self) -> Result<Arc<ModelBundle>, PredictorError> {
        if let Some(bundle) = self.bundle() {
            return Ok(bundle);
        }

        let _guard = self.load_guard.lock().unwrap_or_else(|e| e.into_inner());
        // A concurrent caller may have completed the load while we waited
        if let Some(bundle) = self.bundle() {
            return Ok(bundle);
        }

        let bundle = Arc::new(self.load_bundle()?);
        *self.bundle.write().unwrap_or_else(|e| e.into_inner()) = Some(bundle.clone());
        Ok(bundle)
    }

    /// Replace the cached bundle with a freshly loaded one.
    ///
    /// The new bundle is fully loaded and validated before the swap; on any
    /// failure the previous bundle keeps serving. In-flight predictions see
    /// either the old or the new bundle, never a partial one.
    pub fn reload(&self) -> Result<Arc<ModelBundle>, PredictorError> {
        let _guard = self.load_guard.lock().unwrap_or_else(|e| e.into_inner());

        let bundle = Arc::new(self.load_bundle()?);
        *self.bundle.write().unwrap_or_else(|e| e.into_inner()) = Some(bundle.clone());

        info!(
            model_path = %bundle.metadata.model_path.display(),
            checksum = %bundle.metadata.checksum,
            "Model bundle reloaded"
        );
        Ok(bundle)
    }

    fn load_bundle(&self) -> Result<ModelBundle, PredictorError> {
        let model_path = self.locate_model_file()?;
        let model_bytes = read_artifact(&model_path)?;
        let checksum = compute_checksum(&model_bytes);

        let classifier: ClassifierArtifact =
            serde_json::from_slice(&model_bytes).map_err(|e| PredictorError::ArtifactCorrupt {
                path: model_path.clone(),
                reason: e.to_string(),
            })?;

        let encoders_path = self.config.model_dir.join(&self.config.encoders_file);
        let encoder_bytes = read_artifact(&encoders_path)?;
        let encoders: EncoderSet =
            serde_json::from_slice(&encoder_bytes).map_err(|e| PredictorError::ArtifactCorrupt {
                path: encoders_path.clone(),
                reason: e.to_string(),
            })?;

        let training = self.load_training_metadata();

        let metadata = BundleMetadata {
            model_path: model_path.clone(),
            checksum,
            loaded_at: chrono::Utc::now().timestamp(),
            training,
        };

        let bundle = ModelBundle::assemble(classifier, encoders, metadata).map_err(|reason| {
            PredictorError::ArtifactCorrupt {
                path: model_path.clone(),
                reason,
            }
        })?;

        info!(
            model_path = %model_path.display(),
            model_type = %bundle.classifier.model_type,
            n_classes = bundle.classifier.n_classes(),
            n_features = bundle.classifier.n_features(),
            manifest_from_model = bundle.feature_spec.from_model_manifest,
            checksum = %bundle.metadata.checksum,
            "Model bundle loaded"
        );

        Ok(bundle)
    }

    /// Training metadata is optional: a missing file is normal, an
    /// unparseable one is logged and ignored
    fn load_training_metadata(&self) -> Option<TrainingMetadata> {
        let path = self.config.model_dir.join(&self.config.metadata_file);
        let bytes = fs::read(&path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unparseable training metadata");
                None
            }
        }
    }

    /// Preferred classifier file if present, otherwise the first
    /// `best_model_*.json` in lexicographic order
    fn locate_model_file(&self) -> Result<PathBuf, PredictorError> {
        let preferred = self.config.model_dir.join(&self.config.preferred_model_file);
        if preferred.is_file() {
            return Ok(preferred);
        }

        let entries = fs::read_dir(&self.config.model_dir).map_err(|_| {
            PredictorError::ArtifactNotFound {
                path: self.config.model_dir.clone(),
            }
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(MODEL_FILE_PREFIX) && n.ends_with(MODEL_FILE_SUFFIX))
                        .unwrap_or(false)
            })
            .collect();
        candidates.sort();

        candidates
            .into_iter()
            .next()
            .ok_or(PredictorError::ArtifactNotFound { path: preferred })
    }
}

fn read_artifact(path: &PathBuf) -> Result<Vec<u8>, PredictorError> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PredictorError::ArtifactNotFound { path: path.clone() }
        } else {
            PredictorError::ArtifactCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            }
        }
    })
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
