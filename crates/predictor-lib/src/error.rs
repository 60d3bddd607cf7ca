//! Error taxonomy for the prediction core
//!
//! Artifact-level failures propagate to the caller as service-unavailable
//! conditions; categorical and schema anomalies are absorbed inside the
//! encoder and never abort an inference.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictorError {
    /// A required model or encoder file is missing at the configured path.
    /// Recoverable by supplying the artifact and calling reload.
    #[error("model artifact not found: {path}")]
    ArtifactNotFound { path: PathBuf },

    /// A found artifact failed deserialization or post-load validation
    #[error("model artifact {path} is corrupt: {reason}")]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// predict() was called before any successful load and the lazy load
    /// also failed
    #[error("prediction model is not loaded")]
    ModelNotLoaded,

    /// The encoded feature vector does not match what the classifier was
    /// fitted with; the loaded artifact and the encoding code are out of sync
    #[error("feature vector has {got} entries but the model expects {expected}")]
    FeatureMismatch { expected: usize, got: usize },
}

impl PredictorError {
    /// True for conditions the caller should treat as service-unavailable
    /// rather than a bad request
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            PredictorError::ArtifactNotFound { .. }
                | PredictorError::ArtifactCorrupt { .. }
                | PredictorError::ModelNotLoaded
                | PredictorError::FeatureMismatch { .. }
        )
    }
}
