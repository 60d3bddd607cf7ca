//! Service configuration

use anyhow::Result;
use predictor_lib::StoreConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Disease-prediction service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// API server port for prediction/health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the trained model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Preferred classifier artifact file name
    #[serde(default = "default_model_file")]
    pub model_file: String,

    /// Encoders/scaler bundle file name
    #[serde(default = "default_encoders_file")]
    pub encoders_file: String,

    /// Optional training metadata file name
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
}

fn default_api_port() -> u16 {
    8080
}

fn default_model_dir() -> String {
    "models/saved_models".to_string()
}

fn default_model_file() -> String {
    "best_model_logistic_regression.json".to_string()
}

fn default_encoders_file() -> String {
    "encoders_and_scaler.json".to_string()
}

fn default_metadata_file() -> String {
    "training_metadata.json".to_string()
}

impl ServiceConfig {
    /// Load configuration from `PREDICTOR_`-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PREDICTOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServiceConfig {
            api_port: default_api_port(),
            model_dir: default_model_dir(),
            model_file: default_model_file(),
            encoders_file: default_encoders_file(),
            metadata_file: default_metadata_file(),
        }))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            model_dir: PathBuf::from(&self.model_dir),
            preferred_model_file: self.model_file.clone(),
            encoders_file: self.encoders_file.clone(),
            metadata_file: self.metadata_file.clone(),
        }
    }
}
