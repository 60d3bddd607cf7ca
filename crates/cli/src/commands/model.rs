//! Model administration CLI commands

use anyhow::Result;

use crate::client::{ApiClient, ModelInfo, ReloadResponse, SymptomsResponse};
use crate::output::{format_timestamp, print_success, print_warning, OutputFormat};

/// Show loaded-model information
pub async fn show_info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info: ModelInfo = client.get("api/v1/model/info").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Table => {
            if !info.loaded {
                print_warning("No model bundle is currently loaded");
                return Ok(());
            }

            println!("Model type:     {}", info.model_type.as_deref().unwrap_or("unknown"));
            println!("Features:       {}", info.n_features);
            println!("Classes:        {}", info.n_classes);
            if let Some(accuracy) = info.test_accuracy {
                println!("Test accuracy:  {:.1}%", accuracy * 100.0);
            }
            if let Some(cv_mean) = info.cv_mean {
                println!("CV mean:        {:.1}%", cv_mean * 100.0);
            }
            if let Some(checksum) = &info.checksum {
                println!("Checksum:       {}", &checksum[..checksum.len().min(16)]);
            }
            if let Some(loaded_at) = info.loaded_at {
                println!("Loaded at:      {}", format_timestamp(loaded_at));
            }
            println!(
                "Feature order:  {}",
                if info.feature_manifest_from_model {
                    "model manifest"
                } else {
                    "canonical default"
                }
            );
        }
    }

    Ok(())
}

/// List the symptom flags the loaded model accepts
pub async fn list_symptoms(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: SymptomsResponse = client.get("api/v1/symptoms").await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            if response.symptoms.is_empty() {
                print_warning("No symptoms available (is a model loaded?)");
                return Ok(());
            }
            for symptom in &response.symptoms {
                println!("{}", symptom);
            }
            println!("\nTotal: {} symptoms", response.total);
        }
    }

    Ok(())
}

/// Ask the service to reload its artifact bundle
pub async fn reload(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: ReloadResponse = client
        .post("api/v1/model/reload", &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            print_success(&response.message);
            if let Some(model_type) = &response.model_type {
                println!("Model type: {}", model_type);
            }
        }
    }

    Ok(())
}
