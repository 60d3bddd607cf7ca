//! Prediction CLI command

use anyhow::Result;
use std::collections::HashMap;
use tabled::Tabled;

use crate::client::{ApiClient, ExtractRequest, ExtractResponse, PredictRequest, PredictResponse};
use crate::output::{
    color_confidence, format_probability, print_info, print_warning, OutputFormat,
};

/// Row for the predictions table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Disease")]
    disease: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Demographic flags shared by the predict command
pub struct PatientArgs {
    pub animal_type: String,
    pub age: f64,
    pub size: String,
    pub life_stage: String,
    pub weight_kg: f64,
    pub sex: String,
    pub vaccinated: bool,
}

/// Run a prediction from explicit symptom flags and/or free text
pub async fn run_predict(
    client: &ApiClient,
    patient: PatientArgs,
    symptom_flags: Vec<String>,
    text: Option<String>,
    top_k: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut symptoms: HashMap<String, u8> =
        symptom_flags.into_iter().map(|s| (s, 1)).collect();

    // Free text goes through the service-side extractor, then merges with
    // any explicit flags
    if let Some(text) = text {
        let extracted: ExtractResponse = client
            .post("api/v1/extract-symptoms", &ExtractRequest { text })
            .await?;
        if extracted.symptoms_list.is_empty() {
            print_warning("No symptoms recognized in the provided text");
        } else {
            print_info(&format!(
                "Symptoms extracted from text: {}",
                extracted.symptoms_list.join(", ")
            ));
        }
        symptoms.extend(extracted.symptoms);
    }

    let request = PredictRequest {
        animal_type: patient.animal_type,
        age: patient.age,
        size: patient.size,
        life_stage: patient.life_stage,
        weight_kg: patient.weight_kg,
        sex: patient.sex,
        vaccination_up_to_date: u8::from(patient.vaccinated),
        symptoms,
        top_k,
    };

    let response: PredictResponse = client.post("api/v1/predict", &request).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            if response.predictions.is_empty() {
                print_warning("No predictions returned");
                return Ok(());
            }

            let rows: Vec<PredictionRow> = response
                .predictions
                .iter()
                .enumerate()
                .map(|(i, p)| PredictionRow {
                    rank: i + 1,
                    disease: p.disease.clone(),
                    probability: format_probability(p.probability),
                    confidence: color_confidence(&p.confidence),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            if let Some(accuracy) = response.model_accuracy {
                println!("\nModel accuracy: {:.1}%", accuracy * 100.0);
            }
            print_info(&response.disclaimer);
        }
    }

    Ok(())
}
