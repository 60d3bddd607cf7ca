//! Veterinary Disease Predictor CLI
//!
//! A command-line tool for running symptom-based predictions and inspecting
//! the model served by the disease-prediction service.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{model, predict};

/// Veterinary Disease Predictor CLI
#[derive(Parser)]
#[command(name = "vetdx")]
#[command(author, version, about = "CLI for the Veterinary Disease Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via VETDX_API_URL env var)
    #[arg(long, env = "VETDX_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a disease prediction
    Predict {
        /// Animal type (Perro/Gato, dog/cat)
        #[arg(long, default_value = "Perro")]
        animal_type: String,

        /// Age in years
        #[arg(long, default_value_t = 3.0)]
        age: f64,

        /// Size (Small, Medium, Large)
        #[arg(long, default_value = "Medium")]
        size: String,

        /// Life stage (Puppy, Kitten, Adult, Senior)
        #[arg(long, default_value = "Adult")]
        life_stage: String,

        /// Weight in kilograms
        #[arg(long, default_value_t = 15.0)]
        weight_kg: f64,

        /// Sex (Male, Female)
        #[arg(long, default_value = "Male")]
        sex: String,

        /// Vaccination is up to date
        #[arg(long)]
        vaccinated: bool,

        /// Symptom flag to set (repeatable), e.g. --symptom fever
        #[arg(long = "symptom", short = 's')]
        symptoms: Vec<String>,

        /// Free-text complaint to extract symptoms from
        #[arg(long)]
        text: Option<String>,

        /// Number of ranked predictions to return (1-10)
        #[arg(long, default_value_t = 3)]
        top_k: usize,
    },

    /// Model administration
    #[command(subcommand)]
    Model(ModelCommands),

    /// List the symptom flags the loaded model accepts
    Symptoms,
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Show loaded-model information
    Info,

    /// Reload the artifact bundle from disk
    Reload,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Predict {
            animal_type,
            age,
            size,
            life_stage,
            weight_kg,
            sex,
            vaccinated,
            symptoms,
            text,
            top_k,
        } => {
            let patient = predict::PatientArgs {
                animal_type,
                age,
                size,
                life_stage,
                weight_kg,
                sex,
                vaccinated,
            };
            predict::run_predict(&client, patient, symptoms, text, top_k, cli.format).await?;
        }
        Commands::Model(model_cmd) => match model_cmd {
            ModelCommands::Info => {
                model::show_info(&client, cli.format).await?;
            }
            ModelCommands::Reload => {
                model::reload(&client, cli.format).await?;
            }
        },
        Commands::Symptoms => {
            model::list_symptoms(&client, cli.format).await?;
        }
    }

    Ok(())
}
