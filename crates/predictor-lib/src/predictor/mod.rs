//! Symptom-based disease prediction engine

mod encoder;
mod inference;
mod normalizer;
mod rules;

pub use encoder::{Encoded, FeatureEncoder};
pub use inference::{DiseasePredictor, InferenceStats};
pub use normalizer::{CategoricalField, Normalized, Normalizer};
pub use rules::{BoostRule, RulesEngine, Species, SpeciesRule};
