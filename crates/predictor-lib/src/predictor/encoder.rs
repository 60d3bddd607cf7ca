//! Feature vector encoding
//!
//! Builds the numeric vector the classifier was fitted on: normalized
//! categorical codes, scaled numerics, and binary symptom flags, assembled
//! in exactly the loaded feature spec's order. Input anomalies (unknown
//! symptom keys, unknown categorical values, features the spec declares
//! that this code cannot populate) are absorbed here; encoding itself
//! never fails.

use crate::artifacts::ModelBundle;
use crate::models::{is_symptom_feature, PatientRecord, SymptomMap};
use crate::predictor::normalizer::{CategoricalField, Normalizer};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fields encoded as label codes rather than scaled scalars
const CATEGORICAL_FIELDS: [&str; 5] = [
    "animal_type",
    "size",
    "life_stage",
    "sex",
    "vaccination_up_to_date",
];

/// An encoded feature vector plus the anomalies absorbed while building it
#[derive(Debug)]
pub struct Encoded {
    /// Single-row vector, same length and order as the bundle's feature spec
    pub vector: Vec<f64>,
    /// Features the spec declares that nothing in the input could populate.
    /// A non-empty list means the loaded artifact and this code are out of
    /// sync and should be watched operationally.
    pub drifted_features: Vec<String>,
    /// Categorical fields that took the first-class fallback
    pub fallback_fields: Vec<&'static str>,
}

/// Turns a demographic record and symptom flags into a model-ready vector
pub struct FeatureEncoder {
    normalizer: Normalizer,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self {
            normalizer: Normalizer::new(),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Encode one patient against the loaded bundle.
    ///
    /// Symptom keys outside the canonical vocabulary are ignored; known
    /// symptoms absent from input default to 0; spec features that remain
    /// unpopulated default to 0.0 and are reported as drift.
    pub fn encode(&self, record: &PatientRecord, symptoms: &SymptomMap, bundle: &ModelBundle) -> Encoded {
        let mut labeled: HashMap<String, f64> = HashMap::new();
        let mut fallback_fields = Vec::new();

        // Categorical fields become their encoder-assigned integer code
        let categoricals = [
            (CategoricalField::AnimalType, record.animal_type.as_str(), &bundle.encoders.animal_type),
            (CategoricalField::Size, record.size.as_str(), &bundle.encoders.size),
            (CategoricalField::LifeStage, record.life_stage.as_str(), &bundle.encoders.life_stage),
            (CategoricalField::Sex, record.sex.as_str(), &bundle.encoders.sex),
        ];
        for (field, raw, encoder) in categoricals {
            let normalized = self.normalizer.normalize(field, raw, encoder);
            if normalized.fallback {
                fallback_fields.push(field.as_str());
            }
            // normalize only ever returns known classes, so the code exists
            let code = encoder.code_of(&normalized.value).unwrap_or(0);
            labeled.insert(field.as_str().to_string(), code as f64);
        }

        let vacc_raw = record.vaccination_up_to_date.to_string();
        let normalized = self.normalizer.normalize(
            CategoricalField::Vaccination,
            &vacc_raw,
            &bundle.encoders.vaccination,
        );
        if normalized.fallback {
            fallback_fields.push(CategoricalField::Vaccination.as_str());
        }
        let code = bundle.encoders.vaccination.code_of(&normalized.value).unwrap_or(0);
        labeled.insert("vaccination_up_to_date".to_string(), code as f64);

        // Raw numerics; the scaler pass below replaces whichever of these it
        // was fitted on
        labeled.insert("age".to_string(), record.age);
        labeled.insert("weight_kg".to_string(), record.weight_kg);
        for (name, value) in &record.vitals {
            labeled.insert(name.clone(), *value);
        }

        // Symptom flags from input; unknown keys are dropped at this boundary
        for (name, value) in symptoms {
            if is_symptom_feature(name) {
                labeled.insert(name.clone(), f64::from(*value));
            } else {
                debug!(symptom = %name, "Ignoring symptom key outside the known vocabulary");
            }
        }

        // Scale by the scaler's own recorded feature order, which is not
        // assumed to match the spec order across dataset generations
        for name in &bundle.encoders.scaler.feature_order {
            if CATEGORICAL_FIELDS.contains(&name.as_str()) {
                continue;
            }
            if let Some(value) = labeled.get(name).copied() {
                if let Some(scaled) = bundle.encoders.scaler.transform(name, value) {
                    labeled.insert(name.clone(), scaled);
                }
            }
        }

        // Final assembly follows the spec order exactly
        let mut drifted_features = Vec::new();
        let vector: Vec<f64> = bundle
            .feature_spec
            .names
            .iter()
            .map(|name| match labeled.get(name) {
                Some(value) => *value,
                None => {
                    if !is_symptom_feature(name) {
                        warn!(
                            feature = %name,
                            "Feature declared by the model has no source in the current encoding; defaulting to 0.0"
                        );
                        drifted_features.push(name.clone());
                    }
                    0.0
                }
            })
            .collect();

        Encoded {
            vector,
            drifted_features,
            fallback_fields,
        }
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{BundleMetadata, ModelBundle};
    use crate::store::test_fixtures;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn dog_record() -> PatientRecord {
        PatientRecord {
            animal_type: "Perro".to_string(),
            age: 3.5,
            size: "Medium".to_string(),
            life_stage: "Adult".to_string(),
            weight_kg: 15.0,
            sex: "Male".to_string(),
            vaccination_up_to_date: 1,
            vitals: HashMap::new(),
        }
    }

    fn symptoms(names: &[&str]) -> SymptomMap {
        names.iter().map(|n| (n.to_string(), 1)).collect()
    }

    #[test]
    fn test_vector_length_matches_spec() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let encoded = encoder.encode(&dog_record(), &SymptomMap::new(), &bundle);
        assert_eq!(encoded.vector.len(), bundle.feature_spec.len());
    }

    #[test]
    fn test_empty_symptoms_default_to_zero() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let encoded = encoder.encode(&dog_record(), &SymptomMap::new(), &bundle);
        // Fixture spec: symptom flags occupy positions 7..12
        for value in &encoded.vector[7..] {
            assert_eq!(*value, 0.0);
        }
        assert!(encoded.drifted_features.is_empty());
    }

    #[test]
    fn test_known_symptoms_set_their_positions() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let encoded = encoder.encode(&dog_record(), &symptoms(&["fever", "diarrhea"]), &bundle);
        let spec = &bundle.feature_spec.names;
        let fever_idx = spec.iter().position(|n| n == "fever").unwrap();
        let diarrhea_idx = spec.iter().position(|n| n == "diarrhea").unwrap();
        let vomiting_idx = spec.iter().position(|n| n == "vomiting").unwrap();

        assert_eq!(encoded.vector[fever_idx], 1.0);
        assert_eq!(encoded.vector[diarrhea_idx], 1.0);
        assert_eq!(encoded.vector[vomiting_idx], 0.0);
    }

    #[test]
    fn test_unknown_symptom_keys_are_ignored() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let mut input = symptoms(&["fever"]);
        input.insert("spontaneous_combustion".to_string(), 1);
        let encoded = encoder.encode(&dog_record(), &input, &bundle);

        assert_eq!(encoded.vector.len(), bundle.feature_spec.len());
        assert!(encoded.drifted_features.is_empty());
    }

    #[test]
    fn test_numerics_scaled_by_recorded_order() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let encoded = encoder.encode(&dog_record(), &SymptomMap::new(), &bundle);
        let spec = &bundle.feature_spec.names;
        let age_idx = spec.iter().position(|n| n == "age").unwrap();
        let weight_idx = spec.iter().position(|n| n == "weight_kg").unwrap();

        // Fixture scaler order is [weight_kg, age]: mean 12/scale 6, mean 4/scale 3
        assert!((encoded.vector[weight_idx] - (15.0 - 12.0) / 6.0).abs() < 1e-9);
        assert!((encoded.vector[age_idx] - (3.5 - 4.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_categorical_codes_from_encoders() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let encoded = encoder.encode(&dog_record(), &SymptomMap::new(), &bundle);
        let spec = &bundle.feature_spec.names;
        let animal_idx = spec.iter().position(|n| n == "animal_type").unwrap();
        let size_idx = spec.iter().position(|n| n == "size").unwrap();
        let vacc_idx = spec.iter().position(|n| n == "vaccination_up_to_date").unwrap();

        // Fixture classes: ["Gato","Perro"], ["Large","Medium","Small"], ["0","1"]
        assert_eq!(encoded.vector[animal_idx], 1.0);
        assert_eq!(encoded.vector[size_idx], 1.0);
        assert_eq!(encoded.vector[vacc_idx], 1.0);
    }

    #[test]
    fn test_unknown_categorical_takes_fallback_without_error() {
        let bundle = test_fixtures::bundle();
        let encoder = FeatureEncoder::new();

        let mut record = dog_record();
        record.size = "XL".to_string();
        let encoded = encoder.encode(&record, &SymptomMap::new(), &bundle);

        let size_idx = bundle.feature_spec.names.iter().position(|n| n == "size").unwrap();
        // First known class ("Large") has code 0
        assert_eq!(encoded.vector[size_idx], 0.0);
        assert_eq!(encoded.fallback_fields, vec!["size"]);
    }

    #[test]
    fn test_drift_reported_for_unpopulated_features() {
        // A legacy-style manifest declaring a column this encoder cannot fill
        let mut classifier: crate::artifacts::ClassifierArtifact =
            serde_json::from_value(test_fixtures::classifier_json()).unwrap();
        let names = classifier.feature_names.as_mut().unwrap();
        names[11] = "BCS".to_string();

        let encoders = serde_json::from_value(test_fixtures::encoders_json()).unwrap();
        let metadata = BundleMetadata {
            model_path: PathBuf::from("best_model_legacy.json"),
            checksum: "00".to_string(),
            loaded_at: 0,
            training: None,
        };
        let bundle = ModelBundle::assemble(classifier, encoders, metadata).unwrap();

        let encoder = FeatureEncoder::new();
        let encoded = encoder.encode(&dog_record(), &SymptomMap::new(), &bundle);

        assert_eq!(encoded.vector.len(), 12);
        assert_eq!(encoded.drifted_features, vec!["BCS".to_string()]);
        assert_eq!(encoded.vector[11], 0.0);
    }

    #[test]
    fn test_vitals_feed_matching_features() {
        let mut classifier: crate::artifacts::ClassifierArtifact =
            serde_json::from_value(test_fixtures::classifier_json()).unwrap();
        let names = classifier.feature_names.as_mut().unwrap();
        names[11] = "body_temperature".to_string();

        let encoders = serde_json::from_value(test_fixtures::encoders_json()).unwrap();
        let metadata = BundleMetadata {
            model_path: PathBuf::from("best_model_vitals.json"),
            checksum: "00".to_string(),
            loaded_at: 0,
            training: None,
        };
        let bundle = ModelBundle::assemble(classifier, encoders, metadata).unwrap();

        let mut record = dog_record();
        record.vitals.insert("body_temperature".to_string(), 39.4);

        let encoder = FeatureEncoder::new();
        let encoded = encoder.encode(&record, &SymptomMap::new(), &bundle);
        assert_eq!(encoded.vector[11], 39.4);
        assert!(encoded.drifted_features.is_empty());
    }
}
