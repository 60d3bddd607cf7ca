//! Inference orchestration
//!
//! Wires the encoder, the model store, and the rules engine together: lazy
//! bundle load, feature encoding, full class-probability evaluation, stable
//! top-k ranking, confidence banding, and heuristic refinement.

use crate::error::PredictorError;
use crate::models::{
    Confidence, DiseasePrediction, ModelInfo, PatientRecord, SymptomMap, MAX_TOP_K, MIN_TOP_K,
};
use crate::observability::PredictorMetrics;
use crate::predictor::encoder::FeatureEncoder;
use crate::predictor::rules::RulesEngine;
use crate::store::ModelStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference slower than this is logged as an outlier (linear-model
/// evaluation should be well under a millisecond)
const MAX_INFERENCE_MS: u128 = 5;

/// Counters exposed for debugging endpoints
#[derive(Debug, Clone)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub slow_inferences: u64,
}

/// Symptom-based disease predictor.
///
/// Stateless per call aside from the shared model bundle; safe for
/// concurrent use once constructed.
pub struct DiseasePredictor {
    store: Arc<ModelStore>,
    encoder: FeatureEncoder,
    rules: RulesEngine,
    metrics: PredictorMetrics,
    inference_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl DiseasePredictor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self::with_rules(store, RulesEngine::new())
    }

    pub fn with_rules(store: Arc<ModelStore>, rules: RulesEngine) -> Self {
        Self {
            store,
            encoder: FeatureEncoder::new(),
            rules,
            metrics: PredictorMetrics::new(),
            inference_count: AtomicU64::new(0),
            slow_inference_count: AtomicU64::new(0),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_loaded()
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// Ranked predictions straight from the model: exactly
    /// `min(top_k, n_classes)` entries, probability-descending, ties broken
    /// by the classifier's native class order.
    ///
    /// Attempts one lazy load if no bundle is cached; a failed load
    /// surfaces as a service-unavailable error.
    pub fn predict(
        &self,
        record: &PatientRecord,
        symptoms: &SymptomMap,
        top_k: usize,
    ) -> Result<Vec<DiseasePrediction>, PredictorError> {
        let start = Instant::now();

        // One lazy load attempt; the underlying artifact failure is logged
        // here and the caller sees the not-loaded condition
        let bundle = match self.store.get_or_load() {
            Ok(bundle) => bundle,
            Err(e) => {
                self.metrics.inc_prediction_errors();
                warn!(error = %e, "Lazy model load failed");
                return Err(PredictorError::ModelNotLoaded);
            }
        };

        let encoded = self.encoder.encode(record, symptoms, &bundle);
        self.metrics
            .add_category_fallbacks(encoded.fallback_fields.len() as u64);
        self.metrics
            .add_schema_drift(encoded.drifted_features.len() as u64);

        let probabilities = bundle.classifier.predict_proba(&encoded.vector).map_err(|e| {
            self.metrics.inc_prediction_errors();
            e
        })?;

        let k = top_k
            .clamp(MIN_TOP_K, MAX_TOP_K)
            .min(bundle.classifier.n_classes());

        // Stable sort keeps the classifier's class order on equal
        // probabilities
        let mut order: Vec<usize> = (0..probabilities.len()).collect();
        order.sort_by(|a, b| {
            probabilities[*b]
                .partial_cmp(&probabilities[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let predictions: Vec<DiseasePrediction> = order
            .into_iter()
            .take(k)
            .map(|idx| DiseasePrediction {
                disease: bundle.classifier.classes[idx].clone(),
                probability: probabilities[idx],
                confidence: Confidence::from_probability(probabilities[idx]),
            })
            .collect();

        let elapsed = start.elapsed();
        self.metrics.observe_inference_latency(elapsed.as_secs_f64());
        self.metrics.inc_predictions();
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms target", MAX_INFERENCE_MS
            );
        } else {
            debug!(
                elapsed_us = elapsed.as_micros() as u64,
                n_results = predictions.len(),
                "Inference completed"
            );
        }

        Ok(predictions)
    }

    /// Full pipeline: model ranking refined by the species filter and
    /// symptom-coherence rules
    pub fn predict_refined(
        &self,
        record: &PatientRecord,
        symptoms: &SymptomMap,
        top_k: usize,
    ) -> Result<Vec<DiseasePrediction>, PredictorError> {
        let ranked = self.predict(record, symptoms, top_k)?;
        Ok(self.rules.refine(ranked, &record.animal_type, symptoms))
    }

    /// Reload the artifact bundle from disk; the previous bundle keeps
    /// serving if the reload fails
    pub fn reload(&self) -> Result<ModelInfo, PredictorError> {
        let bundle = self.store.reload()?;
        self.metrics
            .set_model_info(&bundle.classifier.model_type, &bundle.metadata.checksum);
        Ok(self.model_info())
    }

    /// Load-time snapshot of the current bundle; no runtime reflection
    pub fn model_info(&self) -> ModelInfo {
        let bundle = match self.store.bundle() {
            Some(bundle) => bundle,
            None => return ModelInfo::not_loaded(),
        };

        let training = bundle.metadata.training.as_ref();
        ModelInfo {
            loaded: true,
            model_type: Some(bundle.classifier.model_type.clone()),
            n_features: bundle.classifier.n_features(),
            n_classes: bundle.classifier.n_classes(),
            test_accuracy: training.and_then(|t| t.test_accuracy),
            cv_mean: training.and_then(|t| t.cv_mean),
            checksum: Some(bundle.metadata.checksum.clone()),
            loaded_at: Some(bundle.metadata.loaded_at),
            feature_manifest_from_model: bundle.feature_spec.from_model_manifest,
            symptoms: bundle.feature_spec.symptom_names(),
        }
    }

    /// Symptom flags the loaded model accepts; empty while nothing is loaded
    pub fn symptom_vocabulary(&self) -> Vec<String> {
        self.store
            .bundle()
            .map(|b| b.feature_spec.symptom_names())
            .unwrap_or_default()
    }

    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}
