//! Single-record scoring against a loaded credit default classifier

use crate::error::AuditError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::Classifier;
use crate::models::loader::ModelLoader;
use crate::types::application::{Record, PREDICTED_SCORE};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Scores loan applications with a shared, read-only model handle.
///
/// The handle sits behind an `RwLock` so `initialize` can swap it in a
/// single write while concurrent `score` calls keep using the `Arc` they
/// already cloned.
pub struct InferenceEngine {
    model: RwLock<Option<Arc<dyn Classifier>>>,
    feature_extractor: FeatureExtractor,
    loader: ModelLoader,
}

impl InferenceEngine {
    /// Create an engine with no model; `initialize` must run before `score`
    pub fn new() -> Self {
        Self {
            model: RwLock::new(None),
            feature_extractor: FeatureExtractor::new(),
            loader: ModelLoader::new(),
        }
    }

    /// Create an engine around an already loaded model
    pub fn with_model(model: Arc<dyn Classifier>) -> Self {
        let engine = Self::new();
        engine.install(model);
        engine
    }

    /// Load the artifact at `path` and make it the active model.
    ///
    /// Calling this again replaces the previous model.
    pub fn initialize<P: AsRef<Path>>(&self, path: P) -> Result<(), AuditError> {
        let model = self.loader.load(path)?;
        self.install(model);
        Ok(())
    }

    fn install(&self, model: Arc<dyn Classifier>) {
        let name = model.name().to_string();
        // A poisoned lock still holds a complete handle; the swap is one store
        let mut slot = self
            .model
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(model);
        info!(model = %name, "Inference engine initialized");
    }

    /// Current model handle
    pub fn model(&self) -> Result<Arc<dyn Classifier>, AuditError> {
        self.model
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(AuditError::UninitializedModel)
    }

    pub fn is_initialized(&self) -> bool {
        self.model().is_ok()
    }

    /// Score one application.
    ///
    /// Returns the record unchanged apart from `predicted_score`.
    pub fn score(&self, record: &Record) -> Result<Record, AuditError> {
        let model = self.model()?;
        let features = self.feature_extractor.extract(record)?;
        let prediction = model.predict(&features)?;

        debug!(
            model = %model.name(),
            predicted_score = prediction.label,
            probability = prediction.probability,
            "Application scored"
        );

        let mut scored = record.clone();
        scored.insert(PREDICTED_SCORE.to_string(), Value::from(prediction.label));
        Ok(scored)
    }

    /// Score a batch of applications, one result per record
    pub fn score_batch(&self, records: &[Record]) -> Vec<Result<Record, AuditError>> {
        records.iter().map(|r| self.score(r)).collect()
    }
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::tests::sample_application;
    use crate::models::logistic::tests::constant_model;
    use serde_json::json;

    fn shipped_artifact_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("models/credit_classifier.json")
    }

    #[test]
    fn test_score_before_initialize() {
        let engine = InferenceEngine::new();
        assert!(!engine.is_initialized());
        assert!(matches!(
            engine.score(&sample_application()),
            Err(AuditError::UninitializedModel)
        ));
    }

    #[test]
    fn test_score_preserves_record() {
        let engine = InferenceEngine::with_model(Arc::new(constant_model(3.0)));
        let record = sample_application();

        let scored = engine.score(&record).unwrap();

        assert_eq!(scored.len(), record.len() + 1);
        assert_eq!(scored[PREDICTED_SCORE], json!(1));
        for (key, value) in &record {
            assert_eq!(scored.get(key), Some(value));
        }
        let keys: Vec<&String> = scored.keys().collect();
        let original: Vec<&String> = record.keys().collect();
        assert_eq!(&keys[..original.len()], &original[..]);
        assert_eq!(keys.last().map(|k| k.as_str()), Some(PREDICTED_SCORE));
    }

    #[test]
    fn test_score_missing_feature() {
        let engine = InferenceEngine::with_model(Arc::new(constant_model(0.0)));
        let mut record = sample_application();
        record.remove("duration_months");

        let err = engine.score(&record).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_initialize_from_artifact() {
        let engine = InferenceEngine::new();
        engine.initialize(shipped_artifact_path()).unwrap();

        let scored = engine.score(&sample_application()).unwrap();
        let label = scored[PREDICTED_SCORE].as_i64().unwrap();
        assert!(label == 0 || label == 1);
    }

    #[test]
    fn test_reinitialize_replaces_model() {
        let engine = InferenceEngine::with_model(Arc::new(constant_model(-3.0)));
        assert_eq!(
            engine.score(&sample_application()).unwrap()[PREDICTED_SCORE],
            json!(0)
        );

        engine.initialize(shipped_artifact_path()).unwrap();
        assert_eq!(engine.model().unwrap().name(), "logreg_classifier");
    }

    #[test]
    fn test_failed_initialize_keeps_model() {
        let engine = InferenceEngine::with_model(Arc::new(constant_model(3.0)));
        assert!(engine.initialize("missing.json").is_err());
        assert_eq!(engine.model().unwrap().name(), "constant");
    }

    #[test]
    fn test_score_shipped_sample() {
        let engine = InferenceEngine::new();
        engine.initialize(shipped_artifact_path()).unwrap();

        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/df_sample.json");
        let records = crate::consumer::RecordReader::open(path)
            .unwrap()
            .read_all()
            .unwrap();

        for result in engine.score_batch(&records) {
            let scored = result.unwrap();
            assert!(scored.contains_key("gender"));
            assert!(scored[PREDICTED_SCORE].is_i64());
        }
    }
}
