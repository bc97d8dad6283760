//! Logistic regression classifier loaded from a JSON artifact

use crate::error::AuditError;
use crate::models::classifier::{Classifier, Prediction};
use crate::models::encoder::{FeatureEncoder, FeatureSpec};
use crate::types::application::FeatureRow;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk layout of a logistic regression artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub name: String,
    /// Decision threshold on the positive-class probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub intercept: f64,
    #[serde(flatten)]
    pub encoder: FeatureEncoder,
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression over one-hot and standardized features
#[derive(Debug, Clone)]
pub struct LogisticModel {
    name: String,
    threshold: f64,
    intercept: f64,
    encoder: FeatureEncoder,
    /// Weights in encoded column order
    weights: Vec<f64>,
}

impl LogisticModel {
    /// Build a model from a parsed artifact, validating it first.
    ///
    /// `source` names the artifact in error messages.
    pub fn from_artifact(artifact: LogisticArtifact, source: &str) -> Result<Self, AuditError> {
        artifact.encoder.validate(source)?;

        if !(0.0..=1.0).contains(&artifact.threshold) {
            return Err(AuditError::artifact(
                source,
                format!("threshold {} is outside [0, 1]", artifact.threshold),
            ));
        }

        let mut weights = Vec::with_capacity(artifact.encoder.width());
        for spec in &artifact.encoder.features {
            match spec {
                FeatureSpec::Numeric { coefficient, .. } => weights.push(*coefficient),
                FeatureSpec::Categorical {
                    name,
                    categories,
                    coefficients,
                } => {
                    if coefficients.len() != categories.len() {
                        return Err(AuditError::artifact(
                            source,
                            format!(
                                "feature '{name}' has {} categories but {} coefficients",
                                categories.len(),
                                coefficients.len()
                            ),
                        ));
                    }
                    weights.extend_from_slice(coefficients);
                }
            }
        }

        Ok(Self {
            name: artifact.name,
            threshold: artifact.threshold,
            intercept: artifact.intercept,
            encoder: artifact.encoder,
            weights,
        })
    }

    /// Parse and validate an artifact from JSON text
    pub fn from_json(json: &str, source: &str) -> Result<Self, AuditError> {
        let artifact: LogisticArtifact = serde_json::from_str(json)
            .map_err(|e| AuditError::artifact(source, e.to_string()))?;
        Self::from_artifact(artifact, source)
    }

    /// Positive-class probability for a feature row
    pub fn probability(&self, features: &FeatureRow) -> Result<f64, AuditError> {
        let encoded = self.encoder.encode(features)?;
        let logit = self.intercept
            + encoded
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>();

        if !logit.is_finite() {
            return Err(AuditError::Prediction(format!(
                "non-finite logit from model '{}'",
                self.name
            )));
        }

        Ok(sigmoid(logit))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureRow) -> Result<Prediction, AuditError> {
        let probability = self.probability(features)?;
        let prediction = Prediction::from_probability(probability, self.threshold);

        debug!(
            model = %self.name,
            probability = probability,
            label = prediction.label,
            "Logistic prediction"
        );

        Ok(prediction)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::tests::sample_application;
    use crate::feature_extractor::FeatureExtractor;
    use crate::models::encoder::tests::sample_encoder;
    use crate::models::encoder::UnknownCategory;

    const SHIPPED_ARTIFACT: &str = include_str!("../../models/credit_classifier.json");

    /// Zero-weight model whose prediction is decided by the intercept alone
    pub(crate) fn constant_model(intercept: f64) -> LogisticModel {
        let artifact = LogisticArtifact {
            name: "constant".to_string(),
            threshold: 0.5,
            intercept,
            encoder: sample_encoder(),
        };
        LogisticModel::from_artifact(artifact, "test").unwrap()
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_constant_model() {
        let row = FeatureExtractor::new().extract(&sample_application()).unwrap();

        assert_eq!(constant_model(2.0).predict(&row).unwrap().label, 1);
        assert_eq!(constant_model(-2.0).predict(&row).unwrap().label, 0);
    }

    #[test]
    fn test_shipped_artifact() {
        let model = LogisticModel::from_json(SHIPPED_ARTIFACT, "credit_classifier.json").unwrap();
        assert_eq!(model.name(), "logreg_classifier");
        assert_eq!(model.threshold(), 0.5);

        let row = FeatureExtractor::new().extract(&sample_application()).unwrap();
        let prediction = model.predict(&row).unwrap();
        assert!(prediction.label == 0 || prediction.label == 1);
        assert!((0.0..=1.0).contains(&prediction.probability));
    }

    #[test]
    fn test_people_liable_encodings_agree() {
        let model = LogisticModel::from_json(SHIPPED_ARTIFACT, "credit_classifier.json").unwrap();
        let extractor = FeatureExtractor::new();

        let probabilities: Vec<f64> = [serde_json::json!(2), serde_json::json!(2.0), serde_json::json!("2")]
            .into_iter()
            .map(|raw| {
                let mut record = sample_application();
                record.insert("number_people_liable".to_string(), raw);
                model.probability(&extractor.extract(&record).unwrap()).unwrap()
            })
            .collect();

        assert_eq!(probabilities[0], probabilities[1]);
        assert_eq!(probabilities[0], probabilities[2]);
    }

    #[test]
    fn test_unseen_people_liable_rejected() {
        let model = LogisticModel::from_json(SHIPPED_ARTIFACT, "credit_classifier.json").unwrap();
        let mut record = sample_application();
        record.insert("number_people_liable".to_string(), serde_json::json!(3));
        let row = FeatureExtractor::new().extract(&record).unwrap();

        assert!(matches!(
            model.predict(&row),
            Err(AuditError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_coefficient_length_mismatch() {
        let mut encoder = sample_encoder();
        encoder.handle_unknown = UnknownCategory::Error;
        if let FeatureSpec::Categorical { coefficients, .. } = &mut encoder.features[0] {
            coefficients.pop();
        }
        let artifact = LogisticArtifact {
            name: "broken".to_string(),
            threshold: 0.5,
            intercept: 0.0,
            encoder,
        };

        assert!(matches!(
            LogisticModel::from_artifact(artifact, "test"),
            Err(AuditError::Artifact { .. })
        ));
    }
}
