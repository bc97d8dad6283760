//! Training-time feature encoding shared by every classifier backend

use crate::error::AuditError;
use crate::feature_extractor::FeatureExtractor;
use crate::types::application::{FeatureKind, FeatureRow, FeatureValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// What to do with a category never seen during training
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategory {
    /// Reject the record
    #[default]
    Error,
    /// Encode as all zeros, the way a lenient one-hot encoder does
    Ignore,
}

/// Encoding of one feature, as recorded by the training pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureSpec {
    Numeric {
        name: String,
        #[serde(default)]
        mean: f64,
        #[serde(default = "default_scale")]
        scale: f64,
        /// Logistic weight; unused by graph backends
        #[serde(default)]
        coefficient: f64,
    },
    Categorical {
        name: String,
        categories: Vec<String>,
        /// Logistic weights, one per category; unused by graph backends
        #[serde(default)]
        coefficients: Vec<f64>,
    },
}

fn default_scale() -> f64 {
    1.0
}

impl FeatureSpec {
    pub fn name(&self) -> &str {
        match self {
            FeatureSpec::Numeric { name, .. } | FeatureSpec::Categorical { name, .. } => name,
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureSpec::Numeric { .. } => FeatureKind::Numeric,
            FeatureSpec::Categorical { .. } => FeatureKind::Categorical,
        }
    }

    /// Number of encoded columns this feature expands to
    pub fn width(&self) -> usize {
        match self {
            FeatureSpec::Numeric { .. } => 1,
            FeatureSpec::Categorical { categories, .. } => categories.len(),
        }
    }
}

/// Standardizes numeric features and one-hot encodes categorical ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    #[serde(default)]
    pub handle_unknown: UnknownCategory,
    pub features: Vec<FeatureSpec>,
}

impl FeatureEncoder {
    /// Check the encoder against the extractor's schema.
    ///
    /// `source` names the artifact in error messages.
    pub fn validate(&self, source: &str) -> Result<(), AuditError> {
        let extractor = FeatureExtractor::new();
        let expected = extractor.feature_names();
        let declared: Vec<&str> = self.features.iter().map(FeatureSpec::name).collect();

        if declared != expected {
            return Err(AuditError::artifact(
                source,
                format!("feature order {declared:?} does not match training schema {expected:?}"),
            ));
        }

        for spec in &self.features {
            if extractor.feature_kind(spec.name()) != Some(spec.kind()) {
                return Err(AuditError::artifact(
                    source,
                    format!("feature '{}' is declared as {:?}", spec.name(), spec.kind()),
                ));
            }

            match spec {
                FeatureSpec::Numeric { name, scale, .. } => {
                    if *scale == 0.0 || !scale.is_finite() {
                        return Err(AuditError::artifact(
                            source,
                            format!("feature '{name}' has invalid scale {scale}"),
                        ));
                    }
                }
                FeatureSpec::Categorical {
                    name, categories, ..
                } => {
                    let unique: HashSet<&String> = categories.iter().collect();
                    if categories.is_empty() || unique.len() != categories.len() {
                        return Err(AuditError::artifact(
                            source,
                            format!("feature '{name}' needs a non-empty list of distinct categories"),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Total number of encoded columns
    pub fn width(&self) -> usize {
        self.features.iter().map(FeatureSpec::width).sum()
    }

    /// Encode a feature row into the model's input vector
    pub fn encode(&self, row: &FeatureRow) -> Result<Vec<f64>, AuditError> {
        let mut encoded = Vec::with_capacity(self.width());

        for spec in &self.features {
            let value = row
                .get(spec.name())
                .ok_or_else(|| AuditError::MissingFeature(spec.name().to_string()))?;

            match (spec, value) {
                (FeatureSpec::Numeric { mean, scale, .. }, FeatureValue::Numeric(x)) => {
                    encoded.push((x - mean) / scale);
                }
                (FeatureSpec::Categorical { name, categories, .. }, FeatureValue::Category(label)) => {
                    let position = categories.iter().position(|c| c == label);
                    if position.is_none() {
                        match self.handle_unknown {
                            UnknownCategory::Error => {
                                return Err(AuditError::UnknownCategory {
                                    feature: name.clone(),
                                    value: label.clone(),
                                });
                            }
                            UnknownCategory::Ignore => {
                                warn!(feature = %name, value = %label, "Unknown category encoded as zeros");
                            }
                        }
                    }
                    encoded.extend((0..categories.len()).map(|i| {
                        if Some(i) == position {
                            1.0
                        } else {
                            0.0
                        }
                    }));
                }
                (spec, value) => {
                    return Err(AuditError::invalid_feature(
                        spec.name(),
                        format!("expected {:?} value, got {:?}", spec.kind(), value.kind()),
                    ));
                }
            }
        }

        Ok(encoded)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::feature_extractor::tests::sample_application;

    pub(crate) fn sample_encoder() -> FeatureEncoder {
        let extractor = FeatureExtractor::new();
        let features = extractor
            .feature_names()
            .into_iter()
            .map(|name| match extractor.feature_kind(name) {
                Some(FeatureKind::Numeric) => FeatureSpec::Numeric {
                    name: name.to_string(),
                    mean: 2.0,
                    scale: 2.0,
                    coefficient: 0.0,
                },
                _ => FeatureSpec::Categorical {
                    name: name.to_string(),
                    categories: vec!["1".to_string(), "2".to_string()],
                    coefficients: vec![0.0, 0.0],
                },
            })
            .collect();
        FeatureEncoder {
            handle_unknown: UnknownCategory::Ignore,
            features,
        }
    }

    #[test]
    fn test_encoder_width() {
        let encoder = sample_encoder();
        encoder.validate("test").unwrap();
        // 13 categorical x 2 columns + 5 numeric
        assert_eq!(encoder.width(), 31);
    }

    #[test]
    fn test_one_hot_and_standardize() {
        let encoder = sample_encoder();
        let row = FeatureExtractor::new().extract(&sample_application()).unwrap();
        let encoded = encoder.encode(&row).unwrap();

        assert_eq!(encoded.len(), encoder.width());
        // installment_plans "A143" is unknown and ignored
        assert_eq!(&encoded[0..2], &[0.0, 0.0]);
        // number_people_liable "1" is the first category
        assert_eq!(&encoded[4..6], &[1.0, 0.0]);
        // credit_amount (1169 - 2) / 2
        assert_eq!(encoded[12], 583.5);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut encoder = sample_encoder();
        encoder.handle_unknown = UnknownCategory::Error;
        let row = FeatureExtractor::new().extract(&sample_application()).unwrap();

        match encoder.encode(&row) {
            Err(AuditError::UnknownCategory { feature, value }) => {
                assert_eq!(feature, "installment_plans");
                assert_eq!(value, "A143");
            }
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_wrong_order() {
        let mut encoder = sample_encoder();
        encoder.features.swap(0, 1);
        assert!(matches!(
            encoder.validate("test"),
            Err(AuditError::Artifact { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let mut encoder = sample_encoder();
        if let FeatureSpec::Numeric { scale, .. } = &mut encoder.features[6] {
            *scale = 0.0;
        }
        assert!(matches!(
            encoder.validate("test"),
            Err(AuditError::Artifact { .. })
        ));
    }
}
