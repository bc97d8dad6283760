//! Classifier abstraction shared by every model backend

use crate::error::AuditError;
use crate::types::application::FeatureRow;

/// Output of one prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class (1 = default)
    pub label: i64,
    /// Probability of the positive class
    pub probability: f64,
}

impl Prediction {
    /// Label a probability against a decision threshold
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        Self {
            label: i64::from(probability >= threshold),
            probability,
        }
    }
}

/// A loaded, read-only credit default classifier.
///
/// Implementations never mutate observable state while predicting, so a
/// single handle can be shared across callers.
pub trait Classifier: Send + Sync {
    /// Name recorded in the model artifact
    fn name(&self) -> &str;

    /// Predict the class of one application
    fn predict(&self, features: &FeatureRow) -> Result<Prediction, AuditError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_threshold() {
        assert_eq!(Prediction::from_probability(0.61, 0.5).label, 1);
        assert_eq!(Prediction::from_probability(0.5, 0.5).label, 1);
        assert_eq!(Prediction::from_probability(0.49, 0.5).label, 0);
    }
}
