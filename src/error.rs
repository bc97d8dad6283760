//! Error taxonomy for scoring and fairness auditing

use thiserror::Error;

/// Errors surfaced by the scoring and metrics paths.
///
/// Nothing is retried or recovered locally: every variant reaches the
/// caller as soon as it is raised.
#[derive(Debug, Error)]
pub enum AuditError {
    /// `score` was called before a model handle was installed
    #[error("model is not initialized; call initialize() before scoring")]
    UninitializedModel,

    /// A required predictive feature is absent from the record
    #[error("missing feature: {0}")]
    MissingFeature(String),

    /// A batch record lacks a column the audit needs
    #[error("missing column '{column}' in record {row}")]
    MissingColumn { row: usize, column: String },

    /// A feature value has the wrong type for its kind
    #[error("invalid value for feature '{feature}': {reason}")]
    InvalidFeature { feature: String, reason: String },

    /// A categorical value outside the training-time domain
    #[error("unknown category '{value}' for feature '{feature}'")]
    UnknownCategory { feature: String, value: String },

    /// The model artifact could not be read or is inconsistent
    #[error("invalid model artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    /// The classifier failed while predicting
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// The fairness toolkit rejected its input
    #[error("metrics computation failed: {0}")]
    Metrics(String),

    /// Reference group configuration does not match the batch
    #[error("reference group error for attribute '{attribute}': {reason}")]
    ReferenceGroup { attribute: String, reason: String },

    /// A line of an input file is not a JSON object
    #[error("invalid input at line {line}: {reason}")]
    Input { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AuditError {
    pub(crate) fn artifact(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AuditError::Artifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_feature(feature: &str, reason: impl Into<String>) -> Self {
        AuditError::InvalidFeature {
            feature: feature.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a schema mismatch (missing feature or column)
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            AuditError::MissingFeature(_) | AuditError::MissingColumn { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuditError::MissingColumn {
            row: 3,
            column: "gender".to_string(),
        };
        assert_eq!(err.to_string(), "missing column 'gender' in record 3");
        assert!(err.is_schema_mismatch());

        let err = AuditError::UninitializedModel;
        assert!(!err.is_schema_mismatch());
        assert!(err.to_string().contains("not initialized"));
    }
}
