//! Feature extraction for credit default model inference.
//!
//! This module shapes a loan application record into the features the
//! classifier was trained on, in the exact order it expects them.

use crate::error::AuditError;
use crate::types::application::{
    category_label, numeric_value, FeatureKind, FeatureRow, FeatureValue, Record,
};
use serde_json::Value;

/// Feature with only two observed values; trained as a category, not a count
pub const NUMBER_PEOPLE_LIABLE: &str = "number_people_liable";

/// Training-time feature order and encoding kind.
const FEATURES: [(&str, FeatureKind); 18] = [
    ("installment_plans", FeatureKind::Categorical),
    ("job", FeatureKind::Categorical),
    (NUMBER_PEOPLE_LIABLE, FeatureKind::Categorical),
    ("savings_account", FeatureKind::Categorical),
    ("debtors_guarantors", FeatureKind::Categorical),
    ("housing", FeatureKind::Categorical),
    ("credit_amount", FeatureKind::Numeric),
    ("installment_rate", FeatureKind::Numeric),
    ("credit_history", FeatureKind::Categorical),
    ("foreign_worker", FeatureKind::Categorical),
    ("number_existing_credits", FeatureKind::Numeric),
    ("purpose", FeatureKind::Categorical),
    ("telephone", FeatureKind::Categorical),
    ("present_residence_since", FeatureKind::Numeric),
    ("checking_status", FeatureKind::Categorical),
    ("duration_months", FeatureKind::Numeric),
    ("present_employment_since", FeatureKind::Categorical),
    ("property", FeatureKind::Categorical),
];

/// Feature extractor that turns application records into model input.
///
/// Extra keys on the record are ignored; the model only ever sees the
/// eighteen predictive features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the predictive features from a record.
    pub fn extract(&self, record: &Record) -> Result<FeatureRow, AuditError> {
        // Report a schema mismatch before any value is inspected
        if let Some((name, _)) = FEATURES.iter().find(|(name, _)| !record.contains_key(*name)) {
            return Err(AuditError::MissingFeature(name.to_string()));
        }

        let mut row = FeatureRow::with_capacity(FEATURES.len());
        for (name, kind) in FEATURES {
            let raw = &record[name];
            let value = match kind {
                FeatureKind::Numeric => FeatureValue::Numeric(Self::numeric(name, raw)?),
                FeatureKind::Categorical => FeatureValue::Category(Self::category(name, raw)?),
            };
            row.push(name, value);
        }

        Ok(row)
    }

    fn numeric(name: &str, raw: &Value) -> Result<f64, AuditError> {
        numeric_value(raw)
            .filter(|v| v.is_finite())
            .ok_or_else(|| AuditError::invalid_feature(name, format!("expected a number, got {raw}")))
    }

    fn category(name: &str, raw: &Value) -> Result<String, AuditError> {
        category_label(raw)
            .ok_or_else(|| AuditError::invalid_feature(name, format!("expected a category, got {raw}")))
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURES.len()
    }

    /// Get feature names in training order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURES.iter().map(|(name, _)| *name).collect()
    }

    /// Encoding kind of a feature, if it is part of the schema
    pub fn feature_kind(&self, name: &str) -> Option<FeatureKind> {
        FEATURES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
