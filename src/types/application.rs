//! Loan application records and the feature values handed to a classifier

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flat record of field name to JSON value, in input key order
pub type Record = Map<String, Value>;

/// Key under which the predicted label is attached to a scored record
pub const PREDICTED_SCORE: &str = "predicted_score";

/// How a feature was encoded at training time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// One feature value after coercion to its training-time kind
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Category(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Numeric(_) => FeatureKind::Numeric,
            FeatureValue::Category(_) => FeatureKind::Categorical,
        }
    }
}

/// Features of a single application, in the model's trained order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    values: Vec<(&'static str, FeatureValue)>,
}

impl FeatureRow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: &'static str, value: FeatureValue) {
        self.values.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> + '_ {
        self.values.iter().map(|(n, v)| (*n, v))
    }
}

/// Render a JSON scalar as a category label.
///
/// Integral numbers lose any fractional part (`2.0` becomes `"2"`) and
/// booleans use `True`/`False`, the labels categories were trained with.
pub fn category_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Read a JSON scalar as a number, accepting numeric strings
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(&json!(1)), Some("1".to_string()));
        assert_eq!(category_label(&json!(2.0)), Some("2".to_string()));
        assert_eq!(category_label(&json!("1")), Some("1".to_string()));
        assert_eq!(category_label(&json!(true)), Some("True".to_string()));
        assert_eq!(category_label(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(category_label(&Value::Null), None);
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(&json!(1169)), Some(1169.0));
        assert_eq!(numeric_value(&json!(" 4.5 ")), Some(4.5));
        assert_eq!(numeric_value(&json!("A11")), None);
        assert_eq!(numeric_value(&json!(null)), None);
    }

    #[test]
    fn test_feature_row_lookup() {
        let mut row = FeatureRow::with_capacity(2);
        row.push("duration_months", FeatureValue::Numeric(6.0));
        row.push("housing", FeatureValue::Category("A152".to_string()));

        assert_eq!(row.len(), 2);
        assert_eq!(
            row.get("housing").map(FeatureValue::kind),
            Some(FeatureKind::Categorical)
        );
        assert!(row.get("job").is_none());
    }
}
