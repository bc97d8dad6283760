//! Group and bias metric tables returned by an audit

use crate::types::application::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Key naming the protected attribute of a metrics row
pub const ATTRIBUTE_NAME: &str = "attribute_name";
/// Key naming the attribute value (the group) of a metrics row
pub const ATTRIBUTE_VALUE: &str = "attribute_value";

/// Result of auditing a labeled, scored batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Absolute metrics per (attribute, value) group
    pub group_metrics: Vec<Record>,
    /// Disparity ratios per (attribute, value) group
    pub bias_metrics: Vec<Record>,
}

impl MetricsReport {
    /// Find the group metrics row for one attribute value
    pub fn group_row(&self, attribute: &str, value: &str) -> Option<&Record> {
        find_row(&self.group_metrics, attribute, value)
    }

    /// Find the bias metrics row for one attribute value
    pub fn bias_row(&self, attribute: &str, value: &str) -> Option<&Record> {
        find_row(&self.bias_metrics, attribute, value)
    }
}

fn find_row<'a>(rows: &'a [Record], attribute: &str, value: &str) -> Option<&'a Record> {
    rows.iter().find(|row| {
        row.get(ATTRIBUTE_NAME).and_then(Value::as_str) == Some(attribute)
            && row.get(ATTRIBUTE_VALUE).and_then(Value::as_str) == Some(value)
    })
}

/// Round half to even at `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round_ties_even() / factor
}

/// JSON cell for a metric: rounded number, or null when undefined
pub fn metric_cell(value: Option<f64>, places: u32) -> Value {
    value
        .filter(|v| v.is_finite())
        .and_then(|v| Number::from_f64(round_to(v, places)))
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Start a metrics row with its attribute identifiers
pub fn metrics_row(attribute: &str, value: &str) -> Record {
    let mut row = Record::new();
    row.insert(ATTRIBUTE_NAME.to_string(), Value::from(attribute));
    row.insert(ATTRIBUTE_VALUE.to_string(), Value::from(value));
    row
}
