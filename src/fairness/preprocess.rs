//! Normalization of scored, labeled records into crosstab input

use crate::error::AuditError;
use crate::fairness::{LABEL_VALUE, SCORE};
use crate::types::application::{category_label, numeric_value, Record};
use serde_json::Value;
use statrs::statistics::{Data, OrderStatistics};

/// Group label given to missing attribute values
pub const MISSING_GROUP: &str = "nan";

/// Numeric attributes with more distinct values than this are binned
const MAX_RAW_NUMERIC_GROUPS: usize = 4;

/// One preprocessed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    /// Binary prediction
    pub score: u8,
    /// Binary ground truth
    pub label: u8,
    /// Group label per attribute, aligned with `AuditFrame::attributes`
    pub groups: Vec<String>,
}

/// Batch in crosstab-ready form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFrame {
    pub attributes: Vec<String>,
    pub rows: Vec<AuditRow>,
}

impl AuditFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validate scores and labels, and turn attribute values into group labels.
///
/// Scores must be 0/1 unless `score_threshold` is given, in which case
/// any numeric score at or above it counts as a positive prediction.
pub fn preprocess(
    records: &[Record],
    attributes: &[String],
    score_threshold: Option<f64>,
) -> Result<AuditFrame, AuditError> {
    if records.is_empty() {
        return Err(AuditError::Metrics("cannot audit an empty batch".to_string()));
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let label = binary(column(record, i, LABEL_VALUE)?).ok_or_else(|| {
            AuditError::Metrics(format!(
                "label_value in record {i} must be binary (0 or 1), got {}",
                record[LABEL_VALUE]
            ))
        })?;

        let raw_score = column(record, i, SCORE)?;
        let score = match score_threshold {
            Some(threshold) => {
                let value = numeric_value(raw_score)
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        AuditError::Metrics(format!(
                            "score in record {i} is not a finite number: {raw_score}"
                        ))
                    })?;
                u8::from(value >= threshold)
            }
            None => binary(raw_score).ok_or_else(|| {
                AuditError::Metrics(format!(
                    "score in record {i} must be binary (0 or 1) without a score threshold, got {raw_score}"
                ))
            })?,
        };

        rows.push(AuditRow {
            score,
            label,
            groups: Vec::with_capacity(attributes.len()),
        });
    }

    for attribute in attributes {
        let values = records
            .iter()
            .enumerate()
            .map(|(i, record)| column(record, i, attribute))
            .collect::<Result<Vec<&Value>, AuditError>>()?;

        for (row, label) in rows.iter_mut().zip(group_labels(attribute, &values)?) {
            row.groups.push(label);
        }
    }

    Ok(AuditFrame {
        attributes: attributes.to_vec(),
        rows,
    })
}

fn column<'a>(record: &'a Record, row: usize, name: &str) -> Result<&'a Value, AuditError> {
    record.get(name).ok_or_else(|| AuditError::MissingColumn {
        row,
        column: name.to_string(),
    })
}

fn binary(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 0.0 => Some(0),
            Some(v) if v == 1.0 => Some(1),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "0" => Some(0),
            "1" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

/// Group labels for one attribute column
fn group_labels(attribute: &str, values: &[&Value]) -> Result<Vec<String>, AuditError> {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    let all_numeric = values.iter().all(|v| v.is_number() || v.is_null());

    if all_numeric && distinct_count(&numbers) > MAX_RAW_NUMERIC_GROUPS {
        let edges = quartile_edges(&numbers);
        return Ok(values
            .iter()
            .map(|v| match v.as_f64() {
                Some(x) => bin_label(&edges, x),
                None => MISSING_GROUP.to_string(),
            })
            .collect());
    }

    values
        .iter()
        .map(|v| match v {
            Value::Null => Ok(MISSING_GROUP.to_string()),
            other => category_label(other).ok_or_else(|| {
                AuditError::Metrics(format!(
                    "attribute '{attribute}' has a non-scalar value: {other}"
                ))
            }),
        })
        .collect()
}

fn distinct_count(numbers: &[f64]) -> usize {
    let mut sorted = numbers.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Quartile cut points, duplicates removed
fn quartile_edges(numbers: &[f64]) -> Vec<f64> {
    let mut data = Data::new(numbers.to_vec());
    let mut edges: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
        .iter()
        .map(|&q| data.quantile(q))
        .collect();
    edges.dedup();
    edges
}

fn bin_label(edges: &[f64], x: f64) -> String {
    let upper = edges
        .iter()
        .skip(1)
        .position(|&edge| x <= edge)
        .unwrap_or(edges.len().saturating_sub(2));
    let lo = edges[upper];
    let hi = edges.get(upper + 1).copied().unwrap_or(lo);
    format!("{lo:.2}-{hi:.2}")
}
