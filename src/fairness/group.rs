//! Crosstabs and absolute (per-group) classification metrics

use crate::error::AuditError;
use crate::fairness::preprocess::AuditFrame;
use std::collections::BTreeMap;

/// Per-group classification metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsoluteMetric {
    /// True positive rate (recall)
    Tpr,
    /// True negative rate
    Tnr,
    /// False omission rate
    For,
    /// False discovery rate
    Fdr,
    /// False positive rate
    Fpr,
    /// False negative rate
    Fnr,
    /// Negative predictive value
    Npv,
    Precision,
    /// Group share of all predicted positives
    Ppr,
    /// Predicted prevalence within the group
    Pprev,
    /// Label prevalence within the group
    Prev,
}

/// Absolute metric columns in output order
pub const ABSOLUTE_METRICS: [AbsoluteMetric; 11] = [
    AbsoluteMetric::Tpr,
    AbsoluteMetric::Tnr,
    AbsoluteMetric::For,
    AbsoluteMetric::Fdr,
    AbsoluteMetric::Fpr,
    AbsoluteMetric::Fnr,
    AbsoluteMetric::Npv,
    AbsoluteMetric::Precision,
    AbsoluteMetric::Ppr,
    AbsoluteMetric::Pprev,
    AbsoluteMetric::Prev,
];

impl AbsoluteMetric {
    /// Column name in metric tables
    pub fn column(&self) -> &'static str {
        match self {
            AbsoluteMetric::Tpr => "tpr",
            AbsoluteMetric::Tnr => "tnr",
            AbsoluteMetric::For => "for",
            AbsoluteMetric::Fdr => "fdr",
            AbsoluteMetric::Fpr => "fpr",
            AbsoluteMetric::Fnr => "fnr",
            AbsoluteMetric::Npv => "npv",
            AbsoluteMetric::Precision => "precision",
            AbsoluteMetric::Ppr => "ppr",
            AbsoluteMetric::Pprev => "pprev",
            AbsoluteMetric::Prev => "prev",
        }
    }
}

/// Confusion-matrix counts for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCounts {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub r#fn: u64,
}

impl GroupCounts {
    fn record(&mut self, score: u8, label: u8) {
        match (score, label) {
            (1, 1) => self.tp += 1,
            (1, _) => self.fp += 1,
            (_, 1) => self.r#fn += 1,
            _ => self.tn += 1,
        }
    }

    /// Predicted positives
    pub fn pp(&self) -> u64 {
        self.tp + self.fp
    }

    /// Predicted negatives
    pub fn pn(&self) -> u64 {
        self.tn + self.r#fn
    }

    pub fn label_pos(&self) -> u64 {
        self.tp + self.r#fn
    }

    pub fn label_neg(&self) -> u64 {
        self.tn + self.fp
    }

    pub fn size(&self) -> u64 {
        self.pp() + self.pn()
    }

    /// `(successes, trials)` of the proportion behind a metric.
    ///
    /// `k` is the number of predicted positives across the whole batch.
    pub fn proportion(&self, metric: AbsoluteMetric, k: u64) -> (u64, u64) {
        match metric {
            AbsoluteMetric::Tpr => (self.tp, self.label_pos()),
            AbsoluteMetric::Tnr => (self.tn, self.label_neg()),
            AbsoluteMetric::For => (self.r#fn, self.pn()),
            AbsoluteMetric::Fdr => (self.fp, self.pp()),
            AbsoluteMetric::Fpr => (self.fp, self.label_neg()),
            AbsoluteMetric::Fnr => (self.r#fn, self.label_pos()),
            AbsoluteMetric::Npv => (self.tn, self.pn()),
            AbsoluteMetric::Precision => (self.tp, self.pp()),
            AbsoluteMetric::Ppr => (self.pp(), k),
            AbsoluteMetric::Pprev => (self.pp(), self.size()),
            AbsoluteMetric::Prev => (self.label_pos(), self.size()),
        }
    }

    /// Metric value; `None` when the denominator is zero
    pub fn metric(&self, metric: AbsoluteMetric, k: u64) -> Option<f64> {
        match self.proportion(metric, k) {
            (_, 0) => None,
            (num, den) => Some(num as f64 / den as f64),
        }
    }
}

/// One crosstab row: a protected attribute value and its counts
#[derive(Debug, Clone, PartialEq)]
pub struct CrosstabRow {
    pub attribute_name: String,
    pub attribute_value: String,
    pub counts: GroupCounts,
    /// Records in the batch
    pub total_entities: u64,
    /// Predicted positives in the batch
    pub k: u64,
}

impl CrosstabRow {
    pub fn metric(&self, metric: AbsoluteMetric) -> Option<f64> {
        self.counts.metric(metric, self.k)
    }
}

/// Build the crosstab: attributes in frame order, values sorted
pub fn crosstab(frame: &AuditFrame) -> Result<Vec<CrosstabRow>, AuditError> {
    if frame.is_empty() {
        return Err(AuditError::Metrics("cannot build a crosstab of an empty batch".to_string()));
    }

    let total_entities = frame.len() as u64;
    let k = frame.rows.iter().filter(|r| r.score == 1).count() as u64;

    let mut table = Vec::new();
    for (index, attribute) in frame.attributes.iter().enumerate() {
        let mut groups: BTreeMap<&str, GroupCounts> = BTreeMap::new();
        for row in &frame.rows {
            let value = row.groups.get(index).ok_or_else(|| {
                AuditError::Metrics(format!("record has no value for attribute '{attribute}'"))
            })?;
            groups
                .entry(value.as_str())
                .or_default()
                .record(row.score, row.label);
        }

        table.extend(groups.into_iter().map(|(value, counts)| CrosstabRow {
            attribute_name: attribute.clone(),
            attribute_value: value.to_string(),
            counts,
            total_entities,
            k,
        }));
    }

    Ok(table)
}
