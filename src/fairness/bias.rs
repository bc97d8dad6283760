//! Disparities relative to reference groups, with significance testing

use crate::error::AuditError;
use crate::fairness::group::{AbsoluteMetric, CrosstabRow};
use crate::fairness::ReferenceGroup;
use statrs::distribution::{ContinuousCDF, Normal};

/// Metrics turned into `<metric>_disparity` ratios, in output order
pub const DISPARITY_METRICS: [AbsoluteMetric; 10] = [
    AbsoluteMetric::Ppr,
    AbsoluteMetric::Pprev,
    AbsoluteMetric::Precision,
    AbsoluteMetric::Fdr,
    AbsoluteMetric::For,
    AbsoluteMetric::Fpr,
    AbsoluteMetric::Fnr,
    AbsoluteMetric::Tpr,
    AbsoluteMetric::Tnr,
    AbsoluteMetric::Npv,
];

/// Outcome of testing one disparity against its reference group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Significance {
    /// `p < alpha`, when significance is masked to a flag
    Masked(bool),
    /// Raw two-sided p-value
    PValue(f64),
    /// Reference group itself, a sample too small to test, or `ppr`,
    /// whose shares of one batch-wide total are not independent samples
    NotTested,
}

/// One bias table row
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityRow {
    pub attribute_name: String,
    pub attribute_value: String,
    pub is_reference: bool,
    /// Ratio per metric; `None` when undefined or infinite
    pub disparities: Vec<(AbsoluteMetric, Option<f64>)>,
    pub significance: Vec<(AbsoluteMetric, Significance)>,
}

impl DisparityRow {
    pub fn disparity(&self, metric: AbsoluteMetric) -> Option<f64> {
        self.disparities
            .iter()
            .find(|(m, _)| *m == metric)
            .and_then(|(_, v)| *v)
    }

    /// Number of metrics flagged as significantly different
    pub fn significant_count(&self) -> usize {
        self.significance
            .iter()
            .filter(|(_, s)| matches!(s, Significance::Masked(true)))
            .count()
    }
}

/// Column name for a disparity ratio
pub fn disparity_column(metric: AbsoluteMetric) -> String {
    format!("{}_disparity", metric.column())
}

/// Compute every group's disparities against its attribute's reference.
///
/// Reference rows are 1.0 by definition, even where the metric itself is
/// undefined.
pub fn disparity(
    crosstab: &[CrosstabRow],
    reference_groups: &[ReferenceGroup],
    alpha: f64,
    mask_significance: bool,
) -> Result<Vec<DisparityRow>, AuditError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AuditError::Metrics(format!("alpha {alpha} is outside (0, 1)")));
    }

    for reference in reference_groups {
        if !crosstab.iter().any(|r| r.attribute_name == reference.attribute) {
            return Err(AuditError::ReferenceGroup {
                attribute: reference.attribute.clone(),
                reason: "attribute is not present in the crosstab".to_string(),
            });
        }
    }

    let mut rows = Vec::with_capacity(crosstab.len());
    for row in crosstab {
        let reference = reference_groups
            .iter()
            .find(|r| r.attribute == row.attribute_name)
            .ok_or_else(|| AuditError::ReferenceGroup {
                attribute: row.attribute_name.clone(),
                reason: "no reference group configured".to_string(),
            })?;

        let reference_row = crosstab
            .iter()
            .find(|r| r.attribute_name == reference.attribute && r.attribute_value == reference.value)
            .ok_or_else(|| AuditError::ReferenceGroup {
                attribute: reference.attribute.clone(),
                reason: format!("reference value '{}' is not present in the batch", reference.value),
            })?;

        let is_reference = row.attribute_value == reference.value;

        let disparities = DISPARITY_METRICS
            .iter()
            .map(|&metric| {
                let ratio = if is_reference {
                    Some(1.0)
                } else {
                    ratio(row.metric(metric), reference_row.metric(metric))
                };
                (metric, ratio)
            })
            .collect();

        let significance = DISPARITY_METRICS
            .iter()
            .map(|&metric| {
                let outcome = if is_reference || metric == AbsoluteMetric::Ppr {
                    Significance::NotTested
                } else {
                    let (x1, n1) = row.counts.proportion(metric, row.k);
                    let (x2, n2) = reference_row.counts.proportion(metric, reference_row.k);
                    match two_proportion_p_value(x1, n1, x2, n2) {
                        Some(p) if mask_significance => Significance::Masked(p < alpha),
                        Some(p) => Significance::PValue(p),
                        None => Significance::NotTested,
                    }
                };
                (metric, outcome)
            })
            .collect();

        rows.push(DisparityRow {
            attribute_name: row.attribute_name.clone(),
            attribute_value: row.attribute_value.clone(),
            is_reference,
            disparities,
            significance,
        });
    }

    Ok(rows)
}

fn ratio(group: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (group, reference) {
        (Some(g), Some(r)) if r != 0.0 => Some(g / r).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Two-sided p-value of a pooled two-proportion z-test
fn two_proportion_p_value(x1: u64, n1: u64, x2: u64, n2: u64) -> Option<f64> {
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let p1 = x1 as f64 / n1f;
    let p2 = x2 as f64 / n2f;
    let pooled = (x1 + x2) as f64 / (n1f + n2f);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1f + 1.0 / n2f)).sqrt();

    if se == 0.0 {
        return Some(if p1 == p2 { 1.0 } else { 0.0 });
    }

    let z = (p1 - p2) / se;
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some((2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0))
}
