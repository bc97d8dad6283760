//! Group fairness toolkit: preprocessing, crosstabs and disparities.
//!
//! The audit pipeline only talks to the [`FairnessToolkit`] trait, so a
//! different statistics backend can be dropped in as long as it keeps the
//! same three steps and column names.

pub mod bias;
pub mod group;
pub mod preprocess;

use crate::error::AuditError;
use crate::types::application::Record;
use serde::{Deserialize, Serialize};

pub use bias::{DisparityRow, Significance};
pub use group::{AbsoluteMetric, CrosstabRow, GroupCounts};
pub use preprocess::{AuditFrame, AuditRow};

/// Column holding the binary prediction
pub const SCORE: &str = "score";
/// Column holding the binary ground truth
pub const LABEL_VALUE: &str = "label_value";

/// Baseline value of a protected attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGroup {
    pub attribute: String,
    pub value: String,
}

impl ReferenceGroup {
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

/// Preprocess → crosstab → disparity, the contract every backend honours
pub trait FairnessToolkit {
    /// Normalize projected records into crosstab-ready form
    fn preprocess(&self, records: &[Record], attributes: &[String]) -> Result<AuditFrame, AuditError>;

    /// Per-group counts and absolute metrics, keyed by attribute and value
    fn crosstab(&self, frame: &AuditFrame) -> Result<Vec<CrosstabRow>, AuditError>;

    /// Ratios against each attribute's reference group, with significance
    fn disparity(
        &self,
        crosstab: &[CrosstabRow],
        reference_groups: &[ReferenceGroup],
        alpha: f64,
        mask_significance: bool,
    ) -> Result<Vec<DisparityRow>, AuditError>;

    /// Absolute metric columns produced by `crosstab`
    fn absolute_metrics(&self) -> &'static [AbsoluteMetric] {
        &group::ABSOLUTE_METRICS
    }

    /// Metrics that `disparity` turns into ratios
    fn disparity_metrics(&self) -> &'static [AbsoluteMetric] {
        &bias::DISPARITY_METRICS
    }
}

/// Built-in toolkit computing everything from confusion-matrix counts
#[derive(Debug, Clone, Default)]
pub struct CrosstabToolkit {
    /// Probability cut-off applied to non-binary scores
    pub score_threshold: Option<f64>,
}

impl CrosstabToolkit {
    pub fn new(score_threshold: Option<f64>) -> Self {
        Self { score_threshold }
    }
}

impl FairnessToolkit for CrosstabToolkit {
    fn preprocess(&self, records: &[Record], attributes: &[String]) -> Result<AuditFrame, AuditError> {
        preprocess::preprocess(records, attributes, self.score_threshold)
    }

    fn crosstab(&self, frame: &AuditFrame) -> Result<Vec<CrosstabRow>, AuditError> {
        group::crosstab(frame)
    }

    fn disparity(
        &self,
        crosstab: &[CrosstabRow],
        reference_groups: &[ReferenceGroup],
        alpha: f64,
        mask_significance: bool,
    ) -> Result<Vec<DisparityRow>, AuditError> {
        bias::disparity(crosstab, reference_groups, alpha, mask_significance)
    }
}
