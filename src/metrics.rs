//! Group and bias metrics over labeled, scored batches.

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::fairness::bias::disparity_column;
use crate::fairness::{CrosstabToolkit, FairnessToolkit, LABEL_VALUE, SCORE};
use crate::types::application::Record;
use crate::types::report::{metric_cell, metrics_row, MetricsReport};
use tracing::{debug, info};

/// Audits a batch through a fairness toolkit and shapes the result tables
pub struct MetricsReporter<T: FairnessToolkit = CrosstabToolkit> {
    toolkit: T,
    settings: AuditConfig,
}

impl MetricsReporter<CrosstabToolkit> {
    /// Reporter backed by the built-in crosstab toolkit
    pub fn new(settings: AuditConfig) -> Self {
        let toolkit = CrosstabToolkit::new(settings.score_threshold);
        Self { toolkit, settings }
    }
}

impl<T: FairnessToolkit> MetricsReporter<T> {
    /// Reporter backed by a custom toolkit
    pub fn with_toolkit(toolkit: T, settings: AuditConfig) -> Self {
        Self { toolkit, settings }
    }

    pub fn settings(&self) -> &AuditConfig {
        &self.settings
    }

    /// Compute group and bias metrics for a batch.
    ///
    /// Every record needs `score`, `label_value` and each protected
    /// attribute; other keys are ignored.
    pub fn metrics(&self, batch: &[Record]) -> Result<MetricsReport, AuditError> {
        let attributes = self.settings.protected_attributes();
        let projected = project(batch, &attributes)?;

        let frame = self.toolkit.preprocess(&projected, &attributes)?;
        let crosstab = self.toolkit.crosstab(&frame)?;

        let group_metrics: Vec<Record> = crosstab
            .iter()
            .map(|row| {
                let mut out = metrics_row(&row.attribute_name, &row.attribute_value);
                for metric in self.toolkit.absolute_metrics() {
                    out.insert(
                        metric.column().to_string(),
                        metric_cell(row.metric(*metric), self.settings.group_precision),
                    );
                }
                out
            })
            .collect();

        let disparities = self.toolkit.disparity(
            &crosstab,
            &self.settings.reference_groups,
            self.settings.alpha,
            self.settings.mask_significance,
        )?;

        let mut significant = 0;
        let bias_metrics: Vec<Record> = disparities
            .iter()
            .map(|row| {
                significant += row.significant_count();
                debug!(
                    attribute = %row.attribute_name,
                    value = %row.attribute_value,
                    significance = ?row.significance,
                    "Disparity significance"
                );

                let mut out = metrics_row(&row.attribute_name, &row.attribute_value);
                for (metric, value) in &row.disparities {
                    out.insert(
                        disparity_column(*metric),
                        metric_cell(*value, self.settings.bias_precision),
                    );
                }
                out
            })
            .collect();

        info!(
            records = frame.len(),
            groups = group_metrics.len(),
            significant_disparities = significant,
            alpha = self.settings.alpha,
            "Fairness metrics computed"
        );

        Ok(MetricsReport {
            group_metrics,
            bias_metrics,
        })
    }
}

/// Restrict records to the columns the audit reads
fn project(batch: &[Record], attributes: &[String]) -> Result<Vec<Record>, AuditError> {
    let columns: Vec<&str> = [SCORE, LABEL_VALUE]
        .into_iter()
        .chain(attributes.iter().map(String::as_str))
        .collect();

    batch
        .iter()
        .enumerate()
        .map(|(row, record)| {
            columns
                .iter()
                .map(|&column| {
                    record
                        .get(column)
                        .map(|value| (column.to_string(), value.clone()))
                        .ok_or_else(|| AuditError::MissingColumn {
                            row,
                            column: column.to_string(),
                        })
                })
                .collect::<Result<Record, AuditError>>()
        })
        .collect()
}
