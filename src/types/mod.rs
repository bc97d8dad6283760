//! Type definitions for scoring and auditing

pub mod application;
pub mod report;

pub use application::{FeatureKind, FeatureRow, FeatureValue, Record};
pub use report::MetricsReport;
