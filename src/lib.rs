//! Credit Risk Audit Library
//!
//! Scores loan applications with a pre-trained credit default classifier
//! and audits labeled, scored batches for group fairness across protected
//! attributes.

pub mod config;
pub mod consumer;
pub mod error;
pub mod fairness;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::RecordReader;
pub use error::AuditError;
pub use fairness::{CrosstabToolkit, FairnessToolkit, ReferenceGroup};
pub use feature_extractor::FeatureExtractor;
pub use metrics::MetricsReporter;
pub use models::inference::InferenceEngine;
pub use producer::ReportWriter;
pub use types::{application::Record, report::MetricsReport};
