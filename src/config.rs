//! Configuration management for credit scoring and fairness audits

use crate::fairness::ReferenceGroup;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path of the trained classifier artifact (`.json` or `.onnx`)
    #[serde(default = "default_model_path")]
    pub path: String,
}

fn default_model_path() -> String {
    "models/credit_classifier.json".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

/// Fairness audit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Baseline group per protected attribute; also fixes attribute order
    #[serde(default = "default_reference_groups")]
    pub reference_groups: Vec<ReferenceGroup>,
    /// Significance level for disparity tests
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Reduce p-values to significant/not significant flags
    #[serde(default = "default_mask_significance")]
    pub mask_significance: bool,
    /// Cut-off for probability scores; scores must be 0/1 when unset
    #[serde(default)]
    pub score_threshold: Option<f64>,
    /// Decimals kept in the group metrics table
    #[serde(default = "default_group_precision")]
    pub group_precision: u32,
    /// Decimals kept in the bias metrics table
    #[serde(default = "default_bias_precision")]
    pub bias_precision: u32,
}

fn default_reference_groups() -> Vec<ReferenceGroup> {
    vec![
        ReferenceGroup::new("gender", "male"),
        ReferenceGroup::new("age_over_forty", "False"),
    ]
}

fn default_alpha() -> f64 {
    0.05
}

fn default_mask_significance() -> bool {
    true
}

fn default_group_precision() -> u32 {
    2
}

fn default_bias_precision() -> u32 {
    3
}

impl AuditConfig {
    /// Protected attributes, in reference group order
    pub fn protected_attributes(&self) -> Vec<String> {
        self.reference_groups
            .iter()
            .map(|r| r.attribute.clone())
            .collect()
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            reference_groups: default_reference_groups(),
            alpha: default_alpha(),
            mask_significance: default_mask_significance(),
            score_threshold: None,
            group_precision: default_group_precision(),
            bias_precision: default_bias_precision(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    ///
    /// `CREDIT_AUDIT__SECTION__KEY` environment variables override the file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CREDIT_AUDIT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.audit.alpha > 0.0 && self.audit.alpha < 1.0) {
            anyhow::bail!("audit.alpha must be in (0, 1), got {}", self.audit.alpha);
        }
        let mut attributes = self.audit.protected_attributes();
        attributes.sort();
        attributes.dedup();
        if attributes.len() != self.audit.reference_groups.len() {
            anyhow::bail!("audit.reference_groups lists an attribute more than once");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            audit: AuditConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.path, "models/credit_classifier.json");
        assert_eq!(config.audit.alpha, 0.05);
        assert!(config.audit.mask_significance);
        assert_eq!(config.audit.group_precision, 2);
        assert_eq!(config.audit.bias_precision, 3);
        assert_eq!(
            config.audit.protected_attributes(),
            vec!["gender".to_string(), "age_over_forty".to_string()]
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_shipped_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.toml");
        let config = AppConfig::load_from_path(path).unwrap();

        assert_eq!(config.model.path, "models/credit_classifier.json");
        assert_eq!(config.audit.reference_groups, AuditConfig::default().reference_groups);
        assert_eq!(config.audit.score_threshold, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_custom_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[model]
path = "models/other.json"

[audit]
alpha = 0.01
score_threshold = 0.6

[[audit.reference_groups]]
attribute = "gender"
value = "female"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.path, "models/other.json");
        assert_eq!(config.audit.alpha, 0.01);
        assert_eq!(config.audit.score_threshold, Some(0.6));
        assert_eq!(config.audit.reference_groups, vec![ReferenceGroup::new("gender", "female")]);
        assert_eq!(config.audit.group_precision, 2);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_model_section_only() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[model]\npath = \"models/other.json\"").unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.path, "models/other.json");
        assert_eq!(config.audit.reference_groups, AuditConfig::default().reference_groups);
        assert!(config.audit.mask_significance);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_environment_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[audit]\nbias_precision = 3").unwrap();

        std::env::set_var("CREDIT_AUDIT__AUDIT__BIAS_PRECISION", "4");
        let result = AppConfig::load_from_path(file.path());
        std::env::remove_var("CREDIT_AUDIT__AUDIT__BIAS_PRECISION");

        let config = result.unwrap();
        assert_eq!(config.audit.bias_precision, 4);
        assert_eq!(config.model.path, "models/credit_classifier.json");
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let mut config = AppConfig::default();
        config.audit.alpha = 1.5;
        assert!(config.validate().is_err());
    }
}
