//! Model artifact loader

use crate::error::AuditError;
use crate::models::classifier::Classifier;
use crate::models::logistic::LogisticModel;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loader for trained classifier artifacts.
///
/// The backend is picked from the file extension: `.json` holds a
/// logistic regression, `.onnx` an exported graph (with the `onnx`
/// feature) whose encoder lives next to it in `<stem>.encoder.json`.
#[derive(Debug, Default)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a classifier from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<dyn Classifier>, AuditError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        info!(path = %source, "Loading model artifact");

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let model: Arc<dyn Classifier> = match extension.as_deref() {
            Some("json") => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| AuditError::artifact(&source, e.to_string()))?;
                Arc::new(LogisticModel::from_json(&text, &source)?)
            }
            Some("onnx") => self.load_onnx(path)?,
            other => {
                return Err(AuditError::artifact(
                    &source,
                    format!("unsupported artifact type {other:?}"),
                ));
            }
        };

        info!(model = %model.name(), path = %source, "Model loaded successfully");

        Ok(model)
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path) -> Result<Arc<dyn Classifier>, AuditError> {
        use crate::models::encoder::FeatureEncoder;
        use crate::models::onnx::OnnxModel;

        #[derive(serde::Deserialize)]
        struct EncoderSidecar {
            #[serde(default = "default_threshold")]
            threshold: f64,
            #[serde(flatten)]
            encoder: FeatureEncoder,
        }

        fn default_threshold() -> f64 {
            0.5
        }

        let sidecar_path = path.with_extension("encoder.json");
        let sidecar_source = sidecar_path.display().to_string();
        let text = std::fs::read_to_string(&sidecar_path)
            .map_err(|e| AuditError::artifact(&sidecar_source, e.to_string()))?;
        let sidecar: EncoderSidecar = serde_json::from_str(&text)
            .map_err(|e| AuditError::artifact(&sidecar_source, e.to_string()))?;
        sidecar.encoder.validate(&sidecar_source)?;

        Ok(Arc::new(OnnxModel::load(
            path,
            sidecar.encoder,
            sidecar.threshold,
        )?))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path) -> Result<Arc<dyn Classifier>, AuditError> {
        Err(AuditError::artifact(
            path.display().to_string(),
            "built without the `onnx` feature",
        ))
    }
}
