//! ONNX Runtime backend for classifiers exported from the training pipeline

use crate::error::AuditError;
use crate::models::classifier::{Classifier, Prediction};
use crate::models::encoder::FeatureEncoder;
use crate::types::application::FeatureRow;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Classifier backed by an ONNX graph over the encoded feature vector
pub struct OnnxModel {
    name: String,
    /// ONNX Runtime session (write-locked per run)
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    encoder: FeatureEncoder,
    threshold: f64,
}

impl OnnxModel {
    /// Load a graph and its encoder sidecar
    pub fn load(path: &Path, encoder: FeatureEncoder, threshold: f64) -> Result<Self, AuditError> {
        let source = path.display().to_string();
        let to_artifact = |e: ort::Error| AuditError::artifact(&source, e.to_string());

        ort::init().commit().map_err(to_artifact)?;

        let session = Session::builder()
            .map_err(to_artifact)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(to_artifact)?
            .with_intra_threads(1)
            .map_err(to_artifact)?
            .commit_from_file(path)
            .map_err(to_artifact)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            name,
            session: RwLock::new(session),
            input_name,
            output_name,
            encoder,
            threshold,
        })
    }

    /// Positive-class probability from a tensor of shape
    /// `[batch, classes]`, `[batch, 1]` or `[classes]`
    fn positive_probability(dims: &[i64], data: &[f32]) -> Option<f64> {
        let classes = match dims {
            [_, classes] | [classes] => *classes,
            _ => return data.last().map(|&v| f64::from(v)),
        };

        match classes {
            n if n >= 2 => data.get(1).map(|&v| f64::from(v)),
            1 => data.first().map(|&v| f64::from(v)),
            _ => None,
        }
    }
}

impl Classifier for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureRow) -> Result<Prediction, AuditError> {
        let encoded: Vec<f32> = self
            .encoder
            .encode(features)?
            .into_iter()
            .map(|v| v as f32)
            .collect();

        let shape = vec![1_i64, encoded.len() as i64];
        let input = Tensor::from_array((shape, encoded))
            .map_err(|e| AuditError::Prediction(e.to_string()))?;

        let mut session = self
            .session
            .write()
            .map_err(|e| AuditError::Prediction(format!("Lock error: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| AuditError::Prediction(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            AuditError::Prediction(format!("missing output '{}'", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| AuditError::Prediction(e.to_string()))?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let probability = Self::positive_probability(&dims, data).ok_or_else(|| {
            AuditError::Prediction(format!("cannot read probability from output shape {dims:?}"))
        })?;

        debug!(model = %self.name, probability = probability, "ONNX prediction");

        Ok(Prediction::from_probability(probability, self.threshold))
    }
}
