//! Credit default classifiers and single-record inference

pub mod classifier;
pub mod encoder;
pub mod inference;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use classifier::{Classifier, Prediction};
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
pub use logistic::LogisticModel;
