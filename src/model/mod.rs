//! Classifier seams and their concrete backends.
//!
//! Tabular services score through [`Classifier`], the image service through
//! [`ImageClassifier`]. Both are read-only after load and shared across
//! concurrent requests.

pub mod estimator;
pub mod onnx;
pub mod pipeline;

use crate::common::error::RiskResult;
use crate::inference::domain::AlignedFeatureVector;

pub use onnx::{ImageTensor, OnnxImageClassifier};
pub use pipeline::Pipeline;

/// Version reported when an artifact does not record one.
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";

/// Probability model over a fixed, ordered set of integer class labels.
pub trait Classifier: Send + Sync {
    /// Class labels in the order `predict_proba` reports them.
    fn classes(&self) -> &[i64];

    /// Class-probability distribution for a single aligned row.
    fn predict_proba(&self, x: &AlignedFeatureVector) -> RiskResult<Vec<f64>>;

    fn model_version(&self) -> &str {
        DEFAULT_MODEL_VERSION
    }
}

/// Image model producing one score per class for a preprocessed tensor.
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, tensor: &ImageTensor) -> RiskResult<Vec<f32>>;
}
