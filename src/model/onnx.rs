//! ONNX Runtime backend for the ultrasound image classifier.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;

use super::ImageClassifier;
use crate::common::error::{RiskError, RiskResult};

/// Dense `f32` image batch in NHWC layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTensor {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl ImageTensor {
    /// Returns `None` when `data` does not fill `shape` exactly.
    pub fn new(shape: [usize; 4], data: Vec<f32>) -> Option<Self> {
        (shape.iter().product::<usize>() == data.len()).then_some(Self { shape, data })
    }

    /// Batch of one RGB image with channels scaled to `[0, 1]`.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.as_raw().iter().map(|v| f32::from(*v) / 255.0).collect();
        Self {
            shape: [1, height as usize, width as usize, 3],
            data,
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Image classifier served by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex
/// and concurrent requests are scored one at a time.
pub struct OnnxImageClassifier {
    session: Mutex<Session>,
    path: PathBuf,
}

impl OnnxImageClassifier {
    pub fn load(path: &Path) -> RiskResult<Self> {
        if !path.is_file() {
            return Err(RiskError::artifact_missing(path));
        }
        let failed = |e: String| RiskError::artifact_load(path, e);

        let session = Session::builder()
            .map_err(|e| failed(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e| failed(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| failed(e.to_string()))?;

        tracing::info!(path = %path.display(), "onnx image model loaded");
        Ok(Self {
            session: Mutex::new(session),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageClassifier for OnnxImageClassifier {
    fn predict(&self, tensor: &ImageTensor) -> RiskResult<Vec<f32>> {
        let shape: Vec<i64> = tensor.shape().iter().map(|d| *d as i64).collect();
        let input = Tensor::from_array((shape, tensor.data().to_vec()))
            .map_err(|e| RiskError::scoring(format!("tensor creation failed: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| RiskError::scoring(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| RiskError::scoring(e.to_string()))?;

        let (_name, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| RiskError::scoring("model produced no output tensor"))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| RiskError::scoring(format!("tensor extraction failed: {e}")))?;
        Ok(data.to_vec())
    }
}
