//! Breast ultrasound predictor: guard, preprocessing and arg-max decision.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::artifacts::domain::{ArtifactRepo, IMAGE_MODEL_FILE};
use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::{Domain, Predictor, RiskTier};
use crate::inference::service::observe;
use crate::model::{ImageClassifier, OnnxImageClassifier};

use super::domain::{decode, to_tensor, UltrasoundClass};
use super::guard::{self, Rejection};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreastCancerPrediction {
    /// `success`, or `rejected` when the image guard refused the upload.
    pub status: &'static str,
    pub classification: String,
    /// Confidence of the predicted class, unrounded.
    pub probability: f64,
    pub risk_level: RiskTier,
    pub diagnosis: String,
    pub class_probabilities: BTreeMap<String, f64>,
    pub low_confidence: bool,
}

impl BreastCancerPrediction {
    fn rejected(reason: &Rejection) -> Self {
        Self {
            status: "rejected",
            classification: "unknown".to_string(),
            probability: 0.0,
            risk_level: RiskTier::InvalidInput,
            diagnosis: reason.to_string(),
            class_probabilities: UltrasoundClass::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0.0))
                .collect(),
            low_confidence: true,
        }
    }
}

pub struct BreastCancerPredictor {
    model: Box<dyn ImageClassifier>,
}

impl BreastCancerPredictor {
    pub fn load(repo: &dyn ArtifactRepo) -> RiskResult<Self> {
        let path = repo.locate(IMAGE_MODEL_FILE)?;
        Ok(Self::new(Box::new(OnnxImageClassifier::load(&path)?)))
    }

    pub fn new(model: Box<dyn ImageClassifier>) -> Self {
        Self { model }
    }

    fn run(&self, bytes: &[u8]) -> RiskResult<BreastCancerPrediction> {
        let img = decode(bytes)?;
        if let Err(reason) = guard::inspect(&img) {
            tracing::info!(
                width = img.width(),
                height = img.height(),
                reason = %reason,
                "image rejected by guard"
            );
            return Ok(BreastCancerPrediction::rejected(&reason));
        }

        let scores = self.model.predict(&to_tensor(&img))?;
        if scores.len() != UltrasoundClass::ALL.len() {
            return Err(RiskError::scoring(format!(
                "image model returned {} scores for {} classes",
                scores.len(),
                UltrasoundClass::ALL.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(RiskError::scoring(format!(
                "image model returned a non-finite score ({bad})"
            )));
        }

        let mut best = 0;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = idx;
            }
        }
        let class = UltrasoundClass::ALL[best];

        Ok(BreastCancerPrediction {
            status: "success",
            classification: class.as_str().to_string(),
            probability: f64::from(scores[best]),
            risk_level: class.risk_tier(),
            diagnosis: class.diagnosis().to_string(),
            class_probabilities: UltrasoundClass::ALL
                .iter()
                .zip(&scores)
                .map(|(c, s)| (c.as_str().to_string(), f64::from(*s)))
                .collect(),
            low_confidence: false,
        })
    }
}

impl Predictor for BreastCancerPredictor {
    type Input = [u8];
    type Output = BreastCancerPrediction;

    fn domain(&self) -> Domain {
        Domain::BreastCancer
    }

    fn predict(&self, bytes: &[u8]) -> RiskResult<BreastCancerPrediction> {
        observe(Domain::BreastCancer, "predict", || self.run(bytes))
    }
}
