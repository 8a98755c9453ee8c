//! Osteoporosis predictor.

use serde::Serialize;
use serde_json::Value;

use crate::artifacts::domain::{ArtifactRepo, TabularArtifacts, OSTEOPOROSIS};
use crate::artifacts::service::load_tabular;
use crate::common::error::RiskResult;
use crate::inference::domain::{Domain, FillPolicy, Predictor, RiskTier, Threshold};
use crate::inference::service::{align, class_probability, observe, percent, round4, score};

use super::domain::{engineer, OsteoporosisInput};

const HIGH_RISK_ABOVE: f64 = 0.8;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OsteoporosisPrediction {
    pub prediction_label: String,
    pub prediction: u8,
    pub probability: f64,
    pub risk_level: RiskTier,
    pub diagnosis: String,
    pub threshold_used: f64,
    pub model_version: String,
}

pub struct OsteoporosisPredictor {
    artifacts: TabularArtifacts,
    threshold: Threshold,
}

impl OsteoporosisPredictor {
    pub fn load(repo: &dyn ArtifactRepo) -> RiskResult<Self> {
        Self::new(load_tabular(repo, &OSTEOPOROSIS)?)
    }

    pub fn new(artifacts: TabularArtifacts) -> RiskResult<Self> {
        let threshold = artifacts.decision_threshold()?;
        Ok(Self {
            artifacts,
            threshold,
        })
    }

    fn run(&self, payload: &Value) -> RiskResult<OsteoporosisPrediction> {
        let input = OsteoporosisInput::from_json(payload)?;
        let record = engineer(&input).into_record();
        // Absent columns stay missing so the pipeline's imputers see them.
        let x = align(&record, &self.artifacts.schema, FillPolicy::Missing);

        let classifier = self.artifacts.classifier.as_ref();
        let proba = score(classifier, &x)?;
        let p = class_probability(classifier, &proba, 1)?;
        let positive = self.threshold.is_positive(p);

        Ok(OsteoporosisPrediction {
            prediction_label: if positive { "Osteoporosis" } else { "No Osteoporosis" }.to_string(),
            prediction: u8::from(positive),
            probability: round4(p),
            risk_level: risk_tier(p, self.threshold),
            diagnosis: diagnosis(positive, p),
            threshold_used: self.threshold.value(),
            model_version: classifier.model_version().to_string(),
        })
    }
}

impl Predictor for OsteoporosisPredictor {
    type Input = Value;
    type Output = OsteoporosisPrediction;

    fn domain(&self) -> Domain {
        Domain::Osteoporosis
    }

    fn predict(&self, payload: &Value) -> RiskResult<OsteoporosisPrediction> {
        observe(Domain::Osteoporosis, "predict", || self.run(payload))
    }
}

pub fn risk_tier(p: f64, threshold: Threshold) -> RiskTier {
    if p > HIGH_RISK_ABOVE {
        RiskTier::High
    } else if threshold.is_positive(p) {
        RiskTier::Borderline
    } else {
        RiskTier::Low
    }
}

fn diagnosis(positive: bool, p: f64) -> String {
    let (risk, advice) = if positive {
        (
            "a significant",
            "Please consult an endocrinologist or rheumatologist for a DEXA scan and further evaluation.",
        )
    } else {
        (
            "a low",
            "Continue maintaining bone-healthy habits and discuss routine screening with your doctor.",
        )
    };
    format!(
        "Based on the provided risk factors, the model predicts {risk} risk of osteoporosis (probability {}). {advice}",
        percent(p)
    )
}
