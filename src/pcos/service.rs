//! PCOS predictor.

use serde::Serialize;
use serde_json::Value;

use crate::artifacts::domain::{ArtifactRepo, TabularArtifacts, PCOS};
use crate::artifacts::service::load_tabular;
use crate::common::error::RiskResult;
use crate::inference::domain::{Domain, FillPolicy, Predictor, RiskTier, Threshold};
use crate::inference::service::{align, class_probability, observe, round2, round4, score};

use super::domain::{engineer, PcosInput};

const LOW_RISK_BELOW: f64 = 0.3;
const BORDERLINE_BELOW: f64 = 0.6;

const POSITIVE_DIAGNOSIS: &str = "PCOS Positive - Further clinical evaluation recommended";
const NEGATIVE_DIAGNOSIS: &str = "PCOS Negative - No immediate PCOS indicators detected";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PcosPrediction {
    pub prediction: u8,
    pub prediction_label: String,
    pub probability: f64,
    pub risk_level: RiskTier,
    pub threshold_used: f64,
    pub features_used: Vec<String>,
    pub diagnosis: String,
    pub model_version: String,
}

pub struct PcosPredictor {
    artifacts: TabularArtifacts,
    threshold: Threshold,
}

impl PcosPredictor {
    pub fn load(repo: &dyn ArtifactRepo) -> RiskResult<Self> {
        Self::new(load_tabular(repo, &PCOS)?)
    }

    pub fn new(artifacts: TabularArtifacts) -> RiskResult<Self> {
        let threshold = artifacts.decision_threshold()?;
        Ok(Self {
            artifacts,
            threshold,
        })
    }

    fn run(&self, payload: &Value) -> RiskResult<PcosPrediction> {
        let input = PcosInput::from_json(payload)?;
        input.warn_out_of_range();

        let record = engineer(&input).into_record();
        let x = align(&record, &self.artifacts.schema, FillPolicy::Zero);

        let classifier = self.artifacts.classifier.as_ref();
        let proba = score(classifier, &x)?;
        let p = class_probability(classifier, &proba, 1)?;
        let positive = self.threshold.is_positive(p);

        let result = PcosPrediction {
            prediction: u8::from(positive),
            prediction_label: if positive { "PCOS Positive" } else { "PCOS Negative" }.to_string(),
            probability: round4(p),
            risk_level: risk_tier(p),
            threshold_used: round2(self.threshold.value()),
            features_used: self.artifacts.schema.columns().to_vec(),
            diagnosis: if positive { POSITIVE_DIAGNOSIS } else { NEGATIVE_DIAGNOSIS }.to_string(),
            model_version: classifier.model_version().to_string(),
        };
        tracing::info!(
            diagnosis = %result.diagnosis,
            probability = result.probability,
            risk = %result.risk_level,
            "pcos prediction"
        );
        Ok(result)
    }
}

impl Predictor for PcosPredictor {
    type Input = Value;
    type Output = PcosPrediction;

    fn domain(&self) -> Domain {
        Domain::Pcos
    }

    fn predict(&self, payload: &Value) -> RiskResult<PcosPrediction> {
        observe(Domain::Pcos, "predict", || self.run(payload))
    }
}

pub fn risk_tier(p: f64) -> RiskTier {
    if p < LOW_RISK_BELOW {
        RiskTier::Low
    } else if p < BORDERLINE_BELOW {
        RiskTier::Borderline
    } else {
        RiskTier::High
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::inference::domain::FeatureSchema;
    use crate::model::testing::StubClassifier;

    fn predictor(stub: Arc<StubClassifier>, threshold: f64) -> PcosPredictor {
        let schema = FeatureSchema::new(["Age", "BMI", "AFC_High", "Testosterone_AFC_Ratio"]);
        let artifacts =
            TabularArtifacts::new(&PCOS, Box::new(stub), schema, Threshold::new(threshold)).unwrap();
        PcosPredictor::new(artifacts).unwrap()
    }

    fn payload() -> Value {
        json!({
            "age": 27, "bmi": 28.5, "menstrual_irregularity": 1,
            "testosterone_level": 55.0, "antral_follicle_count": 14
        })
    }

    #[test]
    fn positive_result_shape() {
        let result = predictor(Arc::new(StubClassifier::binary(0.55)), 0.356)
            .predict(&payload())
            .unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(result.prediction_label, "PCOS Positive");
        assert_eq!(result.risk_level, RiskTier::Borderline);
        assert_eq!(result.threshold_used, 0.36);
        assert_eq!(result.diagnosis, POSITIVE_DIAGNOSIS);
        assert_eq!(
            result.features_used,
            ["Age", "BMI", "AFC_High", "Testosterone_AFC_Ratio"]
        );
    }

    #[test]
    fn below_threshold_is_negative() {
        let result = predictor(Arc::new(StubClassifier::binary(0.2)), 0.356)
            .predict(&payload())
            .unwrap();
        assert_eq!(result.prediction, 0);
        assert_eq!(result.diagnosis, NEGATIVE_DIAGNOSIS);
        assert_eq!(result.risk_level, RiskTier::Low);
    }

    #[test]
    fn reported_threshold_rounds_like_the_stored_value() {
        let result = predictor(Arc::new(StubClassifier::binary(0.4)), 0.355)
            .predict(&payload())
            .unwrap();
        assert_eq!(result.threshold_used, 0.35);
        assert_eq!(result.prediction, 1);
    }

    #[test]
    fn tier_cut_points_are_independent_of_threshold() {
        assert_eq!(risk_tier(0.2999), RiskTier::Low);
        assert_eq!(risk_tier(0.3), RiskTier::Borderline);
        assert_eq!(risk_tier(0.5999), RiskTier::Borderline);
        assert_eq!(risk_tier(0.6), RiskTier::High);
    }

    #[test]
    fn out_of_range_values_are_still_scored() {
        let stub = Arc::new(StubClassifier::binary(0.7));
        let mut raw = payload();
        raw["age"] = json!(75);
        raw["testosterone_level"] = json!(250.0);
        let result = predictor(stub.clone(), 0.5).predict(&raw).unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn serialized_payload_uses_display_labels() {
        let result = predictor(Arc::new(StubClassifier::binary(0.9)), 0.5)
            .predict(&payload())
            .unwrap();
        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["risk_level"], "High");
        assert_eq!(body["prediction"], 1);
        assert_eq!(body["threshold_used"], 0.5);
    }
}
