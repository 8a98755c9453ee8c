//! Anemia predictor: validation, engineering, scoring and the decision.

use serde::Serialize;
use serde_json::Value;

use crate::artifacts::domain::{ArtifactRepo, TabularArtifacts, ANEMIA};
use crate::artifacts::service::load_tabular;
use crate::common::error::RiskResult;
use crate::inference::domain::{Domain, FillPolicy, Predictor, RiskTier, Threshold};
use crate::inference::service::{align, class_probability, observe, percent, round4, score};

use super::domain::{engineer, AnemiaInput};

/// Probability above which the risk is reported as high.
const HIGH_RISK_ABOVE: f64 = 0.8;
/// Probability above which the risk is reported as borderline.
const BORDERLINE_ABOVE: f64 = 0.47;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnemiaPrediction {
    pub prediction_label: String,
    pub prediction: u8,
    pub probability: f64,
    pub risk_level: RiskTier,
    pub diagnosis: String,
    pub threshold_used: f64,
    pub model_version: String,
}

pub struct AnemiaPredictor {
    artifacts: TabularArtifacts,
    threshold: Threshold,
}

impl AnemiaPredictor {
    pub fn load(repo: &dyn ArtifactRepo) -> RiskResult<Self> {
        Self::new(load_tabular(repo, &ANEMIA)?)
    }

    pub fn new(artifacts: TabularArtifacts) -> RiskResult<Self> {
        let threshold = artifacts.decision_threshold()?;
        Ok(Self {
            artifacts,
            threshold,
        })
    }

    fn run(&self, payload: &Value) -> RiskResult<AnemiaPrediction> {
        let input = AnemiaInput::from_json(payload)?;
        let record = engineer(&input).into_record();
        let x = align(&record, &self.artifacts.schema, FillPolicy::Zero);

        let classifier = self.artifacts.classifier.as_ref();
        let proba = score(classifier, &x)?;
        let p = class_probability(classifier, &proba, 1)?;
        let positive = self.threshold.is_positive(p);

        Ok(AnemiaPrediction {
            prediction_label: if positive { "Anemic" } else { "Not Anemic" }.to_string(),
            prediction: u8::from(positive),
            probability: round4(p),
            risk_level: risk_tier(p),
            diagnosis: diagnosis(positive, p),
            threshold_used: self.threshold.value(),
            model_version: classifier.model_version().to_string(),
        })
    }
}

impl Predictor for AnemiaPredictor {
    type Input = Value;
    type Output = AnemiaPrediction;

    fn domain(&self) -> Domain {
        Domain::Anemia
    }

    fn predict(&self, payload: &Value) -> RiskResult<AnemiaPrediction> {
        observe(Domain::Anemia, "predict", || self.run(payload))
    }
}

pub fn risk_tier(p: f64) -> RiskTier {
    if p > HIGH_RISK_ABOVE {
        RiskTier::High
    } else if p > BORDERLINE_ABOVE {
        RiskTier::Borderline
    } else {
        RiskTier::Low
    }
}

fn diagnosis(positive: bool, p: f64) -> String {
    let (likelihood, advice) = if positive {
        (
            "a significant",
            "Please consult a physician for a complete blood count review.",
        )
    } else {
        ("a low", "No immediate signs of anemia were detected.")
    };
    format!(
        "Based on the provided blood indices, the model predicts {likelihood} likelihood of anemia (probability {}). {advice}",
        percent(p)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::artifacts::domain::ANEMIA;
    use crate::common::error::RiskError;
    use crate::inference::domain::FeatureSchema;
    use crate::model::testing::StubClassifier;

    fn predictor(stub: Arc<StubClassifier>) -> AnemiaPredictor {
        let schema = FeatureSchema::new([
            "Gender",
            "Hemoglobin",
            "MCH",
            "MCHC",
            "MCV",
            "hb_below_threshold",
            "mch_mchc_ratio",
        ]);
        let artifacts =
            TabularArtifacts::new(&ANEMIA, Box::new(stub), schema, Threshold::new(0.47)).unwrap();
        AnemiaPredictor::new(artifacts).unwrap()
    }

    fn payload() -> Value {
        json!({"Gender": 1, "Hemoglobin": 10.0, "MCH": 30, "MCHC": 33, "MCV": 90})
    }

    #[test]
    fn positive_at_threshold() {
        let result = predictor(Arc::new(StubClassifier::binary(0.47)))
            .predict(&payload())
            .unwrap();
        assert_eq!(result.prediction, 1);
        assert_eq!(result.prediction_label, "Anemic");
        assert_eq!(result.risk_level, RiskTier::Low);
        assert_eq!(result.threshold_used, 0.47);
        assert_eq!(result.model_version, "1.0.0");
    }

    #[test]
    fn high_probability_is_high_risk() {
        let result = predictor(Arc::new(StubClassifier::binary(0.912_34)))
            .predict(&payload())
            .unwrap();
        assert_eq!(result.probability, 0.9123);
        assert_eq!(result.risk_level, RiskTier::High);
        assert!(result.diagnosis.contains("a significant likelihood"));
        assert!(result.diagnosis.contains("(probability 91.2%)"));
    }

    #[test]
    fn tiers_follow_fixed_cut_points() {
        assert_eq!(risk_tier(0.81), RiskTier::High);
        assert_eq!(risk_tier(0.8), RiskTier::Borderline);
        assert_eq!(risk_tier(0.48), RiskTier::Borderline);
        assert_eq!(risk_tier(0.47), RiskTier::Low);
    }

    #[test]
    fn missing_field_never_reaches_the_classifier() {
        let stub = Arc::new(StubClassifier::binary(0.9));
        let err = predictor(stub.clone())
            .predict(&json!({"Gender": 1, "Hemoglobin": 10.0, "MCH": 30, "MCHC": 33}))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'MCV'"));
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn classifier_failure_is_a_scoring_error() {
        let stub = Arc::new(StubClassifier::failing(vec![0, 1]));
        let err = predictor(stub).predict(&payload()).unwrap_err();
        assert!(matches!(err, RiskError::Scoring { .. }));
    }

    #[test]
    fn repeated_requests_are_identical() {
        let predictor = predictor(Arc::new(StubClassifier::binary(0.6)));
        let first = predictor.predict(&payload()).unwrap();
        let second = predictor.predict(&payload()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn batch_stops_at_first_invalid_payload() {
        let stub = Arc::new(StubClassifier::binary(0.6));
        let predictor = predictor(stub.clone());
        let payloads = [payload(), json!({}), payload()];
        let err = predictor.predict_batch(&payloads).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(stub.calls(), 1);
    }
}
