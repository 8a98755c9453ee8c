//! Thyroid predictor: three-way classification (negative, hyper, hypo).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::artifacts::domain::{ArtifactRepo, TabularArtifacts, THYROID};
use crate::artifacts::service::load_tabular;
use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::{Domain, FillPolicy, Predictor, RiskTier};
use crate::inference::service::{align, class_probability, observe, round4, score};

use super::domain::ThyroidInput;

const NEGATIVE_CLASS: i64 = 0;
const HIGH_RISK_ABOVE: f64 = 0.8;
const BORDERLINE_ABOVE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThyroidPrediction {
    pub prediction_class: i64,
    pub diagnosis: String,
    /// Probability of any disorder, `1 - P(negative)`.
    pub probability: f64,
    pub risk_level: RiskTier,
    pub class_probabilities: BTreeMap<String, f64>,
    pub model_version: String,
}

pub struct ThyroidPredictor {
    artifacts: TabularArtifacts,
}

impl ThyroidPredictor {
    pub fn load(repo: &dyn ArtifactRepo) -> RiskResult<Self> {
        Ok(Self::new(load_tabular(repo, &THYROID)?))
    }

    pub fn new(artifacts: TabularArtifacts) -> Self {
        Self { artifacts }
    }

    fn run(&self, payload: &Value) -> RiskResult<ThyroidPrediction> {
        let record = ThyroidInput::from_json(payload)?.into_record();
        let x = align(&record, &self.artifacts.schema, FillPolicy::Missing);

        let classifier = self.artifacts.classifier.as_ref();
        let proba = score(classifier, &x)?;
        let predicted = arg_max(classifier.classes(), &proba)?;
        let disorder = 1.0 - class_probability(classifier, &proba, NEGATIVE_CLASS)?;

        let class_probabilities = classifier
            .classes()
            .iter()
            .zip(&proba)
            .map(|(class, p)| (class.to_string(), round4(*p)))
            .collect();

        Ok(ThyroidPrediction {
            prediction_class: predicted,
            diagnosis: diagnosis(predicted),
            probability: round4(disorder),
            risk_level: risk_tier(disorder),
            class_probabilities,
            model_version: classifier.model_version().to_string(),
        })
    }
}

impl Predictor for ThyroidPredictor {
    type Input = Value;
    type Output = ThyroidPrediction;

    fn domain(&self) -> Domain {
        Domain::Thyroid
    }

    fn predict(&self, payload: &Value) -> RiskResult<ThyroidPrediction> {
        observe(Domain::Thyroid, "predict", || self.run(payload))
    }
}

/// Label with the highest probability; the first one wins a tie.
fn arg_max(classes: &[i64], proba: &[f64]) -> RiskResult<i64> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, p) in proba.iter().copied().enumerate() {
        if best.map_or(true, |(_, top)| p > top) {
            best = Some((idx, p));
        }
    }
    best.and_then(|(idx, _)| classes.get(idx).copied())
        .ok_or_else(|| RiskError::scoring("empty class distribution"))
}

pub fn risk_tier(disorder: f64) -> RiskTier {
    if disorder > HIGH_RISK_ABOVE {
        RiskTier::High
    } else if disorder > BORDERLINE_ABOVE {
        RiskTier::Borderline
    } else {
        RiskTier::Low
    }
}

pub fn diagnosis(class: i64) -> String {
    match class {
        0 => "Negative (No Thyroid Disorder)".to_string(),
        1 => "Hyperthyroidism".to_string(),
        2 => "Hypothyroidism".to_string(),
        other => format!("Class {other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::inference::domain::FeatureSchema;
    use crate::model::testing::StubClassifier;

    fn predictor(stub: Arc<StubClassifier>) -> ThyroidPredictor {
        let schema = FeatureSchema::new(["age", "sex", "on thyroxine", "TSH", "TBG"]);
        let artifacts = TabularArtifacts::new(&THYROID, Box::new(stub), schema, None).unwrap();
        ThyroidPredictor::new(artifacts)
    }

    fn payload() -> Value {
        json!({
            "age": 62, "sex": "F", "on thyroxine": 1,
            "TSH": 48.0, "T3": 0.9, "TT4": 40, "T4U": 0.95, "FTI": 42
        })
    }

    #[test]
    fn hypothyroid_prediction() {
        let stub = Arc::new(StubClassifier::new(vec![0, 1, 2], vec![0.05, 0.1, 0.85]));
        let result = predictor(stub).predict(&payload()).unwrap();
        assert_eq!(result.prediction_class, 2);
        assert_eq!(result.diagnosis, "Hypothyroidism");
        assert_eq!(result.probability, 0.95);
        assert_eq!(result.risk_level, RiskTier::High);
        assert_eq!(result.class_probabilities["2"], 0.85);
        assert_eq!(result.class_probabilities.len(), 3);
    }

    #[test]
    fn negative_prediction_is_low_risk() {
        let stub = Arc::new(StubClassifier::new(vec![0, 1, 2], vec![0.7, 0.2, 0.1]));
        let result = predictor(stub).predict(&payload()).unwrap();
        assert_eq!(result.prediction_class, 0);
        assert_eq!(result.diagnosis, "Negative (No Thyroid Disorder)");
        assert_eq!(result.risk_level, RiskTier::Low);
    }

    #[test]
    fn tie_goes_to_first_class() {
        assert_eq!(arg_max(&[0, 1, 2], &[0.4, 0.4, 0.2]).unwrap(), 0);
        assert!(arg_max(&[], &[]).is_err());
    }

    #[test]
    fn unknown_class_label_is_reported_verbatim() {
        assert_eq!(diagnosis(3), "Class 3");
    }

    #[test]
    fn risk_uses_disorder_probability() {
        assert_eq!(risk_tier(0.81), RiskTier::High);
        assert_eq!(risk_tier(0.8), RiskTier::Borderline);
        assert_eq!(risk_tier(0.51), RiskTier::Borderline);
        assert_eq!(risk_tier(0.5), RiskTier::Low);
    }

    #[test]
    fn missing_required_field_skips_scoring() {
        let stub = Arc::new(StubClassifier::new(vec![0, 1, 2], vec![0.3, 0.3, 0.4]));
        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("FTI");
        let err = predictor(stub.clone()).predict(&raw).unwrap_err();
        assert!(err.to_string().contains("'FTI'"));
        assert_eq!(stub.calls(), 0);
    }
}
