//! Inference orchestration shared by the tabular predictors: schema
//! alignment, scoring, and the bookkeeping around a single request.

use std::time::Instant;

use crate::common::error::{RiskCode, RiskError, RiskResult};
use crate::common::log;
use crate::model::Classifier;

use super::domain::{AlignedFeatureVector, Domain, EngineeredRecord, FeatureSchema, FillPolicy};

/// Reindex an engineered record to the schema.
///
/// Columns the record does not carry receive the fill value; record columns
/// outside the schema are dropped.
pub fn align(
    record: &EngineeredRecord,
    schema: &FeatureSchema,
    fill: FillPolicy,
) -> AlignedFeatureVector {
    let mut filled = Vec::new();
    let values = schema
        .columns()
        .iter()
        .map(|column| match record.get(column) {
            Some(value) => value.clone(),
            None => {
                filled.push(column.as_str());
                fill.value()
            }
        })
        .collect();

    if !filled.is_empty() {
        tracing::debug!(?filled, ?fill, "schema columns absent from record were filled");
    }

    AlignedFeatureVector {
        columns: schema.columns().to_vec(),
        values,
    }
}

/// Score one aligned vector and check the distribution is usable.
pub fn score(classifier: &dyn Classifier, x: &AlignedFeatureVector) -> RiskResult<Vec<f64>> {
    tracing::info!(features = ?x.values(), columns = ?x.columns(), "running prediction");
    let proba = classifier.predict_proba(x)?;

    if proba.len() != classifier.classes().len() {
        return Err(RiskError::scoring(format!(
            "classifier returned {} probabilities for {} classes",
            proba.len(),
            classifier.classes().len()
        )));
    }
    if let Some(bad) = proba.iter().find(|p| !p.is_finite()) {
        return Err(RiskError::scoring(format!(
            "classifier returned a non-finite probability ({bad})"
        )));
    }
    Ok(proba)
}

/// Probability assigned to the class with the given label.
pub fn class_probability(
    classifier: &dyn Classifier,
    proba: &[f64],
    label: i64,
) -> RiskResult<f64> {
    classifier
        .classes()
        .iter()
        .position(|c| *c == label)
        .and_then(|idx| proba.get(idx).copied())
        .ok_or_else(|| RiskError::scoring(format!("classifier has no class {label}")))
}

/// Round to four decimals.
pub fn round4(x: f64) -> f64 {
    round_to(x, 4)
}

/// Round to two decimals.
pub fn round2(x: f64) -> f64 {
    round_to(x, 2)
}

/// Decimal rounding of the exact binary value, so `0.355` (stored just
/// below the tie) becomes `0.35`. Scaling first would round it up.
fn round_to(x: f64, digits: usize) -> f64 {
    format!("{x:.digits$}").parse().unwrap_or(x)
}

/// Render a probability as a percentage with one decimal, e.g. `73.4%`.
pub fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Time a request, log its outcome and report failures at the right level.
///
/// Scoring failures are logged with their full detail here because callers
/// only ever see a generic message.
pub fn observe<T, F>(domain: Domain, event: &str, run: F) -> RiskResult<T>
where
    F: FnOnce() -> RiskResult<T>,
{
    let start = Instant::now();
    let result = run();
    let dur_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(_) => log::log_outcome(domain, event, RiskCode::Ok, dur_ms),
        Err(err) => {
            match err {
                RiskError::Validation(inner) => {
                    tracing::warn!(domain = domain.slug(), error = %inner, "validation error");
                }
                other => {
                    tracing::error!(domain = domain.slug(), error = ?other, "prediction error");
                }
            }
            log::log_outcome(domain, event, err.code(), dur_ms);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::domain::FeatureValue;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["b", "a", "c"])
    }

    #[test]
    fn align_reorders_to_schema() {
        let record = EngineeredRecord::new()
            .with("a", 1.0)
            .with("b", 2.0)
            .with("c", "x");
        let x = align(&record, &schema(), FillPolicy::Zero);
        assert_eq!(x.columns(), ["b", "a", "c"]);
        assert_eq!(
            x.values(),
            [
                FeatureValue::Number(2.0),
                FeatureValue::Number(1.0),
                FeatureValue::Text("x".into())
            ]
        );
    }

    #[test]
    fn align_fills_absent_and_drops_extra_columns() {
        let record = EngineeredRecord::new().with("a", 1.0).with("zzz", 9.0);
        let zero = align(&record, &schema(), FillPolicy::Zero);
        assert_eq!(zero.len(), 3);
        assert_eq!(zero.get("b"), Some(&FeatureValue::Number(0.0)));
        assert_eq!(zero.get("zzz"), None);

        let missing = align(&record, &schema(), FillPolicy::Missing);
        assert_eq!(missing.get("c"), Some(&FeatureValue::Missing));
    }

    #[test]
    fn rounding_and_percent() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(35.0 / 9.0), 3.8889);
        assert_eq!(round2(0.456), 0.46);
        assert_eq!(percent(0.7342), "73.4%");
        assert_eq!(percent(0.05), "5.0%");
    }

    #[test]
    fn rounding_follows_the_stored_binary_value() {
        // both literals sit just below their decimal tie
        assert_eq!(round2(0.355), 0.35);
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(0.5), 0.5);
        assert_eq!(round4(1.0), 1.0);
    }
}
