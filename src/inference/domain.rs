//! Domain definitions shared by every predictor: feature records, the
//! training-time schema, decision thresholds and risk tiers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::RiskResult;

/// The five prediction services.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Anemia,
    Osteoporosis,
    Pcos,
    Thyroid,
    BreastCancer,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Anemia,
        Domain::Osteoporosis,
        Domain::Pcos,
        Domain::Thyroid,
        Domain::BreastCancer,
    ];

    /// Directory and route name of the domain.
    pub fn slug(&self) -> &'static str {
        match self {
            Domain::Anemia => "anemia",
            Domain::Osteoporosis => "osteoporosis",
            Domain::Pcos => "pcos",
            Domain::Thyroid => "thyroid",
            Domain::BreastCancer => "breast-cancer",
        }
    }

    /// Human readable service name reported by health checks.
    pub fn service_name(&self) -> &'static str {
        match self {
            Domain::Anemia => "Anemia Prediction API",
            Domain::Osteoporosis => "Osteoporosis Prediction API",
            Domain::Pcos => "PCOS Detection API",
            Domain::Thyroid => "Thyroid Prediction API",
            Domain::BreastCancer => "Breast Cancer Prediction API",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.slug() == slug)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A single cell of a feature record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    /// Absent value, the NaN of a dataframe cell.
    Missing,
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            FeatureValue::Missing => true,
            FeatureValue::Number(x) => x.is_nan(),
            FeatureValue::Text(_) => false,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<Option<String>> for FeatureValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FeatureValue::Missing, FeatureValue::Text)
    }
}

/// Raw fields plus derived columns, keyed by training-time column name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineeredRecord {
    values: HashMap<String, FeatureValue>,
}

impl EngineeredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<FeatureValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<FeatureValue>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered column list recorded when the model was trained.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Value written into schema columns the engineered record does not carry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FillPolicy {
    Zero,
    Missing,
}

impl FillPolicy {
    pub fn value(&self) -> FeatureValue {
        match self {
            FillPolicy::Zero => FeatureValue::Number(0.0),
            FillPolicy::Missing => FeatureValue::Missing,
        }
    }
}

/// Engineered record in exactly the schema's order. Built by the aligner only.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedFeatureVector {
    pub(crate) columns: Vec<String>,
    pub(crate) values: Vec<FeatureValue>,
}

impl AlignedFeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Calibrated decision cut-off on the positive-class probability.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    /// Accepts finite values in `[0, 1]`.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Non-strict: a probability equal to the threshold is positive.
    pub fn is_positive(&self, probability: f64) -> bool {
        probability >= self.0
    }
}

/// Ordinal risk bucket shown to the user.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Borderline,
    High,
    #[serde(rename = "Invalid Input")]
    InvalidInput,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Borderline => "Borderline",
            RiskTier::High => "High",
            RiskTier::InvalidInput => "Invalid Input",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded, immutable prediction service for one domain.
pub trait Predictor: Send + Sync {
    type Input: ?Sized;
    type Output: Serialize;

    fn domain(&self) -> Domain;

    /// Run the full pipeline on one request.
    fn predict(&self, input: &Self::Input) -> RiskResult<Self::Output>;

    /// Score payloads one after another, stopping at the first failure.
    fn predict_batch<'a, I>(&self, inputs: I) -> RiskResult<Vec<Self::Output>>
    where
        I: IntoIterator<Item = &'a Self::Input>,
        Self::Input: 'a,
    {
        inputs.into_iter().map(|input| self.predict(input)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_rejects_out_of_range_values() {
        assert!(Threshold::new(0.47).is_some());
        assert!(Threshold::new(0.0).is_some());
        assert!(Threshold::new(1.0).is_some());
        assert!(Threshold::new(1.2).is_none());
        assert!(Threshold::new(-0.1).is_none());
        assert!(Threshold::new(f64::NAN).is_none());
    }

    #[test]
    fn threshold_boundary_is_positive() {
        let t = Threshold::new(0.47).unwrap();
        assert!(t.is_positive(0.47));
        assert!(!t.is_positive(0.4699));
    }

    #[test]
    fn risk_tier_serializes_to_display_labels() {
        assert_eq!(
            serde_json::to_string(&RiskTier::InvalidInput).unwrap(),
            "\"Invalid Input\""
        );
        assert_eq!(serde_json::to_string(&RiskTier::Borderline).unwrap(), "\"Borderline\"");
    }

    #[test]
    fn domain_slugs_round_trip() {
        for domain in Domain::ALL {
            assert_eq!(Domain::from_slug(domain.slug()), Some(domain));
        }
        assert_eq!(Domain::from_slug("diabetes"), None);
    }

    #[test]
    fn nan_numbers_count_as_missing() {
        assert!(FeatureValue::Number(f64::NAN).is_missing());
        assert!(FeatureValue::Missing.is_missing());
        assert!(!FeatureValue::Number(0.0).is_missing());
    }
}
