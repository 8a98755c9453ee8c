//! Tabular pipeline artifact: per-column encoders feeding an estimator, with
//! optional sigmoid calibration of the positive class.
//!
//! The artifact is a JSON document:
//!
//! ```json
//! {
//!   "model_version": "1.0.0",
//!   "columns": [
//!     {"name": "Age", "encoding": {"kind": "standard", "mean": 41.2, "scale": 12.9}},
//!     {"name": "Gender", "encoding": {"kind": "one_hot", "categories": ["Female", "Male"]}},
//!     {"name": "Medications", "encoding": {"kind": "one_hot", "categories": ["Corticosteroids", null]}}
//!   ],
//!   "estimator": {"kind": "logistic", "classes": [0, 1], "coef": [[0.8, -0.1, 0.1, 0.6, -0.2]], "intercept": [-0.3]},
//!   "calibration": {"a": -3.9, "b": 1.8}
//! }
//! ```

use std::collections::HashSet;

use serde::Deserialize;

use super::estimator::{Estimator, SigmoidCalibration};
use super::{Classifier, DEFAULT_MODEL_VERSION};
use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::{AlignedFeatureVector, FeatureValue};

#[derive(Clone, Debug, Deserialize)]
pub struct Pipeline {
    #[serde(default = "default_version")]
    pub model_version: String,
    pub columns: Vec<ColumnEncoder>,
    pub estimator: Estimator,
    #[serde(default)]
    pub calibration: Option<SigmoidCalibration>,
}

fn default_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

/// Encoder for one input column.
#[derive(Clone, Debug, Deserialize)]
pub struct ColumnEncoder {
    pub name: String,
    pub encoding: Encoding,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Encoding {
    /// Numeric value used as-is.
    Passthrough {
        #[serde(default)]
        impute: Option<f64>,
    },
    /// `(x - mean) / scale`.
    Standard {
        mean: f64,
        scale: f64,
        #[serde(default)]
        impute: Option<f64>,
    },
    /// One indicator per known category. A `null` category matches a
    /// missing value.
    OneHot {
        categories: Vec<Option<String>>,
        #[serde(default)]
        handle_unknown: UnknownCategory,
    },
}

/// What a one-hot encoder does with a category it was not fit on.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    #[default]
    Error,
    Ignore,
}

impl Encoding {
    fn width(&self) -> usize {
        match self {
            Encoding::Passthrough { .. } | Encoding::Standard { .. } => 1,
            Encoding::OneHot { categories, .. } => categories.len(),
        }
    }
}

impl Pipeline {
    /// Parse and validate a pipeline document.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let pipeline: Pipeline = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Names of the columns the pipeline consumes, in order.
    pub fn input_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn encoded_width(&self) -> usize {
        self.columns.iter().map(|c| c.encoding.width()).sum()
    }

    fn validate(&self) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("pipeline declares no input columns".to_string());
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(format!("column '{}' is declared twice", column.name));
            }
            match &column.encoding {
                Encoding::Standard { mean, scale, .. } => {
                    if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                        return Err(format!(
                            "column '{}' has an unusable scaler (mean {mean}, scale {scale})",
                            column.name
                        ));
                    }
                }
                Encoding::OneHot { categories, .. } if categories.is_empty() => {
                    return Err(format!("column '{}' has no categories", column.name));
                }
                _ => {}
            }
        }

        self.estimator.validate(self.encoded_width())?;

        if self.calibration.is_some() && self.estimator.classes().len() != 2 {
            return Err("sigmoid calibration requires a binary estimator".to_string());
        }
        Ok(())
    }

    fn encode(&self, x: &AlignedFeatureVector) -> RiskResult<Vec<f64>> {
        let matches = x.columns().len() == self.columns.len()
            && x.columns().iter().zip(&self.columns).all(|(a, b)| *a == b.name);
        if !matches {
            return Err(RiskError::scoring(format!(
                "feature vector columns {:?} do not match pipeline columns {:?}",
                x.columns(),
                self.input_columns()
            )));
        }

        let mut row = Vec::with_capacity(self.encoded_width());
        for (column, value) in self.columns.iter().zip(x.values()) {
            match &column.encoding {
                Encoding::Passthrough { impute } => {
                    row.push(numeric(&column.name, value, *impute)?);
                }
                Encoding::Standard {
                    mean,
                    scale,
                    impute,
                } => {
                    row.push((numeric(&column.name, value, *impute)? - mean) / scale);
                }
                Encoding::OneHot {
                    categories,
                    handle_unknown,
                } => {
                    let category = category_of(value);
                    let hit = categories.iter().position(|known| *known == category);
                    if hit.is_none() && *handle_unknown == UnknownCategory::Error {
                        return Err(RiskError::scoring(format!(
                            "Found unknown categories [{}] in column '{}' during transform",
                            category.unwrap_or_else(|| "nan".to_string()),
                            column.name
                        )));
                    }
                    row.extend(
                        (0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }),
                    );
                }
            }
        }
        Ok(row)
    }
}

fn numeric(column: &str, value: &FeatureValue, impute: Option<f64>) -> RiskResult<f64> {
    let parsed = match value {
        FeatureValue::Number(x) if !x.is_nan() => Some(*x),
        FeatureValue::Number(_) | FeatureValue::Missing => None,
        FeatureValue::Text(s) => Some(s.trim().parse::<f64>().map_err(|_| {
            RiskError::scoring(format!(
                "could not convert string to float: '{s}' in column '{column}'"
            ))
        })?),
    };
    match parsed.or(impute) {
        Some(x) if x.is_finite() => Ok(x),
        Some(x) => Err(RiskError::scoring(format!(
            "column '{column}' holds a non-finite value ({x})"
        ))),
        None => Err(RiskError::scoring(format!(
            "column '{column}' has no value and no imputation"
        ))),
    }
}

fn category_of(value: &FeatureValue) -> Option<String> {
    match value {
        FeatureValue::Text(s) => Some(s.clone()),
        FeatureValue::Number(x) if x.is_nan() => None,
        FeatureValue::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => {
            Some(format!("{}", *x as i64))
        }
        FeatureValue::Number(x) => Some(x.to_string()),
        FeatureValue::Missing => None,
    }
}

impl Classifier for Pipeline {
    fn classes(&self) -> &[i64] {
        self.estimator.classes()
    }

    fn predict_proba(&self, x: &AlignedFeatureVector) -> RiskResult<Vec<f64>> {
        let row = self.encode(x)?;
        let mut proba = self
            .estimator
            .predict_proba(&row)
            .map_err(RiskError::scoring)?;

        if let Some(calibration) = &self.calibration {
            let positive = calibration.apply(proba[1]);
            proba = vec![1.0 - positive, positive];
        }
        Ok(proba)
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}
