//! Thyroid panel record. No derived columns: keys go to the model verbatim,
//! including ones with spaces such as `on thyroxine`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::common::error::ValidationError;
use crate::common::json;
use crate::inference::domain::{EngineeredRecord, FeatureValue};

pub const REQUIRED_FIELDS: [&str; 8] =
    ["age", "sex", "on thyroxine", "TSH", "T3", "TT4", "T4U", "FTI"];

/// Required fields that must coerce to a real number.
const NUMERIC_FIELDS: [&str; 6] = ["age", "TSH", "T3", "TT4", "T4U", "FTI"];

#[derive(Clone, Debug, PartialEq)]
pub struct ThyroidInput {
    fields: BTreeMap<String, FeatureValue>,
}

impl ThyroidInput {
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let obj = json::as_object(payload)?;
        json::require_fields(obj, &REQUIRED_FIELDS)?;

        let mut fields = BTreeMap::new();
        for (key, value) in obj {
            let cell = if NUMERIC_FIELDS.contains(&key.as_str()) {
                FeatureValue::Number(json::coerce_number(key, value)?)
            } else {
                json::to_feature_value(key, value)?
            };
            fields.insert(key.clone(), cell);
        }
        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.fields.get(key)
    }

    pub fn into_record(self) -> EngineeredRecord {
        let mut record = EngineeredRecord::new();
        for (key, value) in self.fields {
            record.insert(&key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> Value {
        json!({
            "age": "41", "sex": "F", "on thyroxine": 0,
            "TSH": 1.3, "T3": 2.5, "TT4": 125, "T4U": 1.14, "FTI": 109,
            "was_imputed_T3": 1, "referral source": "SVHC", "TBG": null
        })
    }

    #[test]
    fn keys_pass_through_verbatim() {
        let record = ThyroidInput::from_json(&payload()).unwrap().into_record();
        assert_eq!(record.len(), 11);
        assert_eq!(record.get("on thyroxine"), Some(&FeatureValue::Number(0.0)));
        assert_eq!(record.get("sex"), Some(&FeatureValue::Text("F".into())));
        assert_eq!(record.get("referral source"), Some(&FeatureValue::Text("SVHC".into())));
        assert_eq!(record.get("TBG"), Some(&FeatureValue::Missing));
    }

    #[test]
    fn lab_values_are_coerced() {
        let input = ThyroidInput::from_json(&payload()).unwrap();
        assert_eq!(input.get("age"), Some(&FeatureValue::Number(41.0)));
    }

    #[test]
    fn non_numeric_lab_value_is_rejected() {
        let mut raw = payload();
        raw["TSH"] = json!("high");
        let err = ThyroidInput::from_json(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { ref field, .. } if field == "TSH"));
    }

    #[test]
    fn missing_required_fields_are_named() {
        let err = ThyroidInput::from_json(&json!({"age": 41, "sex": "M"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: ['on thyroxine', 'TSH', 'T3', 'TT4', 'T4U', 'FTI']"
        );
    }
}
