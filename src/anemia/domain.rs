//! Anemia blood-index record and its engineered features.

use serde_json::Value;

use crate::common::error::ValidationError;
use crate::common::json;
use crate::inference::domain::EngineeredRecord;

pub const REQUIRED_FIELDS: [&str; 5] = ["Gender", "Hemoglobin", "MCH", "MCHC", "MCV"];

/// WHO hemoglobin cut-offs in g/dL.
const HB_CUTOFF_MALE: f64 = 13.0;
const HB_CUTOFF_FEMALE: f64 = 12.0;

/// Encoded as 0 (female) and 1 (male) in the training data.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn code(self) -> f64 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
        }
    }

    fn from_code(code: f64) -> Option<Self> {
        if code == 0.0 {
            Some(Gender::Female)
        } else if code == 1.0 {
            Some(Gender::Male)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnemiaInput {
    pub gender: Gender,
    pub hemoglobin: f64,
    pub mch: f64,
    pub mchc: f64,
    pub mcv: f64,
}

impl AnemiaInput {
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let obj = json::as_object(payload)?;
        json::require_fields(obj, &REQUIRED_FIELDS)?;

        let code = json::number_field(obj, "Gender")?;
        let gender = Gender::from_code(code).ok_or_else(|| ValidationError::OutOfDomain {
            field: "Gender".to_string(),
            reason: format!("must be 0 (female) or 1 (male). Got: {code}"),
        })?;

        Ok(Self {
            gender,
            hemoglobin: json::number_field(obj, "Hemoglobin")?,
            mch: json::number_field(obj, "MCH")?,
            mchc: json::number_field(obj, "MCHC")?,
            mcv: json::number_field(obj, "MCV")?,
        })
    }
}

/// Raw indices plus the two derived columns.
#[derive(Clone, Debug, PartialEq)]
pub struct AnemiaFeatures {
    pub input: AnemiaInput,
    pub hb_below_threshold: bool,
    pub mch_mchc_ratio: f64,
}

pub fn engineer(input: &AnemiaInput) -> AnemiaFeatures {
    let cutoff = match input.gender {
        Gender::Male => HB_CUTOFF_MALE,
        Gender::Female => HB_CUTOFF_FEMALE,
    };
    let mch_mchc_ratio = if input.mchc == 0.0 {
        0.0
    } else {
        input.mch / input.mchc
    };

    AnemiaFeatures {
        input: input.clone(),
        hb_below_threshold: input.hemoglobin < cutoff,
        mch_mchc_ratio,
    }
}

impl AnemiaFeatures {
    pub fn into_record(self) -> EngineeredRecord {
        let AnemiaFeatures {
            input,
            hb_below_threshold,
            mch_mchc_ratio,
        } = self;
        EngineeredRecord::new()
            .with("Gender", input.gender.code())
            .with("Hemoglobin", input.hemoglobin)
            .with("MCH", input.mch)
            .with("MCHC", input.mchc)
            .with("MCV", input.mcv)
            .with("hb_below_threshold", if hb_below_threshold { 1.0 } else { 0.0 })
            .with("mch_mchc_ratio", mch_mchc_ratio)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::inference::domain::FeatureValue;

    fn input(payload: Value) -> AnemiaInput {
        AnemiaInput::from_json(&payload).unwrap()
    }

    #[test]
    fn low_hemoglobin_male() {
        let features = engineer(&input(json!({
            "Gender": 1, "Hemoglobin": 10.0, "MCH": 30, "MCHC": 33, "MCV": 90
        })));
        assert!(features.hb_below_threshold);
        assert!((features.mch_mchc_ratio - 0.9091).abs() < 1e-4);
    }

    #[test]
    fn cutoff_depends_on_gender() {
        let female = engineer(&input(json!({
            "Gender": 0, "Hemoglobin": 12.5, "MCH": 30, "MCHC": 33, "MCV": 90
        })));
        let male = engineer(&input(json!({
            "Gender": 1, "Hemoglobin": 12.5, "MCH": 30, "MCHC": 33, "MCV": 90
        })));
        assert!(!female.hb_below_threshold);
        assert!(male.hb_below_threshold);
    }

    #[test]
    fn zero_mchc_gives_zero_ratio() {
        let features = engineer(&input(json!({
            "Gender": 0, "Hemoglobin": 11.0, "MCH": 28, "MCHC": 0, "MCV": 85
        })));
        assert_eq!(features.mch_mchc_ratio, 0.0);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let parsed = input(json!({
            "Gender": "1", "Hemoglobin": "14.2", "MCH": 30, "MCHC": 33, "MCV": 90
        }));
        assert_eq!(parsed.gender, Gender::Male);
        assert_eq!(parsed.hemoglobin, 14.2);
    }

    #[test]
    fn missing_fields_are_all_named() {
        let err = AnemiaInput::from_json(&json!({"Gender": 1, "Hemoglobin": 10.0})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields(vec!["MCH".into(), "MCHC".into(), "MCV".into()])
        );
    }

    #[test]
    fn gender_outside_codes_is_rejected() {
        let err = AnemiaInput::from_json(&json!({
            "Gender": 2, "Hemoglobin": 10.0, "MCH": 30, "MCHC": 33, "MCV": 90
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfDomain { ref field, .. } if field == "Gender"));
    }

    #[test]
    fn record_carries_raw_and_derived_columns() {
        let record = engineer(&input(json!({
            "Gender": 1, "Hemoglobin": 10.0, "MCH": 30, "MCHC": 33, "MCV": 90
        })))
        .into_record();
        assert_eq!(record.len(), 7);
        assert_eq!(record.get("hb_below_threshold"), Some(&FeatureValue::Number(1.0)));
        assert_eq!(record.get("Gender"), Some(&FeatureValue::Number(1.0)));
    }
}
