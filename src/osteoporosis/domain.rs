//! Osteoporosis questionnaire record and its engineered features.
//!
//! Apart from `Age`, every field is categorical and passed to the pipeline as
//! text. A `null` category reaches the pipeline as a missing value, which
//! its one-hot encoders match against a learned `null` category.

use serde_json::Value;

use crate::common::error::ValidationError;
use crate::common::json;
use crate::inference::domain::EngineeredRecord;

pub const REQUIRED_FIELDS: [&str; 14] = [
    "Age",
    "Gender",
    "Hormonal Changes",
    "Family History",
    "Race/Ethnicity",
    "Body Weight",
    "Calcium Intake",
    "Vitamin D Intake",
    "Physical Activity",
    "Smoking",
    "Alcohol Consumption",
    "Medical Conditions",
    "Medications",
    "Prior Fractures",
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OsteoporosisInput {
    /// Whole years; fractional ages are truncated.
    pub age: i64,
    pub gender: Option<String>,
    pub hormonal_changes: Option<String>,
    pub family_history: Option<String>,
    pub race_ethnicity: Option<String>,
    pub body_weight: Option<String>,
    pub calcium_intake: Option<String>,
    pub vitamin_d_intake: Option<String>,
    pub physical_activity: Option<String>,
    pub smoking: Option<String>,
    pub alcohol_consumption: Option<String>,
    pub medical_conditions: Option<String>,
    pub medications: Option<String>,
    pub prior_fractures: Option<String>,
}

impl OsteoporosisInput {
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let obj = json::as_object(payload)?;
        json::require_fields(obj, &REQUIRED_FIELDS)?;
        let text = |field: &str| json::text_field(obj, field);

        Ok(Self {
            age: json::number_field(obj, "Age")?.trunc() as i64,
            gender: text("Gender")?,
            hormonal_changes: text("Hormonal Changes")?,
            family_history: text("Family History")?,
            race_ethnicity: text("Race/Ethnicity")?,
            body_weight: text("Body Weight")?,
            calcium_intake: text("Calcium Intake")?,
            vitamin_d_intake: text("Vitamin D Intake")?,
            physical_activity: text("Physical Activity")?,
            smoking: text("Smoking")?,
            alcohol_consumption: text("Alcohol Consumption")?,
            medical_conditions: text("Medical Conditions")?,
            medications: text("Medications")?,
            prior_fractures: text("Prior Fractures")?,
        })
    }

    fn is_postmenopausal(&self) -> bool {
        is(&self.hormonal_changes, "Postmenopausal")
    }

    /// Number of the ten known risk factors present.
    fn risk_factor_count(&self) -> u8 {
        let checks = [
            self.is_postmenopausal(),
            is(&self.family_history, "Yes"),
            is(&self.body_weight, "Underweight"),
            is(&self.calcium_intake, "Low"),
            is(&self.vitamin_d_intake, "Insufficient"),
            is(&self.physical_activity, "Sedentary"),
            is(&self.smoking, "Yes"),
            is(&self.prior_fractures, "Yes"),
            is(&self.medical_conditions, "Rheumatoid Arthritis")
                || is(&self.medical_conditions, "Hyperthyroidism"),
            is(&self.medications, "Corticosteroids"),
        ];
        checks.iter().filter(|hit| **hit).count() as u8
    }
}

fn is(value: &Option<String>, expected: &str) -> bool {
    value.as_deref() == Some(expected)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AgeRiskGroup {
    Low,
    Moderate,
    High,
}

impl AgeRiskGroup {
    pub fn for_age(age: i64) -> Self {
        if age < 50 {
            AgeRiskGroup::Low
        } else if age < 65 {
            AgeRiskGroup::Moderate
        } else {
            AgeRiskGroup::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRiskGroup::Low => "Low",
            AgeRiskGroup::Moderate => "Moderate",
            AgeRiskGroup::High => "High",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OsteoporosisFeatures {
    pub input: OsteoporosisInput,
    pub age_risk_group: AgeRiskGroup,
    pub is_postmenopausal_female: bool,
    pub age_postmenopausal_interaction: i64,
    pub risk_factor_count: u8,
}

pub fn engineer(input: &OsteoporosisInput) -> OsteoporosisFeatures {
    let postmenopausal = input.is_postmenopausal();
    let female = is(&input.gender, "Female");

    OsteoporosisFeatures {
        input: input.clone(),
        age_risk_group: AgeRiskGroup::for_age(input.age),
        is_postmenopausal_female: female && postmenopausal,
        age_postmenopausal_interaction: if postmenopausal { input.age } else { 0 },
        risk_factor_count: input.risk_factor_count(),
    }
}

impl OsteoporosisFeatures {
    pub fn into_record(self) -> EngineeredRecord {
        let input = self.input;
        let mut record = EngineeredRecord::new();
        record.insert("Age", input.age as f64);
        record.insert("Gender", input.gender);
        record.insert("Hormonal Changes", input.hormonal_changes);
        record.insert("Family History", input.family_history);
        record.insert("Race/Ethnicity", input.race_ethnicity);
        record.insert("Body Weight", input.body_weight);
        record.insert("Calcium Intake", input.calcium_intake);
        record.insert("Vitamin D Intake", input.vitamin_d_intake);
        record.insert("Physical Activity", input.physical_activity);
        record.insert("Smoking", input.smoking);
        record.insert("Alcohol Consumption", input.alcohol_consumption);
        record.insert("Medical Conditions", input.medical_conditions);
        record.insert("Medications", input.medications);
        record.insert("Prior Fractures", input.prior_fractures);

        record.insert("Age_Risk_Group", self.age_risk_group.as_str());
        record.insert(
            "Is_Postmenopausal_Female",
            if self.is_postmenopausal_female { 1.0 } else { 0.0 },
        );
        record.insert(
            "Age_Postmenopausal_Interaction",
            self.age_postmenopausal_interaction as f64,
        );
        record.insert("Risk_Factor_Count", f64::from(self.risk_factor_count));
        record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::inference::domain::FeatureValue;

    fn payload() -> Value {
        json!({
            "Age": 70,
            "Gender": "Female",
            "Hormonal Changes": "Postmenopausal",
            "Family History": "Yes",
            "Race/Ethnicity": "Asian",
            "Body Weight": "Underweight",
            "Calcium Intake": "Low",
            "Vitamin D Intake": "Sufficient",
            "Physical Activity": "Active",
            "Smoking": "No",
            "Alcohol Consumption": "Moderate",
            "Medical Conditions": "Hyperthyroidism",
            "Medications": "None",
            "Prior Fractures": "No"
        })
    }

    #[test]
    fn elderly_postmenopausal_female() {
        let features = engineer(&OsteoporosisInput::from_json(&payload()).unwrap());
        assert_eq!(features.age_risk_group, AgeRiskGroup::High);
        assert!(features.is_postmenopausal_female);
        assert_eq!(features.age_postmenopausal_interaction, 70);
        // postmenopausal, family history, underweight, low calcium, hyperthyroidism
        assert_eq!(features.risk_factor_count, 5);
    }

    #[test]
    fn age_is_truncated() {
        let mut raw = payload();
        raw["Age"] = json!("64.9");
        let input = OsteoporosisInput::from_json(&raw).unwrap();
        assert_eq!(input.age, 64);
        assert_eq!(AgeRiskGroup::for_age(input.age), AgeRiskGroup::Moderate);
        assert_eq!(AgeRiskGroup::for_age(49), AgeRiskGroup::Low);
        assert_eq!(AgeRiskGroup::for_age(65), AgeRiskGroup::High);
    }

    #[test]
    fn male_postmenopausal_is_not_female_flag() {
        let mut raw = payload();
        raw["Gender"] = json!("Male");
        let features = engineer(&OsteoporosisInput::from_json(&raw).unwrap());
        assert!(!features.is_postmenopausal_female);
        assert_eq!(features.age_postmenopausal_interaction, 70);
    }

    #[test]
    fn null_category_is_kept_missing() {
        let mut raw = payload();
        raw["Medications"] = Value::Null;
        let record = engineer(&OsteoporosisInput::from_json(&raw).unwrap()).into_record();
        assert_eq!(record.get("Medications"), Some(&FeatureValue::Missing));
        assert_eq!(record.len(), 18);
    }

    #[test]
    fn non_text_category_is_rejected() {
        let mut raw = payload();
        raw["Smoking"] = json!(1);
        let err = OsteoporosisInput::from_json(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::NotText { ref field, .. } if field == "Smoking"));
    }

    #[test]
    fn missing_field_is_named() {
        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("Vitamin D Intake");
        let err = OsteoporosisInput::from_json(&raw).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: ['Vitamin D Intake']");
    }
}
