//! PCOS record: five numeric measurements and five derived columns.

use serde_json::{Map, Value};

use crate::common::error::ValidationError;
use crate::common::json;
use crate::inference::domain::EngineeredRecord;

pub const AGE: &str = "Age";
pub const BMI: &str = "BMI";
pub const MENSTRUAL_IRREGULARITY: &str = "Menstrual_Irregularity";
pub const TESTOSTERONE: &str = "Testosterone_Level(ng/dL)";
pub const AFC: &str = "Antral_Follicle_Count";

/// Frontend key and the training-time column it maps to.
pub const FIELD_MAP: [(&str, &str); 5] = [
    ("age", AGE),
    ("bmi", BMI),
    ("menstrual_irregularity", MENSTRUAL_IRREGULARITY),
    ("testosterone_level", TESTOSTERONE),
    ("antral_follicle_count", AFC),
];

#[derive(Clone, Debug, PartialEq)]
pub struct PcosInput {
    pub age: f64,
    pub bmi: f64,
    pub menstrual_irregularity: f64,
    pub testosterone: f64,
    pub antral_follicle_count: f64,
}

impl PcosInput {
    /// Accepts frontend keys (`bmi`) or model column names (`BMI`); the
    /// frontend key wins when both are present.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let obj = json::as_object(payload)?;

        let missing: Vec<String> = FIELD_MAP
            .iter()
            .filter(|(frontend, column)| !obj.contains_key(*frontend) && !obj.contains_key(*column))
            .map(|(frontend, _)| frontend.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let field = |column: &str| lookup(obj, column);
        Ok(Self {
            age: field(AGE)?,
            bmi: field(BMI)?,
            menstrual_irregularity: field(MENSTRUAL_IRREGULARITY)?,
            testosterone: field(TESTOSTERONE)?,
            antral_follicle_count: field(AFC)?,
        })
    }

    /// Log values outside the range seen in training. They are still scored.
    pub fn warn_out_of_range(&self) {
        if !(10.0..=60.0).contains(&self.age) {
            tracing::warn!(age = self.age, "Age outside typical range (10-60)");
        }
        if !(10.0..=60.0).contains(&self.bmi) {
            tracing::warn!(bmi = self.bmi, "BMI outside typical range (10-60)");
        }
        if self.menstrual_irregularity != 0.0 && self.menstrual_irregularity != 1.0 {
            tracing::warn!(
                menstrual_irregularity = self.menstrual_irregularity,
                "Menstrual_Irregularity should be 0 or 1"
            );
        }
        if !(0.0..=200.0).contains(&self.testosterone) {
            tracing::warn!(
                testosterone = self.testosterone,
                "Testosterone outside typical range (0-200)"
            );
        }
        if !(0.0..=50.0).contains(&self.antral_follicle_count) {
            tracing::warn!(
                afc = self.antral_follicle_count,
                "AFC outside typical range (0-50)"
            );
        }
    }
}

fn lookup(obj: &Map<String, Value>, column: &str) -> Result<f64, ValidationError> {
    let frontend = FIELD_MAP
        .iter()
        .find(|(_, c)| *c == column)
        .map(|(f, _)| *f)
        .unwrap_or(column);
    match obj.get(frontend) {
        Some(value) => json::coerce_number(column, value),
        None => json::number_field(obj, column),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PcosFeatures {
    pub input: PcosInput,
    pub bmi_category: u8,
    pub testosterone_high: bool,
    pub afc_high: bool,
    pub age_bmi_interaction: f64,
    pub testosterone_afc_ratio: f64,
}

pub fn bmi_category(bmi: f64) -> u8 {
    if bmi < 18.5 {
        0
    } else if bmi < 25.0 {
        1
    } else if bmi < 30.0 {
        2
    } else {
        3
    }
}

pub fn engineer(input: &PcosInput) -> PcosFeatures {
    PcosFeatures {
        input: input.clone(),
        bmi_category: bmi_category(input.bmi),
        testosterone_high: input.testosterone > 50.0,
        afc_high: input.antral_follicle_count >= 12.0,
        age_bmi_interaction: input.age * input.bmi,
        testosterone_afc_ratio: input.testosterone / (input.antral_follicle_count + 1.0),
    }
}

impl PcosFeatures {
    pub fn into_record(self) -> EngineeredRecord {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        EngineeredRecord::new()
            .with(AGE, self.input.age)
            .with(BMI, self.input.bmi)
            .with(MENSTRUAL_IRREGULARITY, self.input.menstrual_irregularity)
            .with(TESTOSTERONE, self.input.testosterone)
            .with(AFC, self.input.antral_follicle_count)
            .with("BMI_Category", f64::from(self.bmi_category))
            .with("Testosterone_High", flag(self.testosterone_high))
            .with("AFC_High", flag(self.afc_high))
            .with("Age_BMI_Interaction", self.age_bmi_interaction)
            .with("Testosterone_AFC_Ratio", self.testosterone_afc_ratio)
    }
}
