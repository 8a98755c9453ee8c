//! Helpers to inspect decoded request payloads.
//!
//! Payloads arrive as loosely typed JSON. These helpers check presence of
//! required keys and coerce scalars the same way for every domain: numbers,
//! booleans (as 0/1) and numeric strings are accepted where a real number is
//! expected.

use serde_json::{Map, Value};

use crate::common::error::ValidationError;
use crate::inference::domain::FeatureValue;

/// Borrow the payload as an object, rejecting empty bodies.
pub fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    match payload {
        Value::Null => Err(ValidationError::EmptyPayload),
        Value::Object(map) if map.is_empty() => Err(ValidationError::EmptyPayload),
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::NotAnObject),
    }
}

/// Names from `required` absent in `obj`, in declaration order.
pub fn missing_fields(obj: &Map<String, Value>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !obj.contains_key(**key))
        .map(|key| key.to_string())
        .collect()
}

/// Fail with every missing key at once.
pub fn require_fields(obj: &Map<String, Value>, required: &[&str]) -> Result<(), ValidationError> {
    let missing = missing_fields(obj, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// Coerce a JSON scalar to a finite real number.
pub fn coerce_number(field: &str, value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(ValidationError::NotNumeric {
            field: field.to_string(),
            got: describe(value),
        }),
    }
}

/// Look up and coerce a numeric field.
pub fn number_field(obj: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    let value = obj
        .get(field)
        .ok_or_else(|| ValidationError::MissingFields(vec![field.to_string()]))?;
    coerce_number(field, value)
}

/// Look up a categorical field. `null` is kept as an absent category.
pub fn text_field(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None => Err(ValidationError::MissingFields(vec![field.to_string()])),
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::NotText {
            field: field.to_string(),
            got: describe(other),
        }),
    }
}

/// Convert any scalar into a feature value without interpreting it.
pub fn to_feature_value(field: &str, value: &Value) -> Result<FeatureValue, ValidationError> {
    match value {
        Value::Null => Ok(FeatureValue::Missing),
        Value::Bool(b) => Ok(FeatureValue::Number(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n
            .as_f64()
            .map(FeatureValue::Number)
            .ok_or_else(|| ValidationError::NotNumeric {
                field: field.to_string(),
                got: describe(value),
            }),
        Value::String(s) => Ok(FeatureValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(ValidationError::OutOfDomain {
            field: field.to_string(),
            reason: "must be a scalar value".to_string(),
        }),
    }
}

fn describe(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{value} ({kind})")
}
