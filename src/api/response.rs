//! Status code and JSON body for one request, independent of any web
//! framework.

use serde::Serialize;
use serde_json::{json, Value};

use crate::common::error::{RiskError, RiskResult, ValidationError};

pub const MSG_NOT_LOADED: &str = "Model not loaded";
pub const MSG_INTERNAL: &str = "Internal server error";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(body) => Self { status: 200, body },
            Err(err) => {
                tracing::error!(error = %err, "result serialization failed");
                Self::error(500, MSG_INTERNAL)
            }
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn not_loaded() -> Self {
        Self::error(503, MSG_NOT_LOADED)
    }

    /// Map a failure to what the caller may see. Scoring detail stays in the
    /// logs.
    pub fn from_error(err: &RiskError) -> Self {
        match err {
            RiskError::Validation(inner) => Self::error(400, &inner.to_string()),
            RiskError::Artifact(_) => Self::not_loaded(),
            RiskError::Scoring { .. } => Self::error(500, MSG_INTERNAL),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn respond<T: Serialize>(result: RiskResult<T>) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::ok(&value),
        Err(err) => ApiResponse::from_error(&err),
    }
}

/// Reply for an upload routed to a JSON endpoint or the other way round.
pub fn wrong_payload(expected: &str) -> ApiResponse {
    let err: RiskError = ValidationError::OutOfDomain {
        field: "payload".to_string(),
        reason: format!("must be {expected}"),
    }
    .into();
    ApiResponse::from_error(&err)
}
