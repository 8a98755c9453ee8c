//! Error handling primitives shared across the core.
//!
//! Failures fall into three tagged families: artifacts that could not be
//! loaded at startup, request payloads that failed validation, and classifier
//! calls that failed during scoring.

use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes reported to the surrounding service layer.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RiskCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// A required model artifact was absent on disk.
    ArtifactMissing = 1,
    /// An artifact existed but could not be parsed or validated.
    ArtifactLoad = 2,
    /// Input failed validation.
    InvalidInput = 3,
    /// The classifier failed while scoring a request.
    Scoring = 4,
    /// Catch-all for bugs.
    Internal = 5,
}

/// Startup failures raised while loading a domain's artifacts.
#[derive(Clone, Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to load artifact {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
}

/// Request-scoped input problems. Messages are safe to return to callers.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("No input data provided")]
    EmptyPayload,
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Missing required fields: {}", format_fields(.0))]
    MissingFields(Vec<String>),
    #[error("Feature '{field}' must be numeric. Got: {got}")]
    NotNumeric { field: String, got: String },
    #[error("Feature '{field}' must be a string. Got: {got}")]
    NotText { field: String, got: String },
    #[error("Feature '{field}' {reason}")]
    OutOfDomain { field: String, reason: String },
    #[error("Image could not be decoded: {0}")]
    UndecodableImage(String),
}

/// Canonical error type for the core.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("prediction failed: {reason}")]
    Scoring { reason: String },
}

/// Result alias used throughout the crate.
pub type RiskResult<T> = Result<T, RiskError>;

impl RiskError {
    /// Scoring helper.
    pub fn scoring(reason: impl Into<String>) -> Self {
        Self::Scoring {
            reason: reason.into(),
        }
    }

    /// Artifact-missing helper.
    pub fn artifact_missing(path: impl Into<PathBuf>) -> Self {
        ArtifactError::NotFound { path: path.into() }.into()
    }

    /// Artifact load helper.
    pub fn artifact_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArtifactError::Load {
            path: path.into(),
            reason: reason.into(),
        }
        .into()
    }

    /// Machine parsable code for this failure.
    pub fn code(&self) -> RiskCode {
        match self {
            Self::Artifact(ArtifactError::NotFound { .. }) => RiskCode::ArtifactMissing,
            Self::Artifact(ArtifactError::Load { .. }) => RiskCode::ArtifactLoad,
            Self::Validation(_) => RiskCode::InvalidInput,
            Self::Scoring { .. } => RiskCode::Scoring,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn format_fields(fields: &[String]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("'{f}'")).collect();
    format!("[{}]", quoted.join(", "))
}
