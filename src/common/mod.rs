//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod json;
pub mod log;

pub use config::AppCfg;
pub use error::{ArtifactError, RiskCode, RiskError, RiskResult, ValidationError};
