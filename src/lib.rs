//! Inference core for the clinical risk prediction services.
//!
//! Four tabular domains (anemia, osteoporosis, PCOS, thyroid) share the
//! validate, engineer, align, score and tier path. The breast ultrasound
//! domain guards and classifies uploaded images.

pub mod common;
pub mod artifacts;
pub mod model;
pub mod inference;

pub mod anemia;
pub mod osteoporosis;
pub mod pcos;
pub mod thyroid;
pub mod breast_cancer;

pub mod api;

pub use api::{ApiResponse, Services, API_VERSION};
pub use common::config::AppCfg;
pub use common::error::{RiskError, RiskResult};
pub use inference::domain::{Domain, Predictor, RiskTier};
