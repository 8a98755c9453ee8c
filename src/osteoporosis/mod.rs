//! Osteoporosis risk from lifestyle and medical-history factors.

pub mod domain;
pub mod service;

pub use domain::{engineer, AgeRiskGroup, OsteoporosisFeatures, OsteoporosisInput};
pub use service::{OsteoporosisPrediction, OsteoporosisPredictor};
