//! Anemia risk from routine blood indices.

pub mod domain;
pub mod service;

pub use domain::{engineer, AnemiaFeatures, AnemiaInput, Gender};
pub use service::{AnemiaPrediction, AnemiaPredictor};
