//! Polycystic ovary syndrome detection from five clinical measurements.

pub mod domain;
pub mod service;

pub use domain::{engineer, PcosFeatures, PcosInput};
pub use service::{PcosPrediction, PcosPredictor};
