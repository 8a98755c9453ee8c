//! Thyroid disorder classification from a laboratory panel.

pub mod domain;
pub mod service;

pub use domain::ThyroidInput;
pub use service::{ThyroidPrediction, ThyroidPredictor};
