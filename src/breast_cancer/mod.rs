//! Breast ultrasound classification behind an image-plausibility guard.

pub mod domain;
pub mod guard;
pub mod service;

pub use domain::UltrasoundClass;
pub use guard::{ImageStats, Rejection};
pub use service::{BreastCancerPrediction, BreastCancerPredictor};
