//! Inference domain: record types, schema alignment and the per-request
//! orchestration common to every predictor.

pub mod domain;
pub mod service;

pub use domain::{
    AlignedFeatureVector, Domain, EngineeredRecord, FeatureSchema, FeatureValue, FillPolicy,
    Predictor, RiskTier, Threshold,
};
