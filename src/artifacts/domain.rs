//! Artifact bundles, per-domain manifests and the repository seam.

use std::path::PathBuf;

use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::{Domain, FeatureSchema, Threshold};
use crate::model::{Classifier, Pipeline};

/// File name of the ultrasound classifier inside its domain directory.
pub const IMAGE_MODEL_FILE: &str = "resnet50_ultrasound_final.onnx";

/// Where a tabular domain takes its decision threshold from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ThresholdSource {
    /// Constant chosen at training time and shipped with the code.
    Fixed(f64),
    /// JSON number stored next to the pipeline.
    File(&'static str),
    /// Multi-class domain decided by arg-max.
    None,
}

/// Files a tabular domain needs and the checks they must pass.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TabularManifest {
    pub domain: Domain,
    pub pipeline: &'static str,
    pub schema: &'static str,
    pub threshold: ThresholdSource,
    /// Label the decision logic reads a probability for.
    pub required_class: i64,
}

pub const ANEMIA: TabularManifest = TabularManifest {
    domain: Domain::Anemia,
    pipeline: "anemia_pipeline.json",
    schema: "feature_names.json",
    threshold: ThresholdSource::Fixed(0.47),
    required_class: 1,
};

pub const OSTEOPOROSIS: TabularManifest = TabularManifest {
    domain: Domain::Osteoporosis,
    pipeline: "osteoporosis_pipeline.json",
    schema: "feature_names.json",
    threshold: ThresholdSource::File("optimal_threshold.json"),
    required_class: 1,
};

pub const PCOS: TabularManifest = TabularManifest {
    domain: Domain::Pcos,
    pipeline: "pcos_model_pipeline.json",
    schema: "feature_names.json",
    threshold: ThresholdSource::File("optimal_threshold.json"),
    required_class: 1,
};

pub const THYROID: TabularManifest = TabularManifest {
    domain: Domain::Thyroid,
    pipeline: "thyroid_pipeline.json",
    schema: "feature_names.json",
    threshold: ThresholdSource::None,
    required_class: 0,
};

/// Immutable artifacts of one tabular domain, shared by every request.
pub struct TabularArtifacts {
    pub classifier: Box<dyn Classifier>,
    pub schema: FeatureSchema,
    pub threshold: Option<Threshold>,
}

impl TabularArtifacts {
    /// Bundle loaded artifacts, checking them against the manifest.
    pub fn new(
        manifest: &TabularManifest,
        classifier: Box<dyn Classifier>,
        schema: FeatureSchema,
        threshold: Option<Threshold>,
    ) -> RiskResult<Self> {
        let invalid = |reason: String| RiskError::artifact_load(manifest.pipeline, reason);

        if schema.is_empty() {
            return Err(invalid("feature schema is empty".to_string()));
        }
        if !classifier.classes().contains(&manifest.required_class) {
            return Err(invalid(format!(
                "classifier classes {:?} do not include {}",
                classifier.classes(),
                manifest.required_class
            )));
        }
        let wants_threshold = !matches!(manifest.threshold, ThresholdSource::None);
        if wants_threshold != threshold.is_some() {
            return Err(invalid(format!(
                "threshold expected: {wants_threshold}, provided: {}",
                threshold.is_some()
            )));
        }

        Ok(Self {
            classifier,
            schema,
            threshold,
        })
    }

    /// Threshold of a binary domain. Always present once `new` accepted it.
    pub fn decision_threshold(&self) -> RiskResult<Threshold> {
        self.threshold
            .ok_or_else(|| RiskError::scoring("domain has no decision threshold"))
    }
}

/// Source of trained artifacts for one domain.
pub trait ArtifactRepo {
    /// Path of a named artifact, failing with `NotFound` when absent.
    fn locate(&self, name: &str) -> RiskResult<PathBuf>;
    fn read_pipeline(&self, name: &str) -> RiskResult<Pipeline>;
    fn read_schema(&self, name: &str) -> RiskResult<FeatureSchema>;
    fn read_threshold(&self, name: &str) -> RiskResult<Threshold>;
}
