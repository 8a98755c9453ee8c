//! Filesystem repository for trained model artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::config::AppCfg;
use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::{Domain, FeatureSchema, Threshold};
use crate::model::Pipeline;

use super::domain::ArtifactRepo;

/// Read artifacts from one domain directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsArtifactRepo {
    root: PathBuf,
}

impl FsArtifactRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Repository rooted at the configured directory of `domain`.
    pub fn for_domain(cfg: &AppCfg, domain: Domain) -> Self {
        Self::new(cfg.model_dir(domain))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_text(&self, name: &str) -> RiskResult<(PathBuf, String)> {
        let path = self.root.join(name);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok((path, raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(RiskError::artifact_missing(path))
            }
            Err(err) => Err(RiskError::artifact_load(path, err.to_string())),
        }
    }
}

impl ArtifactRepo for FsArtifactRepo {
    fn locate(&self, name: &str) -> RiskResult<PathBuf> {
        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(RiskError::artifact_missing(path))
        }
    }

    fn read_pipeline(&self, name: &str) -> RiskResult<Pipeline> {
        let (path, raw) = self.read_text(name)?;
        let pipeline = Pipeline::from_json(&raw).map_err(|e| RiskError::artifact_load(&path, e))?;
        tracing::info!(
            path = %path.display(),
            columns = pipeline.columns.len(),
            classes = ?pipeline.estimator.classes(),
            version = %pipeline.model_version,
            "pipeline loaded"
        );
        Ok(pipeline)
    }

    fn read_schema(&self, name: &str) -> RiskResult<FeatureSchema> {
        let (path, raw) = self.read_text(name)?;
        let schema: FeatureSchema =
            serde_json::from_str(&raw).map_err(|e| RiskError::artifact_load(&path, e.to_string()))?;
        if schema.is_empty() {
            return Err(RiskError::artifact_load(&path, "feature schema is empty"));
        }
        tracing::info!(path = %path.display(), columns = schema.len(), "feature schema loaded");
        Ok(schema)
    }

    fn read_threshold(&self, name: &str) -> RiskResult<Threshold> {
        let (path, raw) = self.read_text(name)?;
        let value: f64 =
            serde_json::from_str(&raw).map_err(|e| RiskError::artifact_load(&path, e.to_string()))?;
        let threshold = Threshold::new(value).ok_or_else(|| {
            RiskError::artifact_load(&path, format!("threshold {value} is outside [0, 1]"))
        })?;
        tracing::info!(path = %path.display(), threshold = value, "threshold loaded");
        Ok(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ArtifactError;

    fn repo_with(files: &[(&str, &str)]) -> (tempfile::TempDir, FsArtifactRepo) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let repo = FsArtifactRepo::new(dir.path());
        (dir, repo)
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, repo) = repo_with(&[]);
        let err = repo.read_schema("feature_names.json").unwrap_err();
        assert!(matches!(err, RiskError::Artifact(ArtifactError::NotFound { .. })));
        assert!(matches!(
            repo.locate("model.onnx").unwrap_err(),
            RiskError::Artifact(ArtifactError::NotFound { .. })
        ));
    }

    #[test]
    fn corrupt_schema_is_a_load_error() {
        let (_dir, repo) = repo_with(&[("feature_names.json", "{not json")]);
        let err = repo.read_schema("feature_names.json").unwrap_err();
        assert!(matches!(err, RiskError::Artifact(ArtifactError::Load { .. })));
    }

    #[test]
    fn reads_schema_in_order() {
        let (_dir, repo) =
            repo_with(&[("feature_names.json", r#"["MCV", "Gender", "on thyroxine"]"#)]);
        let schema = repo.read_schema("feature_names.json").unwrap();
        assert_eq!(schema.columns(), ["MCV", "Gender", "on thyroxine"]);
    }

    #[test]
    fn threshold_out_of_range_is_a_load_error() {
        let (_dir, repo) = repo_with(&[("optimal_threshold.json", "1.7")]);
        let err = repo.read_threshold("optimal_threshold.json").unwrap_err();
        assert!(err.to_string().contains("outside [0, 1]"));

        let (_dir, repo) = repo_with(&[("optimal_threshold.json", "0.3571")]);
        assert_eq!(repo.read_threshold("optimal_threshold.json").unwrap().value(), 0.3571);
    }

    #[test]
    fn for_domain_uses_configured_directory() {
        let cfg = AppCfg::default().with_model_dir(Domain::Thyroid, "/opt/thyroid");
        assert_eq!(
            FsArtifactRepo::for_domain(&cfg, Domain::Thyroid).root(),
            Path::new("/opt/thyroid")
        );
    }
}
