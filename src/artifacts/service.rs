//! Startup loading of a tabular domain's artifacts.

use crate::common::error::{RiskError, RiskResult};
use crate::inference::domain::Threshold;

use super::domain::{ArtifactRepo, TabularArtifacts, TabularManifest, ThresholdSource};

/// Load and cross-check the pipeline, schema and threshold of one domain.
///
/// The pipeline's input columns must equal the schema, so a vector aligned
/// to the schema is always accepted by the pipeline.
pub fn load_tabular(
    repo: &dyn ArtifactRepo,
    manifest: &TabularManifest,
) -> RiskResult<TabularArtifacts> {
    let pipeline = repo.read_pipeline(manifest.pipeline)?;
    let schema = repo.read_schema(manifest.schema)?;

    let columns = pipeline.input_columns();
    if columns != schema.columns() {
        return Err(RiskError::artifact_load(
            manifest.schema,
            format!(
                "pipeline columns {columns:?} differ from feature schema {:?}",
                schema.columns()
            ),
        ));
    }

    let threshold = match manifest.threshold {
        ThresholdSource::Fixed(value) => Some(Threshold::new(value).ok_or_else(|| {
            let reason = format!("threshold {value} is outside [0, 1]");
            RiskError::artifact_load(manifest.pipeline, reason)
        })?),
        ThresholdSource::File(name) => Some(repo.read_threshold(name)?),
        ThresholdSource::None => None,
    };

    tracing::info!(
        domain = manifest.domain.slug(),
        columns = schema.len(),
        threshold = threshold.map(|t| t.value()),
        "model artifacts loaded"
    );
    TabularArtifacts::new(manifest, Box::new(pipeline), schema, threshold)
}
