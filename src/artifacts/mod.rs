//! Model artifacts: what each domain loads at startup and where from.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{
    ArtifactRepo, TabularArtifacts, TabularManifest, ThresholdSource, IMAGE_MODEL_FILE,
};
pub use repo_fs::FsArtifactRepo;
pub use service::load_tabular;
