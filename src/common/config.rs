//! Runtime configuration loaded from defaults, an optional TOML file and the
//! environment, in increasing order of precedence.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::inference::domain::Domain;

pub const ENV_CONFIG: &str = "CLINRISK_CONFIG";
pub const ENV_MODELS_ROOT: &str = "CLINRISK_MODELS_ROOT";
pub const ENV_LOG: &str = "CLINRISK_LOG";
pub const ENV_LOG_FORMAT: &str = "CLINRISK_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown log format '{0}' (expected 'json' or 'pretty')")]
    LogFormat(String),
}

/// Output format of the tracing subscriber.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::LogFormat(raw.to_string())),
        }
    }
}

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub models_root: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    model_dirs: BTreeMap<String, PathBuf>,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            models_root: PathBuf::from("./models"),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            model_dirs: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileCfg {
    models_root: Option<PathBuf>,
    log_level: Option<String>,
    log_format: Option<LogFormat>,
    domains: BTreeMap<String, DomainFileCfg>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DomainFileCfg {
    model_dir: Option<PathBuf>,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`AppCfg::load`] with an injectable variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(path) = lookup(ENV_CONFIG) {
            cfg.apply_file(Path::new(&path))?;
        }
        if let Some(root) = lookup(ENV_MODELS_ROOT) {
            cfg.models_root = PathBuf::from(root);
        }
        if let Some(level) = lookup(ENV_LOG) {
            cfg.log_level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            cfg.log_format = LogFormat::parse(&format)?;
        }

        Ok(cfg)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileCfg = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(root) = file.models_root {
            self.models_root = root;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
        for (slug, domain) in file.domains {
            if let Some(dir) = domain.model_dir {
                self.model_dirs.insert(slug, dir);
            }
        }
        Ok(())
    }

    /// Directory holding the artifacts of one domain.
    pub fn model_dir(&self, domain: Domain) -> PathBuf {
        self.model_dirs
            .get(domain.slug())
            .cloned()
            .unwrap_or_else(|| self.models_root.join(domain.slug()))
    }

    /// Override the artifact directory of a single domain.
    pub fn with_model_dir(mut self, domain: Domain, dir: impl Into<PathBuf>) -> Self {
        self.model_dirs.insert(domain.slug().to_string(), dir.into());
        self
    }
}
