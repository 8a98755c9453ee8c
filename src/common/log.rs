//! Tracing setup emitting JSON lines (or human readable output) and a
//! per-request outcome event with a fixed field schema.

use tracing_subscriber::EnvFilter;

use super::config::{AppCfg, LogFormat, ENV_LOG};
use super::error::RiskCode;
use crate::inference::domain::Domain;

/// Initialise the global subscriber.
///
/// `CLINRISK_LOG` directives win over the configured level. Returns `false`
/// when a subscriber was already installed (tests, embedding hosts).
pub fn init_tracing(cfg: &AppCfg) -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match cfg.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .is_ok(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok(),
    }
}

/// Emit the outcome of one prediction call.
pub fn log_outcome(domain: Domain, event: &str, code: RiskCode, dur_ms: u64) {
    let code = code as u32;
    if code == RiskCode::Ok as u32 {
        tracing::info!(domain = domain.slug(), ev = event, code, dur_ms, "prediction finished");
    } else {
        tracing::warn!(domain = domain.slug(), ev = event, code, dur_ms, "prediction failed");
    }
}
