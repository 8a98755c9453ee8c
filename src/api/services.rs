//! Process-lifetime registry of the five predictors.
//!
//! Each domain loads once. A domain whose artifacts fail to load stays
//! registered as unavailable and answers every request with 503; the other
//! domains keep serving.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::anemia::AnemiaPredictor;
use crate::artifacts::{ArtifactRepo, FsArtifactRepo};
use crate::breast_cancer::BreastCancerPredictor;
use crate::common::config::AppCfg;
use crate::common::error::RiskResult;
use crate::inference::domain::{Domain, Predictor};
use crate::osteoporosis::OsteoporosisPredictor;
use crate::pcos::PcosPredictor;
use crate::thyroid::ThyroidPredictor;

use super::response::{respond, wrong_payload, ApiResponse};
use super::API_VERSION;

/// A loaded predictor, or the reason it could not be loaded.
pub enum Slot<P> {
    Ready(Arc<P>),
    Unavailable { reason: String },
}

impl<P> Slot<P> {
    pub fn ready(predictor: P) -> Self {
        Slot::Ready(Arc::new(predictor))
    }

    fn from_load(domain: Domain, loaded: RiskResult<P>) -> Self {
        match loaded {
            Ok(predictor) => {
                tracing::info!(domain = domain.slug(), "model ready");
                Slot::ready(predictor)
            }
            Err(err) => {
                tracing::error!(
                    domain = domain.slug(),
                    code = err.code() as u32,
                    error = %err,
                    "failed to load model"
                );
                Slot::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// A handle on the loaded predictor, shared with every other caller.
    pub fn get(&self) -> Option<Arc<P>> {
        match self {
            Slot::Ready(predictor) => Some(Arc::clone(predictor)),
            Slot::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Slot::Ready(_) => None,
            Slot::Unavailable { reason } => Some(reason),
        }
    }
}

pub struct Services {
    pub anemia: Slot<AnemiaPredictor>,
    pub osteoporosis: Slot<OsteoporosisPredictor>,
    pub pcos: Slot<PcosPredictor>,
    pub thyroid: Slot<ThyroidPredictor>,
    pub breast_cancer: Slot<BreastCancerPredictor>,
}

impl Services {
    /// Load every domain from its configured directory.
    pub fn load(cfg: &AppCfg) -> Self {
        Self::load_only(cfg, &Domain::ALL)
    }

    /// Load the listed domains; the rest stay unavailable.
    pub fn load_only(cfg: &AppCfg, domains: &[Domain]) -> Self {
        fn slot<P>(
            cfg: &AppCfg,
            domains: &[Domain],
            domain: Domain,
            load: fn(&dyn ArtifactRepo) -> RiskResult<P>,
        ) -> Slot<P> {
            if !domains.contains(&domain) {
                return Slot::Unavailable {
                    reason: "not requested".to_string(),
                };
            }
            Slot::from_load(domain, load(&FsArtifactRepo::for_domain(cfg, domain)))
        }

        Self {
            anemia: slot(cfg, domains, Domain::Anemia, AnemiaPredictor::load),
            osteoporosis: slot(cfg, domains, Domain::Osteoporosis, OsteoporosisPredictor::load),
            pcos: slot(cfg, domains, Domain::Pcos, PcosPredictor::load),
            thyroid: slot(cfg, domains, Domain::Thyroid, ThyroidPredictor::load),
            breast_cancer: slot(cfg, domains, Domain::BreastCancer, BreastCancerPredictor::load),
        }
    }

    pub fn is_loaded(&self, domain: Domain) -> bool {
        self.failure(domain).is_none()
    }

    /// Why a domain is not serving, if it is not.
    pub fn failure(&self, domain: Domain) -> Option<&str> {
        match domain {
            Domain::Anemia => self.anemia.failure(),
            Domain::Osteoporosis => self.osteoporosis.failure(),
            Domain::Pcos => self.pcos.failure(),
            Domain::Thyroid => self.thyroid.failure(),
            Domain::BreastCancer => self.breast_cancer.failure(),
        }
    }

    /// Score a JSON payload for one of the tabular domains.
    pub fn predict_json(&self, domain: Domain, payload: &Value) -> ApiResponse {
        match domain {
            Domain::Anemia => handle(&self.anemia, payload),
            Domain::Osteoporosis => handle(&self.osteoporosis, payload),
            Domain::Pcos => handle(&self.pcos, payload),
            Domain::Thyroid => handle(&self.thyroid, payload),
            Domain::BreastCancer => wrong_payload("an image upload"),
        }
    }

    /// Score an uploaded ultrasound image.
    pub fn predict_image(&self, bytes: &[u8]) -> ApiResponse {
        handle(&self.breast_cancer, bytes)
    }

    pub fn health(&self, domain: Domain) -> ApiResponse {
        let loaded = self.is_loaded(domain);
        ApiResponse::ok(&json!({
            "status": if loaded { "running" } else { "degraded" },
            "service": domain.service_name(),
            "model_loaded": loaded,
            "api_version": API_VERSION,
        }))
    }
}

fn handle<P>(slot: &Slot<P>, input: &P::Input) -> ApiResponse
where
    P: Predictor,
{
    match slot.get() {
        Some(predictor) => respond(predictor.predict(input)),
        None => ApiResponse::not_loaded(),
    }
}
