// Route exports
pub mod health;
pub mod swipe;

use actix_web::web;
use std::sync::Arc;

use crate::config::CandidateSettings;
use crate::core::{AccessGuard, MatchEngine};
use crate::services::CandidateSupplier;

/// Application state shared across all handlers and the access guard
#[derive(Clone)]
pub struct AppState {
    pub guard: AccessGuard,
    pub engine: MatchEngine,
    pub candidates: Arc<dyn CandidateSupplier>,
    pub cookie_name: Arc<str>,
    pub candidate_limits: CandidateSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::configure)
            .configure(swipe::configure),
    );
}
