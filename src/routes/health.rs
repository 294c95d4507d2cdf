use actix_web::{web, HttpResponse, Responder};

use crate::error::{AppError, Result};
use crate::models::{HealthResponse, Session};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/session", web::get().to(current_session));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.engine.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Preference store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/session
///
/// Echoes the session the access guard resolved for this request.
async fn current_session(session: Option<web::ReqData<Session>>) -> Result<HttpResponse> {
    let session = session.ok_or(AppError::Authorization)?;
    Ok(HttpResponse::Ok().json(session.into_inner()))
}
