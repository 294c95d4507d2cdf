use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{
    CandidatesQuery, CandidatesResponse, MatchesResponse, Session, SwipeRequest, SwipeResponse,
};
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/swipe", web::post().to(submit_swipe))
        .route("/swipe/candidates", web::get().to(list_candidates))
        .route("/matches", web::get().to(list_matches));
}

/// Record a swipe
///
/// POST /api/swipe
///
/// Request body:
/// ```json
/// { "target": "string", "action": "like|pass|super_like" }
/// ```
///
/// The actor is always the authenticated caller.
async fn submit_swipe(
    state: web::Data<AppState>,
    session: Option<web::ReqData<Session>>,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse> {
    let session = session.ok_or(AppError::Authorization)?;

    req.validate()
        .map_err(|errors| AppError::Validation(errors.to_string()))?;

    let result = state
        .engine
        .submit_preference(
            &session.subject,
            req.target.as_deref().unwrap_or_default(),
            req.action.as_deref().unwrap_or_default(),
        )
        .await?;

    // The swiped profile must leave the caller's deck
    state.candidates.invalidate(&session.subject).await;

    Ok(HttpResponse::Ok().json(SwipeResponse {
        success: true,
        swipe: result.swipe,
        is_match: result.is_match,
        outcome: result.outcome,
    }))
}

/// Swipe deck for the caller
///
/// GET /api/swipe/candidates?limit={limit}
async fn list_candidates(
    state: web::Data<AppState>,
    session: Option<web::ReqData<Session>>,
    query: web::Query<CandidatesQuery>,
) -> Result<HttpResponse> {
    let session = session.ok_or(AppError::Authorization)?;

    query
        .validate()
        .map_err(|errors| AppError::Validation(errors.to_string()))?;

    let limits = &state.candidate_limits;
    let limit = query.limit.unwrap_or(limits.default_limit).min(limits.max_limit) as usize;

    let candidates = state.candidates.candidates(&session.subject, limit).await?;

    Ok(HttpResponse::Ok().json(CandidatesResponse {
        count: candidates.len(),
        candidates,
    }))
}

/// Matches for the caller, newest first
///
/// GET /api/matches
async fn list_matches(
    state: web::Data<AppState>,
    session: Option<web::ReqData<Session>>,
) -> Result<HttpResponse> {
    let session = session.ok_or(AppError::Authorization)?;

    let matches = state.engine.matches_for(&session.subject).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        count: matches.len(),
        matches,
    }))
}
