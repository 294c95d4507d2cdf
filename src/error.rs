use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::{MatchError, StoreError};
use crate::models::ErrorResponse;
use crate::services::{CandidateError, SupabaseError};

/// Errors surfaced to HTTP callers
///
/// Collaborator failures collapse into `Dependency`; their detail is logged
/// and never written to the response body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Authorization,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Dependency failure: {0}")]
    Dependency(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn body(&self) -> ErrorResponse {
        let (error, message) = match self {
            AppError::Authorization => ("unauthorized", "Authentication required".to_string()),
            AppError::Validation(msg) => ("invalid_input", msg.clone()),
            AppError::Dependency(_) => ("unavailable", "Service temporarily unavailable".to_string()),
        };

        ErrorResponse {
            error: error.to_string(),
            message,
            status_code: self.status_code().as_u16(),
        }
    }
}

impl error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authorization => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Dependency(detail) = self {
            tracing::error!("Dependency error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Validation(msg) => AppError::Validation(msg),
            MatchError::Store(StoreError::InvalidInput(msg)) => AppError::Validation(msg),
            MatchError::Store(e) => AppError::Dependency(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Dependency(err.to_string())
    }
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        AppError::Dependency(err.to_string())
    }
}

impl From<CandidateError> for AppError {
    fn from(err: CandidateError) -> Self {
        AppError::Dependency(err.to_string())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    AppError::Validation("Request body must be valid JSON".to_string()).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    AppError::Validation(format!("Invalid query: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Authorization.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Dependency("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_dependency_detail_is_hidden() {
        let body = AppError::Dependency("connection refused on 10.0.0.3:5432".into()).body();
        assert_eq!(body.message, "Service temporarily unavailable");
        assert_eq!(body.status_code, 500);
    }

    #[test]
    fn test_store_validation_maps_to_bad_request() {
        let err: AppError = MatchError::Store(StoreError::InvalidInput("self".into())).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
