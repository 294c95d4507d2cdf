use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};

use crate::core::{AccessDecision, Credential};
use crate::error::AppError;
use crate::routes::AppState;

/// Reads the caller's credential from the `Authorization` header or the
/// session cookie.
pub fn extract_credential(req: &HttpRequest, cookie_name: &str) -> Option<Credential> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let cookie = req.cookie(cookie_name);

    Credential::from_parts(authorization, cookie.as_ref().map(|c| c.value()))
}

/// Gates every request through the access guard.
///
/// Forwarded requests carry the resolved `Session` in their extensions.
/// Denied page requests are redirected to the login path; denied API
/// requests get a 401 JSON body.
pub async fn require_session<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error>
where
    B: MessageBody + 'static,
{
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        tracing::error!("Access guard installed without application state");
        let response = AppError::Dependency("missing application state".into()).error_response();
        return Ok(req.into_response(response).map_into_right_body());
    };

    // Classify the requoted path the router dispatches on, not the raw URI
    let path = req.match_info().as_str().to_string();
    let credential = extract_credential(req.request(), &state.cookie_name);
    let decision = state.guard.check(&path, credential.as_ref()).await;

    match decision {
        AccessDecision::Forward(session) => {
            if let Some(session) = session {
                tracing::trace!("Authenticated {} for {}", session.subject, path);
                req.extensions_mut().insert(session);
            }
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        AccessDecision::Redirect(location) => {
            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish();
            Ok(req.into_response(response).map_into_right_body())
        }
        AccessDecision::Reject => {
            let response = AppError::Authorization.error_response();
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{cookie::Cookie, test::TestRequest};

    #[test]
    fn test_extract_from_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new("sb-access-token", "tok"))
            .to_http_request();
        assert_eq!(
            extract_credential(&req, "sb-access-token"),
            Some(Credential::Cookie("tok".to_string()))
        );
        assert_eq!(extract_credential(&req, "other-cookie"), None);
    }

    #[test]
    fn test_extract_prefers_bearer() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer header-token"))
            .cookie(Cookie::new("sb-access-token", "cookie-token"))
            .to_http_request();
        assert_eq!(
            extract_credential(&req, "sb-access-token"),
            Some(Credential::Bearer("header-token".to_string()))
        );
    }
}
