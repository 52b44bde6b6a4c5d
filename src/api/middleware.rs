//! API middleware
//!
//! Contains middleware for:
//! - Authentication (token cookie or bearer header)
//! - Authorization (admin gating for review endpoints)
//!
//! The resolved identity travels in request extensions; handlers pick it up
//! through the `CurrentIdentity` and `OptionalIdentity` extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    ArticleService, ContentService, CredentialService, Identity, IdentityError, IdentityProvider,
    InterestService, MessageService, PatentService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credential_service: Arc<CredentialService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub patent_service: Arc<PatentService>,
    pub interest_service: Arc<InterestService>,
    pub message_service: Arc<MessageService>,
    pub article_service: Arc<ArticleService>,
    pub content_service: Arc<ContentService>,
}

/// Identity resolved for the current request
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

/// Identity resolved for the current request, when one was presented
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new("UNAUTHENTICATED", message)
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::new("INVALID_CREDENTIAL", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn duplicate_identity(message: impl Into<String>) -> Self {
        Self::new("DUPLICATE_IDENTITY", message)
    }

    pub fn store_failure(message: impl Into<String>) -> Self {
        Self::new("STORE_FAILURE", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHENTICATED" | "INVALID_CREDENTIAL" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" | "DUPLICATE_IDENTITY" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the session token from the Authorization header or token cookie
fn extract_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("token=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&request);
    let identity = state
        .identity_provider
        .resolve(token.as_deref())
        .map_err(|e| match e {
            IdentityError::Unauthenticated => ApiError::unauthenticated("ログインが必要です"),
            IdentityError::InvalidCredential => ApiError::invalid_credential("無効なトークンです"),
        })?;

    request.extensions_mut().insert(CurrentIdentity(identity));
    Ok(next.run(request).await)
}

/// Optional authentication middleware
///
/// Resolves an identity when a valid token is present but lets the request
/// through either way. Used on public routes whose query parameters can
/// request an authenticated view.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(&request);
    if let Ok(identity) = state.identity_provider.resolve(token.as_deref()) {
        request.extensions_mut().insert(CurrentIdentity(identity));
    }
    next.run(request).await
}

/// Admin authorization middleware
///
/// Runs behind `require_auth`. The role check only applies when
/// `auth.enforce_admin_role` is set; without it any authenticated account
/// reaches the review endpoints.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<CurrentIdentity>()
        .ok_or_else(|| ApiError::unauthenticated("ログインが必要です"))?;

    if state.config.auth.enforce_admin_role && !identity.0.is_admin() {
        return Err(ApiError::forbidden("管理者権限が必要です"));
    }

    Ok(next.run(request).await)
}

// Extractor for the identity stored by require_auth
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("ログインが必要です"))
    }
}

// Extractor for routes where authentication is optional
impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(
            parts
                .extensions
                .get::<CurrentIdentity>()
                .map(|current| current.0.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn request_with_bearer(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn request_with_cookie(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, format!("token={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let request = request_with_bearer("abc.def");
        assert_eq!(extract_token(&request), Some("abc.def".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let request = request_with_cookie("xyz.123");
        assert_eq!(extract_token(&request), Some("xyz.123".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie_among_others() {
        let request = Request::builder()
            .uri("/test")
            .header(header::COOKIE, "theme=dark; token=tok.en; lang=ja")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("tok.en".to_string()));
    }

    #[test]
    fn test_extract_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "token=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_token_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_token(&request).is_none());
    }

    #[test]
    fn test_extract_token_ignores_basic_auth() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert!(extract_token(&request).is_none());
    }

    #[test]
    fn test_api_error_codes() {
        assert_eq!(
            ApiError::unauthenticated("x").error.code,
            "UNAUTHENTICATED"
        );
        assert_eq!(
            ApiError::invalid_credential("x").error.code,
            "INVALID_CREDENTIAL"
        );
        assert_eq!(ApiError::forbidden("x").error.code, "FORBIDDEN");
        assert_eq!(ApiError::not_found("x").error.code, "NOT_FOUND");
        assert_eq!(
            ApiError::duplicate_identity("x").error.code,
            "DUPLICATE_IDENTITY"
        );
        assert_eq!(ApiError::store_failure("x").error.code, "STORE_FAILURE");
    }

    #[test]
    fn test_api_error_status_mapping() {
        let cases = [
            (ApiError::unauthenticated("x"), StatusCode::UNAUTHORIZED),
            (ApiError::invalid_credential("x"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("x"), StatusCode::FORBIDDEN),
            (ApiError::not_found("x"), StatusCode::NOT_FOUND),
            (ApiError::validation_error("x"), StatusCode::BAD_REQUEST),
            (ApiError::duplicate_identity("x"), StatusCode::BAD_REQUEST),
            (
                ApiError::store_failure("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_api_error_with_details() {
        let details = serde_json::json!({"field": "email"});
        let error = ApiError::with_details("VALIDATION_ERROR", "Invalid", details.clone());
        assert_eq!(error.error.details, Some(details));
    }
}
