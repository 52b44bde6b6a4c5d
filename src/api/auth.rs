//! Authentication API endpoints
//!
//! Handles HTTP requests for account registration and session management:
//! - POST /api/register - Create an account
//! - POST /api/login - Issue the token cookie
//! - POST /api/logout - Clear the token cookie
//! - GET  /api/user - Profile of the authenticated account

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, CurrentIdentity};
use crate::models::{CreateUserInput, User, UserRole};
use crate::services::CredentialError;

/// Request body for registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub user_type: Option<String>,
    pub organization: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Account summary returned by login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub user_type: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            user_type: user.role.to_string(),
        }
    }
}

/// Full profile returned by GET /api/user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub user_type: String,
    pub organization: Option<String>,
    pub created_at: String,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            user_type: user.role.to_string(),
            organization: user.organization,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/user", get(current_user))
}

/// POST /api/register - Create an account
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let role = match body.user_type.as_deref() {
        Some(raw) => Some(
            raw.parse::<UserRole>()
                .map_err(|_| ApiError::validation_error("無効なユーザー種別です"))?,
        ),
        None => None,
    };

    let input = CreateUserInput {
        email: body.email,
        password: body.password,
        name: body.name,
        role,
        organization: body.organization,
    };

    let user = state
        .credential_service
        .register(input)
        .await
        .map_err(|e| match e {
            CredentialError::ValidationError(msg) => ApiError::validation_error(msg),
            CredentialError::DuplicateIdentity(_) => {
                ApiError::duplicate_identity("このメールアドレスは既に登録されています")
            }
            _ => ApiError::store_failure("登録に失敗しました"),
        })?;

    Ok(Json(RegisterResponse {
        message: "登録が完了しました".to_string(),
        user_id: user.id,
    }))
}

/// POST /api/login - Verify credentials and set the token cookie
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, token) = state
        .credential_service
        .authenticate(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            CredentialError::InvalidCredential => {
                ApiError::invalid_credential("メールアドレスまたはパスワードが正しくありません")
            }
            _ => ApiError::store_failure("ログインに失敗しました"),
        })?;

    let cookie = session_cookie(
        &token,
        state.config.auth.token_ttl_days,
        state.config.server.environment.is_production(),
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());

    Ok((
        headers,
        Json(LoginResponse {
            message: "ログインに成功しました".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /api/logout - Clear the token cookie
async fn logout() -> impl IntoResponse {
    let clear_cookie = "token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    (
        headers,
        Json(serde_json::json!({ "message": "ログアウトしました" })),
    )
}

/// GET /api/user - Profile of the authenticated account
///
/// Re-reads the account row so the response carries fields the token does
/// not, such as organization. The fixed development identity has no row
/// and is answered from the identity itself.
async fn current_user(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user = state
        .credential_service
        .get_user(identity.0.id)
        .await
        .map_err(|_| ApiError::store_failure("ユーザー情報の取得に失敗しました"))?;

    match user {
        Some(user) => Ok(Json(user.into())),
        None if state.config.auth.bypass => Ok(Json(UserProfileResponse {
            id: identity.0.id,
            email: identity.0.email.clone(),
            name: identity.0.name.clone(),
            user_type: identity.0.role.to_string(),
            organization: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        })),
        None => Err(ApiError::not_found("ユーザーが見つかりません")),
    }
}

/// Build the Set-Cookie value for a session token
fn session_cookie(token: &str, ttl_days: u64, secure: bool) -> String {
    let max_age = ttl_days * 24 * 60 * 60;
    if secure {
        format!(
            "token={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
            token, max_age
        )
    } else {
        format!(
            "token={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            token, max_age
        )
    }
}
