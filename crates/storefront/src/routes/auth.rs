//! Account handlers.
//!
//! Sessions are stateless: login and registration set a signed `token`
//! cookie, logout overwrites it with an expired one.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::routes::products::SuccessResponse;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// `POST /auth/register` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Attach `cookie` to a JSON response.
fn with_cookie(status: StatusCode, body: impl Serialize, cookie: &Cookie<'_>) -> Result<Response> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("session cookie header: {e}")))?;
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}

/// `POST /auth/register`
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .register(&body.name, &body.email, &body.password)
        .await?;

    let token = state.tokens().issue(&user)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Account registered");

    with_cookie(
        StatusCode::CREATED,
        UserResponse { user },
        &state.tokens().session_cookie(token),
    )
}

/// `POST /auth/login`
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::warn!("Login failed");
            }
        })?;

    let token = state.tokens().issue(&user)?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Logged in");

    with_cookie(
        StatusCode::OK,
        UserResponse { user },
        &state.tokens().session_cookie(token),
    )
}

/// `POST /auth/logout`. Works without a valid session.
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    clear_sentry_user();
    with_cookie(
        StatusCode::OK,
        SuccessResponse { success: true },
        &state.tokens().removal_cookie(),
    )
}

/// `GET /auth/me`
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool())
        .get_user(current.id)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(UserResponse { user }))
}
