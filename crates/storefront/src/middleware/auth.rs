//! Authentication extractors.
//!
//! The session token travels in the `token` cookie. `RequireAuth` verifies it
//! and yields the caller's identity; `RequireAdmin` additionally demands the
//! admin role.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use cookie::Cookie;

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::auth::SESSION_COOKIE;
use crate::state::AppState;

const AUTH_REQUIRED: &str = "Authentication required";
const INVALID_TOKEN: &str = "Invalid or expired token";
const ADMIN_REQUIRED: &str = "Admin access required";

/// Extractor that requires a valid session token.
///
/// ```rust,ignore
/// async fn get_cart(
///     State(state): State<AppState>,
///     RequireAuth(user): RequireAuth,
/// ) -> Result<Json<Cart>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid session token with the admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| AppError::Unauthorized(AUTH_REQUIRED.to_string()))?;

        let user = state
            .tokens()
            .verify(&token)
            .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AppError::Forbidden(ADMIN_REQUIRED.to_string()));
        }

        Ok(Self(user))
    }
}

/// Find the session cookie across all `Cookie` headers.
fn session_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_cookies(values: &[&str]) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        for value in values {
            builder = builder.header(COOKIE, *value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    #[test]
    fn test_session_token_found_among_cookies() {
        let parts = parts_with_cookies(&["theme=dark; token=abc.def.ghi; lang=en"]);
        assert_eq!(session_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_token_across_headers() {
        let parts = parts_with_cookies(&["theme=dark", "token=xyz"]);
        assert_eq!(session_token(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_session_token_missing_or_empty() {
        assert_eq!(session_token(&parts_with_cookies(&[])), None);
        assert_eq!(session_token(&parts_with_cookies(&["tokens=abc"])), None);
        assert_eq!(session_token(&parts_with_cookies(&["token="])), None);
    }
}
