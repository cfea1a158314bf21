//! Signed session tokens (HS256 JWT) and the cookie that carries them.

use std::time::Duration;

use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use terracotta_core::{Role, UserId};

use super::AuthError;
use crate::models::{CurrentUser, User};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// Session lifetime: 7 days.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id, as a decimal string.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    secure_cookie: bool,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("key", &"[REDACTED]")
            .field("secure_cookie", &self.secure_cookie)
            .finish_non_exhaustive()
    }
}

impl SessionTokens {
    /// Create a token service keyed with `secret`.
    #[must_use]
    pub fn new(secret: &SecretString, secure_cookie: bool) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            secure_cookie,
        }
    }

    /// Sign a token for `user`, valid for [`SESSION_TTL`] from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user.id, user.role, chrono::Utc::now().timestamp())
    }

    fn issue_at(&self, user_id: UserId, role: Role, now: i64) -> Result<String, AuthError> {
        let ttl = i64::try_from(SESSION_TTL.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now.saturating_add(ttl),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify signature and expiry, returning the caller's identity.
    ///
    /// Returns `None` for any invalid, expired, or foreign token.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<CurrentUser> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).ok()?;
        let id: UserId = data.claims.sub.parse().ok()?;
        Some(CurrentUser {
            id,
            role: data.claims.role,
        })
    }

    /// Cookie carrying a freshly issued token.
    #[must_use]
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = cookie::time::Duration::seconds(
            i64::try_from(SESSION_TTL.as_secs()).unwrap_or(i64::MAX),
        );
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure_cookie)
            .max_age(max_age)
            .build()
    }

    /// Cookie that clears the session in the browser.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure_cookie)
            .build();
        cookie.make_removal();
        cookie
    }
}
