//! User account models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use terracotta_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash is never part of this struct, so it cannot leak
/// through serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Identity attached to an authenticated request.
///
/// Comes from the session token, so `role` reflects the role at login time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

impl CurrentUser {
    /// Whether the caller may use the administrative endpoints.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
