//! Account inspection and management commands.

use tracing::{info, warn};

use terracotta_core::{Email, Role};
use terracotta_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Print every account as `id | email | role | createdAt`.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool).list().await?;

    info!("Total users: {}", users.len());
    for user in &users {
        info!(
            "{} | {} | {} | {}",
            user.id,
            user.email,
            user.role,
            user.created_at.to_rfc3339()
        );
    }

    Ok(())
}

/// Grant the admin role to the account with `email`.
///
/// The user's current session keeps its old role until they log in again.
///
/// # Errors
///
/// Returns an error if the email is invalid, no account has it, or the
/// database is unreachable.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    match UserRepository::new(&pool)
        .set_role_by_email(&email, Role::Admin)
        .await
    {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "User promoted to admin");
            Ok(())
        }
        Err(RepositoryError::NotFound) => {
            warn!(email = %email, "No user found");
            Err(RepositoryError::NotFound.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Report whether the `ADMIN_EMAIL` account exists and which role it has.
///
/// # Errors
///
/// Returns an error if the email is invalid or the database is unreachable.
pub async fn check_admin() -> Result<(), CommandError> {
    let pool = connect().await?;
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_owned());
    let email = Email::parse(&email)?;

    match UserRepository::new(&pool).get_by_email(&email).await? {
        Some(user) if user.role.is_admin() => {
            info!("Found user: {} role={} id={}", user.email, user.role, user.id);
        }
        Some(user) => {
            warn!(
                "Found user: {} role={} id={} (not an admin)",
                user.email, user.role, user.id
            );
        }
        None => warn!("No user found with email {email}"),
    }

    Ok(())
}
