//! Database operations for the storefront `PostgreSQL` schema.
//!
//! # Schema: `storefront`
//!
//! - `user` - Accounts with argon2 password hashes and a role
//! - `product` - Catalog
//! - `cart_item` - Server-side carts, one row per (user, product)
//! - `order` / `order_item` - Placed orders with snapshotted prices
//! - `testimonial` - Seeded, read-only
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p terracotta-cli -- migrate
//! ```
//!
//! Queries are built with `sqlx::query_as` at runtime so the workspace
//! compiles without a live database.

pub mod cart;
pub mod orders;
pub mod products;
pub mod testimonials;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use testimonials::TestimonialRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, referenced product).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A computed value does not fit its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// `numeric_value_out_of_range`
const SQLSTATE_OUT_OF_RANGE: &str = "22003";

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict`, everything else
    /// to `Database`.
    pub(crate) fn from_constraint(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }

    /// Map numeric overflow to `OutOfRange`, everything else to `Database`.
    pub(crate) fn from_overflow(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.code().as_deref() == Some(SQLSTATE_OUT_OF_RANGE)
        {
            return Self::OutOfRange(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
