//! Core types for Terracotta.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod quantity;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, to_minor_units};
pub use quantity::{MAX_SYNC_QUANTITY, SyncQuantity};
pub use status::*;
