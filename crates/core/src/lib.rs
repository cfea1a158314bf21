//! Terracotta Core - Shared domain types.
//!
//! This crate provides the types used across all Terracotta components:
//! - `storefront` - JSON API server (catalog, cart, orders, checkout)
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, order statuses, money and cart
//!   quantity rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
