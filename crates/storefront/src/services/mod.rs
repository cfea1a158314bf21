//! Business logic services for the storefront API.
//!
//! # Services
//!
//! - `auth` - Password accounts and session tokens
//! - `cart` - Lenient parsing of cart sync batches
//! - `catalog` - Product create/update validation
//! - `checkout` - Stripe session parameters and webhook reconciliation
//! - `orders` - Order request validation

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
