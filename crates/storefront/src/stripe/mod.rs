//! Stripe Checkout integration.
//!
//! Talks to the Stripe REST API directly with `reqwest` (form-encoded
//! requests, JSON responses) and verifies webhook signatures locally.

mod client;
mod error;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{CheckoutLineItem, CheckoutSession, CreateCheckoutSession, Event};
pub use webhook::{SignatureError, verify_signature};
