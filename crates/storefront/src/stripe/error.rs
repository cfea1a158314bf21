//! Stripe-related errors.

use thiserror::Error;

/// Errors that can occur when calling the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed before a response arrived.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Stripe answered with an error status.
    #[error("Stripe API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from Stripe's error object.
        message: String,
    },

    /// Failed to parse the response body.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Could not build a request URL.
    #[error("Stripe URL error: {0}")]
    Url(#[from] url::ParseError),
}
