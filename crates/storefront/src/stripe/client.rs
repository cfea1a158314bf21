//! Stripe REST API client.

use std::time::Duration;

use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};
use url::Url;

use super::error::StripeError;
use super::types::{ApiErrorResponse, CheckoutSession, CreateCheckoutSession};
use crate::config::StripeConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the subset of the Stripe API used by checkout.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: Url,
    currency: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Request` if the HTTP client cannot be built.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Ok(Self {
            client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
            currency: config.currency.clone(),
        })
    }

    /// Currency used for every `price_data` line.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Create a hosted Checkout Session.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails or Stripe rejects it.
    #[instrument(skip(self, params), fields(lines = params.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        params: &CreateCheckoutSession,
    ) -> Result<CheckoutSession, StripeError> {
        let url = self.api_base.join("/v1/checkout/sessions")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params.to_form())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let session: CheckoutSession = parse_response(response).await?;
        debug!(session_id = %session.id, "Created Stripe Checkout Session");
        Ok(session)
    }

    /// Retrieve a Checkout Session with its line items expanded.
    ///
    /// The session is returned as raw JSON and passed through to callers.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the request fails or Stripe rejects it.
    #[instrument(skip(self))]
    pub async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<serde_json::Value, StripeError> {
        let mut url = self.api_base.join("/v1/checkout/sessions/")?;
        url.path_segments_mut()
            .map_err(|()| StripeError::Request("API base cannot be a base URL".to_owned()))?
            .pop_if_empty()
            .push(session_id);
        url.query_pairs_mut().append_pair("expand[]", "line_items");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        parse_response(response).await
    }
}

/// Decode a success body, or turn Stripe's error envelope into `StripeError::Api`.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, StripeError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error.message.or(e.error.kind))
            .unwrap_or_else(|| format!("HTTP {status}"));
        error!(status = %status, message = %message, "Stripe API error");
        return Err(StripeError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| StripeError::Response(e.to_string()))
}
