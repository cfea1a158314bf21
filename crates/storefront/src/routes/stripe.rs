//! Stripe Checkout handlers.
//!
//! The webhook is the only unauthenticated mutating endpoint; it trusts a
//! request only after the `Stripe-Signature` header verifies against the raw
//! body.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::services::checkout::{
    CheckoutRedirects, CheckoutRequest, build_session_params, is_valid_session_id,
    parse_order_ref, reconcile_event,
};
use crate::state::AppState;
use crate::stripe::{Event, verify_signature};

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// `POST /stripe/create-checkout-session`
#[instrument(skip(state, body))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutSessionResponse>> {
    let items = body.items.unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::BadRequest("No items provided".to_string()));
    }
    let order = parse_order_ref(body.order_id.as_ref())?;

    if let Some(order_id) = order {
        OrderRepository::new(state.pool())
            .get_for_user(order_id, user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    }

    let params = build_session_params(
        items,
        state.stripe().currency(),
        order,
        user.id,
        CheckoutRedirects::for_frontend(state.config()),
    )?;

    let session = state.stripe().create_checkout_session(&params).await?;

    add_breadcrumb(
        "checkout",
        "Created checkout session",
        Some(&[("session_id", session.id.as_str())]),
    );

    Ok(Json(CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// `POST /stripe/webhook`
///
/// Signature or payload problems answer 400 with no side effects. A
/// database failure while applying a verified event answers 500 so Stripe
/// retries the delivery.
#[instrument(skip_all, fields(event_id))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = verify_signature(&body, signature, &state.config().stripe.webhook_secret) {
        warn!(error = %e, "Webhook signature verification failed");
        return Err(AppError::BadRequest(format!("Webhook Error: {e}")));
    }

    let event: Event = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Webhook payload is not a Stripe event");
        AppError::BadRequest("Webhook Error: invalid payload".to_string())
    })?;

    tracing::Span::current().record("event_id", event.id.as_str());
    let outcome = reconcile_event(state.pool(), &event).await?;
    tracing::debug!(event_id = %event.id, ?outcome, "Webhook processed");

    Ok(Json(WebhookAck { received: true }))
}

/// `GET /stripe/session/:id`
#[instrument(skip(state))]
pub async fn session(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<SessionResponse>> {
    if !is_valid_session_id(&id) {
        return Err(AppError::BadRequest("Invalid session id".to_string()));
    }

    let session = state.stripe().retrieve_session(&id).await?;
    Ok(Json(SessionResponse { session }))
}
