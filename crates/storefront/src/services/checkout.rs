//! Checkout orchestration: building Stripe sessions and applying webhook
//! events to orders.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use terracotta_core::{OrderId, UserId, to_minor_units};

use crate::config::StorefrontConfig;
use crate::db::RepositoryError;
use crate::db::orders::{OrderRepository, PaymentUpdate};
use crate::error::AppError;
use crate::stripe::types::{CHECKOUT_SESSION_COMPLETED, CompletedSession};
use crate::stripe::{CheckoutLineItem, CreateCheckoutSession, Event};

/// Metadata value used when checkout starts before a local order exists.
pub const NEW_ORDER_SENTINEL: &str = "new";

/// `POST /stripe/create-checkout-session` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Option<Vec<CheckoutItemRequest>>,
    /// Local order id, the string `"new"`, or absent.
    pub order_id: Option<Value>,
}

/// A display line for the hosted checkout page.
#[derive(Debug, Deserialize)]
pub struct CheckoutItemRequest {
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Where Stripe sends the shopper afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirects {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRedirects {
    #[must_use]
    pub fn for_frontend(config: &StorefrontConfig) -> Self {
        Self {
            success_url: config
                .frontend_link("/order-confirmation?session_id={CHECKOUT_SESSION_ID}"),
            cancel_url: config.frontend_link("/cart"),
        }
    }
}

/// Read the optional `orderId` field.
///
/// # Errors
///
/// Returns `AppError::BadRequest` unless the value is absent, null, the
/// `"new"` sentinel, or a positive integer id.
pub fn parse_order_ref(value: Option<&Value>) -> Result<Option<OrderId>, AppError> {
    let invalid = || AppError::BadRequest("Invalid orderId".to_string());
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == NEW_ORDER_SENTINEL => Ok(None),
        Some(Value::String(s)) => s
            .parse::<OrderId>()
            .ok()
            .filter(|id| id.as_i32() > 0)
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
            .map(|n| Some(OrderId::new(n)))
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}

/// Turn client display lines into Checkout Session parameters.
///
/// Prices become integer minor units, only the first image is kept, and the
/// metadata records the local order (or the sentinel) and the user.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an empty item list or an item with a
/// blank name, a quantity below 1, or a price that is negative or too large.
pub fn build_session_params(
    items: Vec<CheckoutItemRequest>,
    currency: &str,
    order: Option<OrderId>,
    user: UserId,
    redirects: CheckoutRedirects,
) -> Result<CreateCheckoutSession, AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("No items provided".to_string()));
    }

    let line_items = items
        .into_iter()
        .map(|item| {
            if item.name.trim().is_empty() {
                return Err(AppError::BadRequest("Item name is required".to_string()));
            }
            if item.quantity < 1 {
                return Err(AppError::BadRequest(
                    "Item quantity must be at least 1".to_string(),
                ));
            }
            let unit_amount = to_minor_units(item.price)
                .map_err(|_| AppError::BadRequest("Invalid item price".to_string()))?;

            Ok(CheckoutLineItem {
                name: item.name,
                unit_amount,
                quantity: item.quantity,
                image: item.images.into_iter().next(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let order_ref = order.map_or_else(|| NEW_ORDER_SENTINEL.to_string(), |id| id.to_string());

    Ok(CreateCheckoutSession {
        currency: currency.to_string(),
        line_items,
        success_url: redirects.success_url,
        cancel_url: redirects.cancel_url,
        metadata: vec![
            ("orderId".to_string(), order_ref),
            ("userId".to_string(), user.to_string()),
        ],
    })
}

/// Stripe object ids are alphanumeric with underscores.
#[must_use]
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// What a verified webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type this service does not act on.
    Ignored,
    /// Completed session without a usable local order id.
    NoOrder,
    /// Order moved to `processing`.
    Paid(OrderId),
    /// Order exists but is completed or cancelled; left alone.
    Closed(OrderId),
    /// Metadata named an order that does not exist.
    UnknownOrder(OrderId),
}

/// Apply a verified event to local order state.
///
/// # Errors
///
/// Returns `RepositoryError` only for database failures; unusable events are
/// logged and reported as an outcome.
pub async fn reconcile_event(
    pool: &PgPool,
    event: &Event,
) -> Result<WebhookOutcome, RepositoryError> {
    if event.event_type != CHECKOUT_SESSION_COMPLETED {
        info!(event_id = %event.id, event_type = %event.event_type, "Ignoring Stripe event");
        return Ok(WebhookOutcome::Ignored);
    }

    let session: CompletedSession = match serde_json::from_value(event.data.object.clone()) {
        Ok(session) => session,
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Unreadable checkout session in event");
            return Ok(WebhookOutcome::NoOrder);
        }
    };

    let Some(order_id) = completed_order_id(&session) else {
        info!(
            event_id = %event.id,
            session_id = %session.id,
            "Checkout completed without a local order"
        );
        return Ok(WebhookOutcome::NoOrder);
    };

    let payment_intent = session.payment_intent.as_ref().map(|pi| pi.id());
    let outcome = OrderRepository::new(pool)
        .mark_paid(order_id, payment_intent)
        .await?;

    Ok(match outcome {
        PaymentUpdate::Applied => {
            info!(order_id = %order_id, session_id = %session.id, "Order paid");
            WebhookOutcome::Paid(order_id)
        }
        PaymentUpdate::Closed(status) => {
            warn!(order_id = %order_id, status = %status, "Payment event for closed order ignored");
            WebhookOutcome::Closed(order_id)
        }
        PaymentUpdate::Missing => {
            warn!(
                order_id = %order_id,
                session_id = %session.id,
                "Payment event for unknown order"
            );
            WebhookOutcome::UnknownOrder(order_id)
        }
    })
}

fn completed_order_id(session: &CompletedSession) -> Option<OrderId> {
    let raw = session.metadata.order_id.as_deref()?;
    if raw == NEW_ORDER_SENTINEL {
        return None;
    }
    match raw.parse::<OrderId>() {
        Ok(id) if id.as_i32() > 0 => Some(id),
        _ => {
            warn!(order_id = raw, "Non-numeric orderId in checkout metadata");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn redirects() -> CheckoutRedirects {
        CheckoutRedirects {
            success_url: "http://localhost:5173/order-confirmation?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:5173/cart".to_string(),
        }
    }

    fn items(body: serde_json::Value) -> Vec<CheckoutItemRequest> {
        serde_json::from_value(body).expect("items deserialize")
    }

    fn session(metadata: serde_json::Value) -> CompletedSession {
        serde_json::from_value(json!({ "id": "cs_test", "metadata": metadata }))
            .expect("session deserializes")
    }

    #[test]
    fn test_parse_order_ref() {
        assert_eq!(parse_order_ref(None).ok(), Some(None));
        assert_eq!(parse_order_ref(Some(&json!(null))).ok(), Some(None));
        assert_eq!(parse_order_ref(Some(&json!("new"))).ok(), Some(None));
        assert_eq!(
            parse_order_ref(Some(&json!(12))).ok(),
            Some(Some(OrderId::new(12)))
        );
        assert_eq!(
            parse_order_ref(Some(&json!("12"))).ok(),
            Some(Some(OrderId::new(12)))
        );
        assert!(parse_order_ref(Some(&json!("twelve"))).is_err());
        assert!(parse_order_ref(Some(&json!(-3))).is_err());
        assert!(parse_order_ref(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_build_session_params() {
        let params = build_session_params(
            items(json!([
                { "name": "Clay Vase", "price": 45.99, "quantity": 2,
                  "images": ["https://cdn.example/a.jpg", "https://cdn.example/b.jpg"] },
                { "name": "Saucer", "price": "0.005", "quantity": 1 }
            ])),
            "usd",
            Some(OrderId::new(42)),
            UserId::new(7),
            redirects(),
        )
        .expect("valid");

        assert_eq!(params.line_items.len(), 2);
        assert_eq!(params.line_items[0].unit_amount, 4599);
        assert_eq!(
            params.line_items[0].image.as_deref(),
            Some("https://cdn.example/a.jpg")
        );
        // Half a cent rounds away from zero.
        assert_eq!(params.line_items[1].unit_amount, 1);
        assert_eq!(params.line_items[1].image, None);
        assert_eq!(
            params.metadata,
            vec![
                ("orderId".to_string(), "42".to_string()),
                ("userId".to_string(), "7".to_string()),
            ]
        );
        assert!(params.success_url.ends_with("{CHECKOUT_SESSION_ID}"));
    }

    #[test]
    fn test_build_session_params_new_order_sentinel() {
        let params = build_session_params(
            items(json!([{ "name": "Mug", "price": 18, "quantity": 1 }])),
            "usd",
            None,
            UserId::new(3),
            redirects(),
        )
        .expect("valid");
        assert_eq!(params.metadata[0].1, NEW_ORDER_SENTINEL);
    }

    #[test]
    fn test_build_session_params_rejects_bad_items() {
        let err = build_session_params(vec![], "usd", None, UserId::new(1), redirects())
            .expect_err("empty");
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "No items provided"));

        for bad in [
            json!([{ "name": "Mug", "price": 18, "quantity": 0 }]),
            json!([{ "name": "Mug", "price": -1, "quantity": 1 }]),
            json!([{ "name": " ", "price": 18, "quantity": 1 }]),
        ] {
            assert!(
                build_session_params(items(bad), "usd", None, UserId::new(1), redirects())
                    .is_err()
            );
        }
    }

    #[test]
    fn test_session_id_charset() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("cs_test/../../v1/charges"));
        assert!(!is_valid_session_id("cs test"));
    }

    #[test]
    fn test_completed_order_id() {
        assert_eq!(
            completed_order_id(&session(json!({ "orderId": "42" }))),
            Some(OrderId::new(42))
        );
        assert_eq!(completed_order_id(&session(json!({ "orderId": "new" }))), None);
        assert_eq!(completed_order_id(&session(json!({ "orderId": "abc" }))), None);
        assert_eq!(completed_order_id(&session(json!({}))), None);
    }
}
