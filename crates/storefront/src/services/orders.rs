//! Order request validation.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use terracotta_core::ProductId;

use crate::error::AppError;
use crate::models::NewOrderLine;

const INVALID_ORDER: &str = "Invalid order data";

/// `POST /orders` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Option<Vec<OrderLineRequest>>,
    pub shipping_address: Option<Value>,
    /// Checked for presence and sign only; the stored total is recomputed
    /// from catalog prices.
    pub total: Option<Decimal>,
}

/// One requested order line. Client prices, if sent, are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A validated order ready for insertion.
#[derive(Debug, PartialEq)]
pub struct ValidOrder {
    pub lines: Vec<NewOrderLine>,
    pub shipping_address: Value,
}

impl CreateOrderRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for missing or empty items, a missing or
    /// empty shipping address, a missing or non-positive total, or any line
    /// with quantity below 1.
    pub fn validate(self) -> Result<ValidOrder, AppError> {
        let items = self
            .items
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AppError::BadRequest(INVALID_ORDER.to_string()))?;

        let shipping_address = self
            .shipping_address
            .filter(|address| !is_blank(address))
            .ok_or_else(|| AppError::BadRequest(INVALID_ORDER.to_string()))?;

        if !self.total.is_some_and(|total| total > Decimal::ZERO) {
            return Err(AppError::BadRequest(INVALID_ORDER.to_string()));
        }

        if items.iter().any(|line| line.quantity < 1) {
            return Err(AppError::BadRequest(
                "Item quantity must be at least 1".to_string(),
            ));
        }

        Ok(ValidOrder {
            lines: items
                .into_iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            shipping_address,
        })
    }
}

fn is_blank(address: &Value) -> bool {
    match address {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: &Value) -> CreateOrderRequest {
        serde_json::from_value(body.clone()).expect("deserializes")
    }

    fn assert_invalid(body: &Value) {
        let err = request(body).validate().expect_err("should be rejected");
        assert!(
            matches!(&err, AppError::BadRequest(msg) if msg == INVALID_ORDER),
            "unexpected error for {body}: {err:?}"
        );
    }

    #[test]
    fn test_valid_order() {
        let order = request(&json!({
            "items": [{ "productId": 1, "quantity": 2, "price": "0.01" }],
            "shippingAddress": { "line1": "1 Kiln Rd", "city": "Stoke" },
            "total": 91.98
        }))
        .validate()
        .expect("valid");

        assert_eq!(
            order.lines,
            vec![NewOrderLine {
                product_id: ProductId::new(1),
                quantity: 2
            }]
        );
        assert_eq!(order.shipping_address["city"], "Stoke");
    }

    #[test]
    fn test_free_text_address_accepted() {
        let order = request(&json!({
            "items": [{ "productId": 1, "quantity": 1 }],
            "shippingAddress": "1 Kiln Rd, Stoke",
            "total": "10.00"
        }))
        .validate()
        .expect("valid");
        assert_eq!(order.shipping_address, json!("1 Kiln Rd, Stoke"));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let address = json!({ "line1": "1 Kiln Rd" });
        let items = json!([{ "productId": 1, "quantity": 1 }]);

        assert_invalid(&json!({ "shippingAddress": address, "total": 5 }));
        assert_invalid(&json!({ "items": [], "shippingAddress": address, "total": 5 }));
        assert_invalid(&json!({ "items": items, "total": 5 }));
        assert_invalid(&json!({ "items": items, "shippingAddress": null, "total": 5 }));
        assert_invalid(&json!({ "items": items, "shippingAddress": "  ", "total": 5 }));
        assert_invalid(&json!({ "items": items, "shippingAddress": {}, "total": 5 }));
        assert_invalid(&json!({ "items": items, "shippingAddress": address }));
        assert_invalid(&json!({ "items": items, "shippingAddress": address, "total": 0 }));
        assert_invalid(&json!({ "items": items, "shippingAddress": address, "total": -1 }));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = request(&json!({
            "items": [{ "productId": 1, "quantity": 0 }],
            "shippingAddress": "somewhere",
            "total": 5
        }))
        .validate()
        .expect_err("rejected");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
