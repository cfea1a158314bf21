//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use terracotta_core::{Email, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::Product;

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    /// Structured address object or free-text string, stored as given.
    pub shipping_address: serde_json::Value,
    pub status: OrderStatus,
    pub payment_intent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    /// Present only on admin listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderCustomer>,
}

/// An order line with the price captured when the order was placed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
    pub product: Product,
}

/// The ordering account, as shown to admins.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub email: Email,
}

/// A validated line for order creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}
