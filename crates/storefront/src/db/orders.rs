//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use terracotta_core::{Email, OrderId, OrderItemId, OrderStatus, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{NewOrderLine, Order, OrderCustomer, OrderItem, Product};

const ORDER_COLUMNS: &str =
    "o.id, o.user_id, o.total, o.shipping_address, o.status, o.payment_intent, o.created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total: Decimal,
    shipping_address: serde_json::Value,
    status: OrderStatus,
    payment_intent: Option<String>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>, user: Option<OrderCustomer>) -> Order {
        Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            total: self.total,
            shipping_address: self.shipping_address,
            status: self.status,
            payment_intent: self.payment_intent,
            created_at: self.created_at,
            items,
            user,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminOrderRow {
    #[sqlx(flatten)]
    order: OrderRow,
    user_email: String,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_id: i32,
    order_id: i32,
    item_quantity: i32,
    item_price: Decimal,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        let product: Product = row.product.into();
        Self {
            id: OrderItemId::new(row.item_id),
            order_id: OrderId::new(row.order_id),
            product_id: product.id,
            quantity: row.item_quantity,
            price: row.item_price,
            product,
        }
    }
}

/// Result of applying a confirmed payment to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentUpdate {
    /// Order is now `processing` with the payment intent recorded.
    Applied,
    /// Order is completed or cancelled and was left unchanged.
    Closed(OrderStatus),
    /// No order with this id.
    Missing,
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending order and its items in one transaction.
    ///
    /// Item prices are copied from the product table and the order total is
    /// their sum, so client-supplied prices never reach the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any product doesn't exist; no
    /// rows are written in that case.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        lines: &[NewOrderLine],
        shipping_address: &serde_json::Value,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.order (user_id, total, shipping_address, status)
            VALUES ($1, 0, $2, 'pending')
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(Json(shipping_address))
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            let inserted = sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, quantity, price)
                SELECT $1, p.id, $3, p.price FROM storefront.product p WHERE p.id = $2
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        sqlx::query(
            r"
            UPDATE storefront.order SET total = (
                SELECT COALESCE(SUM(price * quantity), 0)
                FROM storefront.order_item WHERE order_id = $1
            )
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(OrderId::new(order_id))
            .await?
            .ok_or_else(|| RepositoryError::DataCorruption("created order vanished".to_owned()))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut items = self.items_for(&[row.id]).await?;
        let order_items = items.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(order_items, None)))
    }

    /// Get an order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .get(id)
            .await?
            .filter(|order| order.user_id == user_id))
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM storefront.order o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items, None)
            })
            .collect())
    }

    /// List every order with its customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a customer email is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminOrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.email AS user_email
            FROM storefront.order o
            JOIN storefront.user u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.order.id).collect();
        let mut items = self.items_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let email = Email::parse(&row.user_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                let customer = OrderCustomer {
                    id: UserId::new(row.order.user_id),
                    email,
                };
                let order_items = items.remove(&row.order.id).unwrap_or_default();
                Ok(row.order.into_order(order_items, Some(customer)))
            })
            .collect()
    }

    /// Overwrite an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query("UPDATE storefront.order SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Record a confirmed payment: status becomes `processing` and the
    /// payment intent is stored.
    ///
    /// Re-applying the same payment yields the same row. Orders that are
    /// already completed or cancelled are not touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        payment_intent: Option<&str>,
    ) -> Result<PaymentUpdate, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status: Option<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM storefront.order WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let outcome = match status {
            None => PaymentUpdate::Missing,
            Some(status) if !status.accepts_payment() => PaymentUpdate::Closed(status),
            Some(_) => {
                sqlx::query(
                    r"
                    UPDATE storefront.order
                    SET status = 'processing', payment_intent = COALESCE($2, payment_intent)
                    WHERE id = $1
                    ",
                )
                .bind(id)
                .bind(payment_intent)
                .execute(&mut *tx)
                .await?;
                PaymentUpdate::Applied
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Load items for a set of orders, grouped by order id.
    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            r"
            SELECT oi.id AS item_id, oi.order_id, oi.quantity AS item_quantity,
                   oi.price AS item_price, {PRODUCT_COLUMNS}
            FROM storefront.order_item oi
            JOIN storefront.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.id
            "
        ))
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }
}

