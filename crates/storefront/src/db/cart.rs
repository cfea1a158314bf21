//! Server-side cart repository.
//!
//! Every write that needs the product to exist is a single
//! `INSERT ... SELECT FROM product` statement, so a missing product shows up
//! as zero affected rows instead of a foreign-key error.

use sqlx::{PgConnection, PgPool};

use terracotta_core::{ProductId, SyncQuantity, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::{Cart, CartLine};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            product: row.product.into(),
            quantity: row.quantity,
        }
    }
}

/// One normalized entry of a sync batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncEntry {
    pub product_id: ProductId,
    pub quantity: SyncQuantity,
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart joined with current product data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}, c.quantity
            FROM storefront.cart_item c
            JOIN storefront.product p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY p.name, p.id
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart {
            items: rows.into_iter().map(CartLine::from).collect(),
        })
    }

    /// Add `quantity` units, creating the row or incrementing it atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::OutOfRange` if the summed quantity overflows.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.cart_item AS c (user_id, product_id, quantity)
            SELECT $1, p.id, $3 FROM storefront.product p WHERE p.id = $2
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = c.quantity + EXCLUDED.quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_overflow(e, "quantity is too large"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set an exact quantity, or delete the row when `quantity <= 0`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a positive quantity is set on a
    /// product that doesn't exist.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        if quantity <= 0 {
            delete_line(&mut conn, user_id, product_id).await?;
            return Ok(());
        }
        if !upsert_line(&mut conn, user_id, product_id, quantity).await? {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one product from the cart. Missing rows are not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        delete_line(&mut conn, user_id, product_id).await
    }

    /// Remove every row for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Apply a sync batch in one transaction, in order.
    ///
    /// Entries for unknown products are skipped. Returns how many entries
    /// were applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// from the batch is kept in that case.
    pub async fn sync(
        &self,
        user_id: UserId,
        entries: &[SyncEntry],
    ) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut applied = 0;

        for entry in entries {
            match entry.quantity {
                SyncQuantity::Remove => {
                    delete_line(&mut tx, user_id, entry.product_id).await?;
                    applied += 1;
                }
                SyncQuantity::Set(quantity) => {
                    if upsert_line(&mut tx, user_id, entry.product_id, quantity).await? {
                        applied += 1;
                    } else {
                        tracing::debug!(
                            product_id = %entry.product_id,
                            "Skipping unknown product in cart sync"
                        );
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(applied)
    }
}

/// Upsert an exact quantity. Returns `false` if the product doesn't exist.
async fn upsert_line(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        INSERT INTO storefront.cart_item (user_id, product_id, quantity)
        SELECT $1, p.id, $3 FROM storefront.product p WHERE p.id = $2
        ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn delete_line(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
