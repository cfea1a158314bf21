//! Product catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use terracotta_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductFilter, ProductPage, ProductPatch};

/// Product columns, qualified with the `p` alias used by joins.
pub(super) const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.price, p.category, p.images, p.stock, p.featured, p.created_at";

const FILTER_CLAUSE: &str = r"
    ($1::text IS NULL OR p.category = $1)
    AND ($2::boolean IS NULL OR p.featured = $2)
    AND ($3::text IS NULL OR p.name ILIKE $3 OR p.description ILIKE $3)
";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category: String,
    images: Vec<String>,
    stock: i32,
    featured: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            images: row.images,
            stock: row.stock,
            featured: row.featured,
            created_at: row.created_at,
        }
    }
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching a filter, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let pattern = filter.search_pattern();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE {FILTER_CLAUSE}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(filter.category.as_deref())
        .bind(filter.featured)
        .bind(pattern.as_deref())
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM storefront.product p WHERE {FILTER_CLAUSE}"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.featured)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(Product::from).collect(),
            total,
        })
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Whether a product with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM storefront.product WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO storefront.product AS p
                (name, description, price, category, images, stock, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.images)
        .bind(product.stock)
        .bind(product.featured)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Apply a partial update. Fields left as `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE storefront.product AS p SET
                name = COALESCE($2, p.name),
                description = COALESCE($3, p.description),
                price = COALESCE($4, p.price),
                category = COALESCE($5, p.category),
                images = COALESCE($6, p.images),
                stock = COALESCE($7, p.stock),
                featured = COALESCE($8, p.featured)
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.category.as_deref())
        .bind(patch.images.as_deref())
        .bind(patch.stock)
        .bind(patch.featured)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product. Cart rows go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if order items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(e, "product is referenced by existing orders")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
