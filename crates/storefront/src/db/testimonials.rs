//! Testimonial repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use terracotta_core::TestimonialId;

use super::RepositoryError;
use crate::models::Testimonial;

#[derive(sqlx::FromRow)]
struct TestimonialRow {
    id: i32,
    name: String,
    role: String,
    image: Option<String>,
    content: String,
    rating: i32,
    created_at: DateTime<Utc>,
}

impl From<TestimonialRow> for Testimonial {
    fn from(row: TestimonialRow) -> Self {
        Self {
            id: TestimonialId::new(row.id),
            name: row.name,
            role: row.role,
            image: row.image,
            content: row.content,
            rating: row.rating,
            created_at: row.created_at,
        }
    }
}

/// Repository for testimonials.
pub struct TestimonialRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestimonialRepository<'a> {
    /// Create a new testimonial repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all testimonials, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Testimonial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(
            r"
            SELECT id, name, role, image, content, rating, created_at
            FROM storefront.testimonial
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Testimonial::from).collect())
    }

    /// Insert a testimonial unless one by the same author already exists.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// rating outside 1..=5).
    pub async fn insert_if_absent(
        &self,
        name: &str,
        role: &str,
        image: Option<&str>,
        content: &str,
        rating: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.testimonial (name, role, image, content, rating)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM storefront.testimonial WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(role)
        .bind(image)
        .bind(content)
        .bind(rating)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
