//! Catalog product models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use terracotta_core::ProductId;

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated product to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub featured: bool,
}

/// A validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

/// Normalized listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category: None,
            featured: None,
            search: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ProductFilter {
    /// Build a filter from raw query-string values.
    ///
    /// `featured` is true only for the literal `"true"`; an empty value applies
    /// no filter and any other value filters for non-featured products.
    /// Unparseable `limit` and
    /// `offset` fall back to their defaults.
    #[must_use]
    pub fn from_query(
        category: Option<&str>,
        featured: Option<&str>,
        search: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Self {
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .map_or(DEFAULT_PAGE_SIZE, |l| l.clamp(1, MAX_PAGE_SIZE));
        let offset = offset
            .and_then(|o| o.trim().parse::<i64>().ok())
            .map_or(0, |o| o.max(0));

        Self {
            category: category.filter(|c| !c.is_empty()).map(String::from),
            featured: featured.filter(|f| !f.is_empty()).map(|f| f == "true"),
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            limit,
            offset,
        }
    }

    /// The `search` term as an `ILIKE` pattern with wildcards escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the filter, ignoring pagination.
    pub total: i64,
}
