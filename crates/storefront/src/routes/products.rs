//! Product catalog handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use terracotta_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductFilter, ProductPage};
use crate::services::catalog::{CreateProductRequest, UpdateProductRequest};
use crate::state::AppState;

/// Raw listing query. Values are normalized by `ProductFilter::from_query`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

fn product_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let filter = ProductFilter::from_query(
        query.category.as_deref(),
        query.featured.as_deref(),
        query.search.as_deref(),
        query.limit.as_deref(),
        query.offset.as_deref(),
    );

    let page = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

/// `GET /products/:id`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductResponse { product }))
}

/// `POST /products` (admin)
#[instrument(skip(state, body), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let new_product = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

/// `PATCH /products/:id` (admin)
#[instrument(skip(state, body), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>> {
    let patch = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &patch)
        .await
        .map_err(product_not_found)?;

    Ok(Json(ProductResponse { product }))
}

/// `DELETE /products/:id` (admin)
#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<SuccessResponse>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(product_not_found)?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(SuccessResponse { success: true }))
}
