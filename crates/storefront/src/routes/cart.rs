//! Server-side cart handlers.
//!
//! Every mutation answers with the full cart so the client can replace its
//! local copy wholesale.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use terracotta_core::{ProductId, UserId};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::cart::parse_sync_entries;
use crate::state::AppState;

/// `POST /cart/items` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// `PATCH /cart/items/:productId` body.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: Option<i32>,
}

/// `POST /cart/sync` body: the client's whole local cart.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub items: Vec<Value>,
}

fn product_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => other.into(),
    }
}

async fn load(state: &AppState, user_id: UserId) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get(user_id).await?;
    Ok(Json(cart))
}

/// `GET /cart`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    load(&state, user.id).await
}

/// `POST /cart/items`: add, or increment an existing line.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<Cart>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("productId required".to_string()))?;
    let quantity = body.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be > 0".to_string()));
    }

    CartRepository::new(state.pool())
        .add(user.id, product_id, quantity)
        .await
        .map_err(product_not_found)?;

    load(&state, user.id).await
}

/// `PATCH /cart/items/:productId`: set an exact quantity; `<= 0` removes.
#[instrument(skip(state))]
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity required".to_string()))?;

    CartRepository::new(state.pool())
        .set_quantity(user.id, product_id, quantity)
        .await
        .map_err(product_not_found)?;

    load(&state, user.id).await
}

/// `DELETE /cart/items/:productId`
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<Cart>> {
    CartRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;

    load(&state, user.id).await
}

/// `DELETE /cart`
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(Cart::default()))
}

/// `POST /cart/sync`: replace lines with the client's view, entry by entry.
#[instrument(skip(state, body), fields(entries = body.items.len()))]
pub async fn sync(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<SyncRequest>,
) -> Result<Json<Cart>> {
    let entries = parse_sync_entries(&body.items);
    let applied = CartRepository::new(state.pool())
        .sync(user.id, &entries)
        .await?;

    let applied_str = applied.to_string();
    add_breadcrumb("cart", "Cart synced", Some(&[("applied", applied_str.as_str())]));
    tracing::info!(received = body.items.len(), applied, "Cart synced");

    load(&state, user.id).await
}
