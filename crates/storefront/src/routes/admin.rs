//! Administrative handlers. Every handler requires the admin role.

use std::str::FromStr;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use terracotta_core::{OrderId, OrderStatus, Role, UserId};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::routes::orders::{OrderListResponse, OrderResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// `PATCH /admin/orders/:id/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<Value>,
}

/// `GET /admin/users`
#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<UserListResponse>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(UserListResponse { users }))
}

/// `POST /admin/users/:id/promote`
#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn promote_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .set_role(id, Role::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    Ok(Json(UserResponse { user }))
}

/// `GET /admin/orders`
#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(OrderListResponse { orders }))
}

/// `PATCH /admin/orders/:id/status`. Overwrites the status unconditionally.
#[instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<OrderResponse>> {
    let status = body
        .status
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| OrderStatus::from_str(s).ok())
        .ok_or_else(|| AppError::BadRequest("Invalid status".to_string()))?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, status = %status, "Order status updated");
    Ok(Json(OrderResponse { order }))
}
