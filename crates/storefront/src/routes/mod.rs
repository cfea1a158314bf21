//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! Every route is served under `/api` and also at the root.
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Database check
//!
//! # Catalog
//! GET    /products                      - Filtered listing
//! GET    /products/:id                  - Product detail
//! POST   /products                      - Create (admin)
//! PATCH  /products/:id                  - Partial update (admin)
//! DELETE /products/:id                  - Delete (admin)
//! GET    /testimonials                  - Testimonials
//!
//! # Cart (auth)
//! GET    /cart                          - Current cart
//! DELETE /cart                          - Empty the cart
//! POST   /cart/items                    - Add or increment
//! PATCH  /cart/items/:productId         - Set quantity (<= 0 removes)
//! DELETE /cart/items/:productId         - Remove line
//! POST   /cart/sync                     - Replace quantities from client
//!
//! # Orders (auth)
//! POST   /orders                        - Place an order
//! GET    /orders                        - Own orders
//! GET    /orders/:id                    - One own order
//!
//! # Stripe
//! POST   /stripe/create-checkout-session - Hosted checkout (auth)
//! POST   /stripe/webhook                - Signed payment events
//! GET    /stripe/session/:id            - Session lookup (auth)
//!
//! # Auth (login/register rate limited)
//! POST   /auth/register
//! POST   /auth/login
//! POST   /auth/logout
//! GET    /auth/me
//!
//! # Admin (admin role)
//! GET    /admin/users
//! POST   /admin/users/:id/promote
//! GET    /admin/orders
//! PATCH  /admin/orders/:id/status
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod stripe;
pub mod testimonials;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::set_quantity).delete(cart::remove),
        )
        .route("/sync", post(cart::sync))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create the Stripe routes router.
pub fn stripe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(stripe::create_checkout_session),
        )
        .route("/webhook", post(stripe::webhook))
        .route("/session/{id}", get(stripe::session))
}

/// Create the auth routes router.
///
/// Credential endpoints share a per-client rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(limited)
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::users))
        .route("/users/{id}/promote", post(admin::promote_user))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", patch(admin::update_order_status))
}

/// All API routes, without a prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .route("/testimonials", get(testimonials::index))
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/stripe", stripe_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}

/// Create all routes for the storefront.
///
/// Both prefixes share one router, so the auth limiter counts a client's
/// requests across `/api/auth/*` and `/auth/*` together.
pub fn routes() -> Router<AppState> {
    let api = api_routes();
    Router::new().nest("/api", api.clone()).merge(api)
}
