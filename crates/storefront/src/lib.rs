//! Terracotta storefront API.
//!
//! JSON API over `PostgreSQL` for the catalog, server-side carts, orders and
//! Stripe Checkout. The binary in `main.rs` adds tracing, Sentry and the
//! listener; everything else lives here so it can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// CORS policy: the configured frontend origin, with cookies.
fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state.config().frontend_origin();
    let allow_origin = HeaderValue::from_str(&origin).map_or_else(
        |_| {
            tracing::warn!(origin = %origin, "Frontend origin is not a valid header value");
            AllowOrigin::list([])
        },
        AllowOrigin::exact,
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router with its middleware stack.
///
/// Sentry layers are left to the binary so they wrap everything.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state);

    routes::routes()
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Utc;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use url::Url;

    use terracotta_core::{Email, Role, UserId};

    use super::*;
    use crate::config::{StorefrontConfig, StripeConfig};
    use crate::models::User;

    const JWT_SECRET: &str = "k3Vq9xLm2Pz8Rt5Wn7Yb4Hc6Jd1Fg0Sa";

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/terracotta_test".to_string()),
            host: "127.0.0.1".parse().expect("ip"),
            port: 5000,
            frontend_url: Url::parse("http://localhost:5173").expect("url"),
            jwt_secret: SecretString::from(JWT_SECRET.to_string()),
            stripe: StripeConfig {
                secret_key: SecretString::from("sk_test_unused".to_string()),
                webhook_secret: SecretString::from("whsec_router_test".to_string()),
                api_base: Url::parse("http://127.0.0.1:9").expect("url"),
                currency: "usd".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Router over a pool that never connects; only paths that stop before
    /// the database are exercised here.
    fn test_app() -> (Router, AppState) {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/terracotta_test")
            .expect("lazy pool");
        let state = AppState::new(test_config(), pool).expect("state");
        (app(state.clone()), state)
    }

    fn session_cookie(state: &AppState, role: Role) -> String {
        let user = User {
            id: UserId::new(7),
            email: Email::parse("jane@example.com").expect("email"),
            name: "Jane".to_string(),
            role,
            created_at: Utc::now(),
        };
        let token = state.tokens().issue(&user).expect("token");
        format!("token={token}")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn test_health_under_both_prefixes() {
        let (app, _) = test_app();

        for uri in ["/health", "/api/health"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body["status"], "ok");
            assert!(body["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn test_cart_requires_session() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::get("/api/cart").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Authentication required");
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::get("/orders")
                    .header(header::COOKIE, "token=not-a-jwt")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_customer_is_forbidden_from_admin_routes() {
        let (app, state) = test_app();
        let cookie = session_cookie(&state, Role::Customer);

        let requests = [
            Request::get("/api/admin/users")
                .header(header::COOKIE, &cookie)
                .body(Body::empty()),
            Request::get("/admin/orders")
                .header(header::COOKIE, &cookie)
                .body(Body::empty()),
            Request::patch("/api/admin/orders/1/status")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"completed"}"#)),
            Request::post("/api/products")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Vase","price":"10","category":"pots"}"#)),
            Request::delete("/products/3")
                .header(header::COOKIE, &cookie)
                .body(Body::empty()),
        ];

        for request in requests {
            let response = app
                .clone()
                .oneshot(request.expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(json_body(response).await["error"], "Admin access required");
        }
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .header("stripe-signature", "t=1700000000,v1=deadbeef")
                    .body(Body::from(r#"{"id":"evt_1","type":"checkout.session.completed"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(
            body["error"]
                .as_str()
                .is_some_and(|m| m.starts_with("Webhook Error:"))
        );
    }

    #[tokio::test]
    async fn test_webhook_requires_signature_header() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::post("/stripe/webhook")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_json_400() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::post("/api/auth/login")
                    .header("x-forwarded-for", "198.51.100.4")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"email\":"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_auth_limiter_is_shared_across_prefixes() {
        let (app, _) = test_app();

        let login = |uri: &str| {
            Request::post(uri)
                .header("x-forwarded-for", "203.0.113.77")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"email\":"))
                .expect("request")
        };

        for attempt in 0..5 {
            let uri = if attempt % 2 == 0 { "/api/auth/login" } else { "/auth/login" };
            let response = app.clone().oneshot(login(uri)).await.expect("response");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "attempt {attempt}");
        }

        for uri in ["/auth/login", "/api/auth/login"] {
            let response = app.clone().oneshot(login(uri)).await.expect("response");
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
    }

    #[tokio::test]
    async fn test_unreachable_payment_processor_is_a_500() {
        let (app, state) = test_app();
        let cookie = session_cookie(&state, Role::Customer);

        let response = app
            .oneshot(
                Request::post("/api/stripe/create-checkout-session")
                    .header(header::COOKIE, cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"items":[{"name":"Planter","price":"24.50","quantity":2}]}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Payment processor error");
    }

    #[tokio::test]
    async fn test_invalid_session_id_is_rejected_before_stripe() {
        let (app, state) = test_app();
        let cookie = session_cookie(&state, Role::Customer);

        let response = app
            .oneshot(
                Request::get("/api/stripe/session/cs_test%2F..%2Fcustomers")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_response_carries_request_id_and_security_headers() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let headers = response.headers();
        assert_eq!(headers["x-request-id"], "req-123");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend_with_credentials() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::options("/api/cart/items")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }
}
