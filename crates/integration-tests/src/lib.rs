//! Integration tests for Terracotta.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the storefront against a scratch database
//! cargo run -p terracotta-cli -- migrate
//! cargo run -p terracotta-storefront
//!
//! # Run the ignored, server-backed tests
//! cargo test -p terracotta-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Running server (default: <http://localhost:5000>)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses
//! - `STRIPE_WEBHOOK_SECRET` - Same secret the server verifies with

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

use terracotta_core::{Email, Role};
use terracotta_storefront::db::{self, UserRepository};

/// Password used for every account the tests create.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Base URL for the storefront API, including the `/api` prefix.
#[must_use]
pub fn api_url(path: &str) -> String {
    let base = std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());
    format!("{}/api{path}", base.trim_end_matches('/'))
}

/// Connect to the database the server under test uses.
pub async fn pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL must be set for integration tests");
    db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database")
}

/// Webhook secret shared with the server under test.
#[must_use]
pub fn webhook_secret() -> String {
    std::env::var("STRIPE_WEBHOOK_SECRET").expect("STRIPE_WEBHOOK_SECRET must be set")
}

/// A unique address so reruns never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Build a `Stripe-Signature` header for `payload` signed at `timestamp`.
#[must_use]
pub fn stripe_signature(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

/// A client whose cookie jar holds a fresh customer session.
pub async fn customer_client() -> (Client, String) {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client");
    let email = unique_email("customer");

    let resp = client
        .post(api_url("/auth/register"))
        .json(&json!({ "name": "Test Customer", "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("register request");
    assert_eq!(resp.status(), StatusCode::CREATED);

    (client, email)
}

/// A client logged in as a freshly promoted admin.
///
/// The role is read from the token, so the account logs in again after the
/// promotion.
pub async fn admin_client(pool: &PgPool) -> Client {
    let (client, email) = customer_client().await;

    UserRepository::new(pool)
        .set_role_by_email(&Email::parse(&email).unwrap(), Role::Admin)
        .await
        .expect("promote test admin");

    let resp = client
        .post(api_url("/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), StatusCode::OK);

    client
}

/// Create a product through the admin API and return it.
pub async fn create_product(admin: &Client, price: &str, stock: i32) -> Value {
    let resp = admin
        .post(api_url("/products"))
        .json(&json!({
            "name": format!("Test Pot {}", Uuid::new_v4().simple()),
            "description": "Integration test product",
            "price": price,
            "category": "Pots",
            "stock": stock,
        }))
        .send()
        .await
        .expect("create product request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json::<Value>().await.unwrap()["product"].clone()
}

/// `{productId: quantity}` view of a cart response.
#[must_use]
pub fn quantities(cart: &Value) -> Vec<(i64, i64)> {
    let mut lines: Vec<(i64, i64)> = cart["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|line| {
                    Some((line["product"]["id"].as_i64()?, line["quantity"].as_i64()?))
                })
                .collect()
        })
        .unwrap_or_default();
    lines.sort_unstable();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_helper_matches_server_verification() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let now = chrono::Utc::now().timestamp();
        let header = stripe_signature(payload, "whsec_local", now);

        let secret = SecretString::from("whsec_local".to_string());
        assert!(terracotta_storefront::stripe::verify_signature(payload, &header, &secret).is_ok());

        let other = SecretString::from("whsec_other".to_string());
        assert!(terracotta_storefront::stripe::verify_signature(payload, &header, &other).is_err());
    }

    #[test]
    fn test_quantities_view() {
        let cart = json!({ "items": [
            { "product": { "id": 9 }, "quantity": 2 },
            { "product": { "id": 3 }, "quantity": 6 },
        ]});
        assert_eq!(quantities(&cart), vec![(3, 6), (9, 2)]);
    }
}
