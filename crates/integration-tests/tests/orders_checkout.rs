//! Orders, price snapshots and the Stripe webhook against a running
//! storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The storefront server running against it
//! - `STRIPE_WEBHOOK_SECRET` matching the server's
//!
//! Run with: cargo test -p terracotta-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use terracotta_integration_tests::{
    admin_client, api_url, create_product, customer_client, pool, stripe_signature,
    webhook_secret,
};

async fn place_order(client: &Client, product_id: &Value, quantity: i64) -> Value {
    let resp = client
        .post(api_url("/orders"))
        .json(&json!({
            "items": [{ "productId": product_id, "quantity": quantity }],
            "shippingAddress": { "line1": "1 Kiln Lane", "city": "Portland" },
            "total": "0.01",
        }))
        .send()
        .await
        .expect("create order request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json::<Value>().await.expect("order json")["order"].clone()
}

async fn fetch_order(client: &Client, id: &Value) -> Value {
    let resp = client
        .get(api_url(&format!("/orders/{id}")))
        .send()
        .await
        .expect("get order request");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json::<Value>().await.expect("order json")["order"].clone()
}

fn completed_event(order_id: &Value, payment_intent: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{payment_intent}"),
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": format!("cs_test_{payment_intent}"),
            "object": "checkout.session",
            "payment_intent": payment_intent,
            "metadata": { "orderId": order_id.to_string(), "userId": "1" },
        }},
    }))
    .expect("serialize event")
}

async fn deliver(payload: &[u8], signature: &str) -> StatusCode {
    Client::new()
        .post(api_url("/stripe/webhook"))
        .header("stripe-signature", signature)
        .header("content-type", "application/json")
        .body(payload.to_vec())
        .send()
        .await
        .expect("webhook request")
        .status()
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_order_total_is_server_computed_and_prices_are_snapshotted() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let product = create_product(&admin, "20.00", 10).await;
    let (client, _) = customer_client().await;

    let order = place_order(&client, &product["id"], 2).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], "40.00");
    assert_eq!(order["items"][0]["price"], "20.00");

    let resp = admin
        .patch(api_url(&format!("/products/{}", product["id"])))
        .json(&json!({ "price": "35.00" }))
        .send()
        .await
        .expect("update product request");
    assert_eq!(resp.status(), StatusCode::OK);

    let order = fetch_order(&client, &order["id"]).await;
    assert_eq!(order["items"][0]["price"], "20.00");
    assert_eq!(order["total"], "40.00");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_other_users_order_is_not_found() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let product = create_product(&admin, "8.00", 10).await;
    let (owner, _) = customer_client().await;
    let (stranger, _) = customer_client().await;

    let order = place_order(&owner, &product["id"], 1).await;

    let resp = stranger
        .get(api_url(&format!("/orders/{}", order["id"])))
        .send()
        .await
        .expect("get order request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_signed_webhook_marks_order_processing_and_redelivery_is_stable() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let product = create_product(&admin, "15.00", 10).await;
    let (client, _) = customer_client().await;
    let order = place_order(&client, &product["id"], 1).await;

    let payload = completed_event(&order["id"], "pi_it_paid");
    let now = chrono::Utc::now().timestamp();
    let signature = stripe_signature(&payload, &webhook_secret(), now);

    assert_eq!(deliver(&payload, &signature).await, StatusCode::OK);
    let first = fetch_order(&client, &order["id"]).await;
    assert_eq!(first["status"], "processing");
    assert_eq!(first["paymentIntent"], "pi_it_paid");

    assert_eq!(deliver(&payload, &signature).await, StatusCode::OK);
    let second = fetch_order(&client, &order["id"]).await;
    assert_eq!(second["status"], first["status"]);
    assert_eq!(second["paymentIntent"], first["paymentIntent"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_badly_signed_webhook_changes_nothing() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let product = create_product(&admin, "15.00", 10).await;
    let (client, _) = customer_client().await;
    let order = place_order(&client, &product["id"], 1).await;

    let payload = completed_event(&order["id"], "pi_it_forged");
    let now = chrono::Utc::now().timestamp();
    let signature = stripe_signature(&payload, "whsec_not_the_server_secret", now);

    assert_eq!(deliver(&payload, &signature).await, StatusCode::BAD_REQUEST);
    let order = fetch_order(&client, &order["id"]).await;
    assert_eq!(order["status"], "pending");
    assert!(order["paymentIntent"].is_null());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_webhook_for_unknown_order_is_acknowledged() {
    let payload = completed_event(&json!(2_000_000_000), "pi_it_unknown");
    let now = chrono::Utc::now().timestamp();
    let signature = stripe_signature(&payload, &webhook_secret(), now);

    assert_eq!(deliver(&payload, &signature).await, StatusCode::OK);
}
