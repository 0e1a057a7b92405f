//! Integration tests for the storefront cart and order handoff.
//!
//! The in-process tests need nothing running. The live tests require:
//! - The storefront server running (cargo run -p fasatina-storefront)
//! - A reachable backend project with the catalog seeded
//!
//! Run the live tests with: cargo test -p fasatina-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use reqwest::Client;
use rust_decimal::Decimal;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use fasatina_core::{CartItem, LineKey, NewWhatsappClick, Price, ProductId};
use fasatina_integration_tests::{storefront_app, storefront_base_url};
use fasatina_storefront::config::WhatsappConfig;
use fasatina_storefront::middleware::SessionCart;
use fasatina_storefront::services::{OrderHandoff, OrderTracker};

#[derive(Clone, Default)]
struct RecordingTracker {
    clicks: Arc<Mutex<Vec<NewWhatsappClick>>>,
}

impl OrderTracker for RecordingTracker {
    type Error = String;

    async fn record(&self, click: &NewWhatsappClick) -> Result<(), Self::Error> {
        self.clicks.lock().unwrap().push(click.clone());
        Ok(())
    }
}

fn dress(id: &str, price: &str, size: &str, color: &str, quantity: u32) -> CartItem {
    CartItem {
        product_id: ProductId::new(id),
        name: format!("فستان {id}"),
        price: Price::parse(price).unwrap(),
        image_url: String::new(),
        size: size.to_string(),
        color: color.to_string(),
        quantity,
    }
}

fn new_session() -> Session {
    Session::new(None, Arc::new(MemoryStore::default()), None)
}

// ============================================================================
// Session Cart Tests
// ============================================================================

#[tokio::test]
async fn test_cart_merges_lines_across_requests() {
    let session = new_session();

    let mut first = SessionCart::load(session.clone()).await;
    first.add(dress("p1", "50", "M", "red", 1)).await.unwrap();

    // A later request sees the snapshot written by the first one
    let mut second = SessionCart::load(session.clone()).await;
    second.add(dress("p1", "50", "M", "red", 2)).await.unwrap();

    let reloaded = SessionCart::load(session).await;
    assert_eq!(reloaded.cart().len(), 1);
    assert_eq!(reloaded.cart().total_items(), 3);
    assert_eq!(reloaded.cart().total_price().plain(), "150");
}

#[tokio::test]
async fn test_variants_are_separate_lines() {
    let session = new_session();
    let mut cart = SessionCart::load(session.clone()).await;

    cart.add(dress("p1", "50", "M", "red", 1)).await.unwrap();
    cart.add(dress("p1", "50", "L", "red", 1)).await.unwrap();
    cart.add(dress("p1", "50", "M", "black", 1)).await.unwrap();

    let reloaded = SessionCart::load(session).await;
    assert_eq!(reloaded.cart().len(), 3);
    assert_eq!(reloaded.cart().total_price().plain(), "150");
}

#[tokio::test]
async fn test_zero_quantity_removes_line() {
    let session = new_session();
    let mut cart = SessionCart::load(session.clone()).await;
    cart.add(dress("p1", "50", "M", "red", 2)).await.unwrap();
    cart.add(dress("p2", "80", "", "", 1)).await.unwrap();

    cart.set_quantity(&LineKey::new("p1", "M", "red"), 0)
        .await
        .unwrap();

    let reloaded = SessionCart::load(session).await;
    assert_eq!(reloaded.cart().len(), 1);
    assert!(reloaded.cart().get(&LineKey::new("p1", "M", "red")).is_none());
    assert_eq!(reloaded.cart().total_price().plain(), "80");
}

// ============================================================================
// Order Handoff Tests
// ============================================================================

#[tokio::test]
async fn test_handoff_records_lines_and_empties_cart() {
    let session = new_session();
    let mut cart = SessionCart::load(session.clone()).await;
    cart.add(dress("p1", "50", "M", "red", 3)).await.unwrap();
    cart.add(dress("p2", "20", "", "", 1)).await.unwrap();

    let tracker = RecordingTracker::default();
    let handoff = OrderHandoff::new(tracker.clone(), WhatsappConfig::default());

    let started = handoff.start(&mut cart).await.unwrap().unwrap();
    started.tracking.await.unwrap();

    {
        let clicks = tracker.clicks.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        // Distinct lines, not units
        assert_eq!(clicks[0].items_count, 2);
        assert_eq!(clicks[0].total_amount, Decimal::from(170));
    }

    assert!(started.url.contains("?text="));
    assert!(SessionCart::load(session).await.cart().is_empty());
}

#[tokio::test]
async fn test_handoff_refuses_empty_cart() {
    let tracker = RecordingTracker::default();
    let handoff = OrderHandoff::new(tracker.clone(), WhatsappConfig::default());
    let mut cart = SessionCart::load(new_session()).await;

    assert!(handoff.start(&mut cart).await.unwrap().is_none());
    assert!(tracker.clicks.lock().unwrap().is_empty());
}

// ============================================================================
// Router Tests
// ============================================================================

#[tokio::test]
async fn test_empty_cart_page_renders() {
    let response = storefront_app()
        .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("السلة فارغة"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_returns_to_cart() {
    let response = storefront_app()
        .oneshot(
            Request::post("/cart/checkout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/cart");
}

#[tokio::test]
async fn test_add_with_backend_down_returns_to_page() {
    let response = storefront_app()
        .oneshot(
            Request::post("/cart/add")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("product_id=p1&return_to=%2F"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_add_with_backend_down_shows_missing_product_page() {
    let response = storefront_app()
        .oneshot(
            Request::post("/cart/add")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("product_id=p1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("المنتج غير موجود"));
}

// ============================================================================
// Live Server Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and backend project"]
async fn test_storefront_health() {
    let resp = Client::new()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and backend project"]
async fn test_home_page_lists_catalog() {
    let resp = Client::new()
        .get(format!("{}/", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("فساتينا"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and backend project"]
async fn test_cart_survives_between_requests() {
    let client = Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client");
    let base_url = storefront_base_url();

    // First visit creates the session cookie
    let resp = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/cart/clear"))
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);

    let body = client
        .get(format!("{base_url}/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("السلة فارغة"));
}
