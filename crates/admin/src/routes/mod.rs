//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//! GET  /health/ready                - Readiness check
//!
//! # Auth (not gated)
//! GET  /admin/login                 - Login page
//! POST /admin/login                 - Email/password sign-in (rate limited)
//! POST /admin/logout                - Sign out
//!
//! # Dashboard
//! GET  /admin                       - Click and product stats
//!
//! # Products
//! GET  /admin/products              - Product listing
//! GET  /admin/products/new          - New product form
//! POST /admin/products/new          - Create product (multipart)
//! GET  /admin/products/{id}/edit    - Edit form
//! POST /admin/products/{id}/edit    - Update product (multipart)
//! POST /admin/products/{id}/delete  - Delete product
//!
//! # Orders
//! GET  /admin/orders                - WhatsApp handoff records
//! ```

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::config::AdminConfig;
use crate::state::AppState;

/// Links rendered by the bottom navigation.
#[derive(Debug, Clone)]
pub struct NavLinks {
    pub storefront_url: String,
}

impl NavLinks {
    /// Links for the configured deployment.
    #[must_use]
    pub fn new(state: &AppState) -> Self {
        Self {
            storefront_url: state.config().storefront_url.clone(),
        }
    }
}

/// Fold a list fetch failure into an empty list.
///
/// Console pages show the empty state when a list cannot be loaded, so
/// failures are only logged.
pub(crate) fn or_empty<T, E: std::fmt::Display>(
    result: std::result::Result<Vec<T>, E>,
    what: &str,
) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch {what}");
        Vec::new()
    })
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/new", get(products::new_form).post(products::create))
        .route("/{id}/edit", get(products::edit_form).post(products::update))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(products::MAX_FORM_BYTES))
}

/// Create all routes for the admin console.
pub fn routes(config: &AdminConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin") }))
        .route("/admin", get(dashboard::dashboard))
        .merge(auth::router(config.trust_proxy_headers))
        .nest(products::PRODUCTS_PATH, product_routes())
        .route("/admin/orders", get(orders::index))
}
