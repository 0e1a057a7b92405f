//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (?q= search)
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check
//!
//! # Catalog
//! GET  /categories             - Products by category (?cat=slug&q=)
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Set line quantity (0 removes)
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty cart
//! POST /cart/checkout          - WhatsApp order handoff
//!
//! # Orders
//! GET  /orders                 - Placeholder
//! ```

pub mod cart;
pub mod categories;
pub mod home;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Fold a catalog fetch failure into an empty list.
///
/// Pages render the same empty state for "nothing there" and "could not
/// load", so failures are only logged.
pub(crate) fn or_empty<T, E: std::fmt::Display>(
    result: std::result::Result<Vec<T>, E>,
    what: &str,
) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch {what}");
        Vec::new()
    })
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/categories", get(categories::index))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/orders", get(orders::index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_empty_swallows_errors() {
        let failed: std::result::Result<Vec<u8>, String> = Err("timeout".to_string());
        assert!(or_empty(failed, "products").is_empty());
        assert_eq!(or_empty(Ok::<_, String>(vec![1, 2]), "products"), vec![1, 2]);
    }
}
