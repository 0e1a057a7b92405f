//! Orders page.
//!
//! Orders are placed in WhatsApp, so there is no history to show yet.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::middleware::SessionCart;

/// Orders placeholder template.
#[derive(Template, WebTemplate)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub cart_count: u64,
}

/// Display the orders placeholder.
pub async fn index(cart: SessionCart) -> impl IntoResponse {
    OrdersTemplate {
        cart_count: cart.cart().total_items(),
    }
}
