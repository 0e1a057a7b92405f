//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use fasatina_core::ProductFilter;

use super::products::{CategoryView, ProductCardView};
use super::or_empty;
use crate::middleware::SessionCart;
use crate::state::AppState;

/// Search box query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Home page template.
///
/// While a search is active the hero and category strip give way to the
/// result grid.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub query: String,
    pub searching: bool,
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryView>,
    /// Where quick-add forms come back to.
    pub return_to: String,
    pub cart_count: u64,
}

/// Display home page.
#[instrument(skip(state, cart))]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    cart: SessionCart,
) -> impl IntoResponse {
    let (products, categories) = tokio::join!(
        state.supabase().list_products(),
        state.supabase().list_categories(),
    );
    let products = or_empty(products, "products");
    let categories = or_empty(categories, "categories");

    let filter = ProductFilter::text(query.q.clone());
    let return_to = if filter.is_searching() {
        format!("/?q={}", urlencoding::encode(&query.q))
    } else {
        "/".to_string()
    };

    HomeTemplate {
        searching: filter.is_searching(),
        products: filter
            .apply(&products)
            .into_iter()
            .map(ProductCardView::from)
            .collect(),
        categories: CategoryView::list(&categories, None),
        query: query.q,
        return_to,
        cart_count: cart.cart().total_items(),
    }
}
