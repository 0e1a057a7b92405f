//! Category browsing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use fasatina_core::ProductFilter;

use super::or_empty;
use super::products::{CategoryView, ProductCardView};
use crate::middleware::SessionCart;
use crate::state::AppState;

/// Category tab and search box.
#[derive(Debug, Default, Deserialize)]
pub struct CategoriesQuery {
    /// Category slug; absent or empty shows every category.
    #[serde(default)]
    pub cat: String,
    #[serde(default)]
    pub q: String,
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub active: String,
    pub query: String,
    pub categories: Vec<CategoryView>,
    pub products: Vec<ProductCardView>,
    /// Where quick-add forms come back to.
    pub return_to: String,
    pub cart_count: u64,
}

/// Display products, optionally narrowed to one category.
#[instrument(skip(state, cart))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
    cart: SessionCart,
) -> impl IntoResponse {
    let (products, categories) = tokio::join!(
        state.supabase().list_products(),
        state.supabase().list_categories(),
    );
    let products = or_empty(products, "products");
    let categories = or_empty(categories, "categories");

    let filter = ProductFilter::text(query.q.clone()).in_category(query.cat.clone());
    let return_to = format!(
        "/categories?cat={}&q={}",
        urlencoding::encode(&query.cat),
        urlencoding::encode(&query.q)
    );

    CategoriesTemplate {
        categories: CategoryView::list(&categories, filter.category.as_deref()),
        products: filter
            .apply(&products)
            .into_iter()
            .map(ProductCardView::from)
            .collect(),
        active: query.cat,
        query: query.q,
        return_to,
        cart_count: cart.cart().total_items(),
    }
}
