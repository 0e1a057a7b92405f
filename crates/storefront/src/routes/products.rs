//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use fasatina_core::{Category, Product, ProductId};

use crate::middleware::SessionCart;
use crate::state::AppState;

/// Product card data for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image_url: String,
    pub badge: Option<String>,
    pub price: String,
    pub old_price: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            badge: product.badge.clone(),
            price: product.price.to_string(),
            old_price: product.old_price.map(|p| p.to_string()),
        }
    }
}

/// Category chip data.
#[derive(Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub active: bool,
}

impl CategoryView {
    /// Build chips, marking the one matching `active`.
    #[must_use]
    pub fn list(categories: &[Category], active: Option<&str>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                name: c.name.clone(),
                slug: c.slug.clone(),
                icon: c.icon.clone(),
                active: active == Some(c.slug.as_str()),
            })
            .collect()
    }
}

/// One selectable size or color.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionChoice {
    pub value: String,
    /// Preselected; the first option of each list.
    pub checked: bool,
}

impl OptionChoice {
    fn list(values: &[String]) -> Vec<Self> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Self {
                value: v.clone(),
                checked: i == 0,
            })
            .collect()
    }
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub old_price: Option<String>,
    pub discount_percent: Option<i64>,
    pub gallery: Vec<String>,
    pub sizes: Vec<OptionChoice>,
    pub colors: Vec<OptionChoice>,
    pub badge: Option<String>,
    pub material: Option<String>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            old_price: product.old_price.map(|p| p.to_string()),
            discount_percent: product.discount_percent().filter(|d| *d > 0),
            gallery: product.gallery(),
            sizes: OptionChoice::list(&product.sizes),
            colors: OptionChoice::list(&product.colors),
            badge: product.badge.clone(),
            material: product.material.clone(),
        }
    }
}

/// Query flags for the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    #[serde(default)]
    pub added: Option<u8>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub added: bool,
    pub cart_count: u64,
}

/// Shown when the id matches no product.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub cart_count: u64,
}

/// Display product detail page.
///
/// Lookup failures render the same page as a missing product.
#[instrument(skip(state, cart))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ShowQuery>,
    cart: SessionCart,
) -> Response {
    let cart_count = cart.cart().total_items();
    let id = ProductId::new(id);

    let product = match state.supabase().get_product(&id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(product_id = %id, error = %e, "Failed to fetch product");
            None
        }
    };

    let Some(product) = product else {
        return (
            StatusCode::NOT_FOUND,
            ProductNotFoundTemplate { cart_count },
        )
            .into_response();
    };

    ProductShowTemplate {
        product: ProductDetailView::from(&product),
        added: query.added.is_some(),
        cart_count,
    }
    .into_response()
}
