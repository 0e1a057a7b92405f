//! Cart route handlers.
//!
//! The cart lives in the visitor's session; every form here mutates it
//! through [`SessionCart`] and redirects back so a reload never resubmits.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use fasatina_core::{Cart, CartItem, LineKey, Product, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::SessionCart;
use crate::routes::products::ProductNotFoundTemplate;
use crate::services::OrderHandoff;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    /// Quantity submitted by the "+" button.
    pub increment: u64,
    /// Quantity submitted by the "-" button; zero removes the line.
    pub decrement: i64,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image_url: item.image_url.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            increment: u64::from(item.quantity) + 1,
            decrement: i64::from(item.quantity) - 1,
            unit_price: item.price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u64,
    pub total_price: String,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price().to_string(),
        }
    }
}

/// Add to cart form data.
///
/// Sent by the detail page with explicit options, and by grid cards with
/// only the product id.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Local path to return to afterwards.
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Identifies one cart line.
#[derive(Debug, Deserialize)]
pub struct LineForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
}

impl LineForm {
    fn key(&self) -> LineKey {
        LineKey::new(self.product_id.as_str(), self.size.as_str(), self.color.as_str())
    }
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub quantity: i64,
}

impl UpdateCartForm {
    fn key(&self) -> LineKey {
        LineKey::new(self.product_id.as_str(), self.size.as_str(), self.color.as_str())
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub cart_count: u64,
}

/// Pick the submitted option when the product offers it, else the first one.
fn choose_option(submitted: Option<&str>, options: &[String]) -> String {
    submitted
        .filter(|s| options.iter().any(|o| o == s))
        .map(String::from)
        .or_else(|| options.first().cloned())
        .unwrap_or_default()
}

/// Only same-site paths are followed after a form post.
fn safe_return_path(return_to: Option<&str>) -> Option<&str> {
    return_to.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
}

/// Build the cart line for a product from the submitted options.
fn line_for(product: &Product, form: &AddToCartForm) -> CartItem {
    CartItem {
        product_id: product.id.clone(),
        name: product.name.clone(),
        price: product.price,
        image_url: product.image_url.clone(),
        size: choose_option(form.size.as_deref(), &product.sizes),
        color: choose_option(form.color.as_deref(), &product.colors),
        quantity: form.quantity.unwrap_or(1).max(1),
    }
}

/// Bump the product's add-to-cart counter without holding up the response.
fn spawn_cart_count(state: &AppState, id: ProductId) {
    let client = state.supabase().clone();
    tokio::spawn(async move {
        if let Err(e) = client.increment_cart_count(&id).await {
            tracing::debug!(product_id = %id, error = %e, "Failed to bump cart count");
        }
    });
}

/// Display cart page.
#[instrument(skip(cart))]
pub async fn show(cart: SessionCart) -> impl IntoResponse {
    CartShowTemplate {
        cart: CartView::from(cart.cart()),
        cart_count: cart.cart().total_items(),
    }
}

/// Where a failed add goes: back to the submitting page, else the missing
/// product page.
fn unavailable_product(form: &AddToCartForm, cart: &SessionCart) -> Response {
    match safe_return_path(form.return_to.as_deref()) {
        Some(target) => Redirect::to(target).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            ProductNotFoundTemplate {
                cart_count: cart.cart().total_items(),
            },
        )
            .into_response(),
    }
}

/// Add item to cart.
///
/// Name, price, and image come from the product row, never from the form.
/// A lookup failure leaves the cart untouched.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: SessionCart,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id.trim());
    let product = match state.supabase().get_product(&id).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            tracing::warn!(product_id = %id, "Add to cart for unknown product");
            return Ok(unavailable_product(&form, &cart));
        }
        Err(e) => {
            tracing::warn!(product_id = %id, error = %e, "Failed to fetch product for cart");
            return Ok(unavailable_product(&form, &cart));
        }
    };

    let item = line_for(&product, &form);
    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", id.as_str()),
            ("size", item.size.as_str()),
            ("color", item.color.as_str()),
        ],
    );
    cart.add(item).await?;
    spawn_cart_count(&state, id.clone());

    let target = safe_return_path(form.return_to.as_deref())
        .map_or_else(|| format!("/products/{id}?added=1"), String::from);
    Ok(Redirect::to(&target).into_response())
}

/// Update cart line quantity.
#[instrument(skip(cart))]
pub async fn update(mut cart: SessionCart, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    cart.set_quantity(&form.key(), form.quantity).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a cart line.
#[instrument(skip(cart))]
pub async fn remove(mut cart: SessionCart, Form(form): Form<LineForm>) -> Result<Redirect> {
    cart.remove(&form.key()).await?;
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(mut cart: SessionCart) -> Result<Redirect> {
    cart.clear().await?;
    Ok(Redirect::to("/cart"))
}

/// Hand the order off to WhatsApp.
///
/// The form opens in a new browser context, which this redirects to the
/// deep link. An empty cart goes back to the cart page.
#[instrument(skip(state, cart))]
pub async fn checkout(State(state): State<AppState>, mut cart: SessionCart) -> Result<Redirect> {
    let handoff = OrderHandoff::new(state.supabase().clone(), state.config().whatsapp.clone());

    match handoff.start(&mut cart).await? {
        Some(started) => Ok(Redirect::to(&started.url)),
        None => Ok(Redirect::to("/cart")),
    }
}
