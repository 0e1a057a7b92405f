//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::{
    middleware::RequireAdminAuth,
    models::CurrentAdmin,
    state::AppState,
    supabase::{ProductPopularity, TABLE_CLICKS, TABLE_PRODUCTS},
};

use super::{NavLinks, or_empty, orders::ClickView};

/// Leaderboard size.
const TOP_PRODUCTS: usize = 3;

/// Recent handoffs shown.
const RECENT_CLICKS: usize = 5;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub email: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            email: admin.email.clone(),
        }
    }
}

/// Leaderboard row.
#[derive(Debug, Clone)]
pub struct TopProductView {
    pub rank: usize,
    pub rank_class: &'static str,
    pub name: String,
    pub cart_count: i64,
}

impl TopProductView {
    fn new(index: usize, product: &ProductPopularity) -> Self {
        let rank_class = match index {
            0 => "rank-gold",
            1 => "rank-silver",
            _ => "rank-bronze",
        };

        Self {
            rank: index + 1,
            rank_class,
            name: product.name.clone(),
            cart_count: product.cart_count,
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub nav: NavLinks,
    pub total_clicks: u64,
    pub total_products: u64,
    pub top_products: Vec<TopProductView>,
    pub recent_clicks: Vec<ClickView>,
}

fn or_zero<E: std::fmt::Display>(result: Result<u64, E>, what: &str) -> u64 {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to count {what}");
        0
    })
}

/// Dashboard page handler.
///
/// GET /admin
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Html<String> {
    let supabase = state.supabase();
    let token = admin.access_token();

    let (clicks_result, products_result, top_result, recent_result) = tokio::join!(
        supabase.count(token, TABLE_CLICKS),
        supabase.count(token, TABLE_PRODUCTS),
        supabase.top_products(token, TOP_PRODUCTS),
        supabase.list_clicks(token, Some(RECENT_CLICKS)),
    );

    let top_products = or_empty(top_result, "top products")
        .iter()
        .enumerate()
        .map(|(i, p)| TopProductView::new(i, p))
        .collect();
    let recent_clicks = or_empty(recent_result, "recent clicks")
        .iter()
        .map(ClickView::from)
        .collect();

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin".to_string(),
        nav: NavLinks::new(&state),
        total_clicks: or_zero(clicks_result, "clicks"),
        total_products: or_zero(products_result, "products"),
        top_products,
        recent_clicks,
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}
