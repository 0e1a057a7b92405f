//! Orders route handler.
//!
//! Orders are the tracking rows written at each WhatsApp handoff; the
//! conversation itself never reaches the server.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use fasatina_core::WhatsappClick;

use crate::{middleware::RequireAdminAuth, state::AppState};

use super::{NavLinks, dashboard::AdminUserView, or_empty};

/// Display format for handoff times (UTC).
const CLICK_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Handoff row for templates.
#[derive(Debug, Clone)]
pub struct ClickView {
    /// Running number, oldest is 1. Zero when not numbered.
    pub number: usize,
    pub items_count: i64,
    pub total: String,
    pub created_at: String,
}

impl From<&WhatsappClick> for ClickView {
    fn from(click: &WhatsappClick) -> Self {
        Self {
            number: 0,
            items_count: click.items_count,
            total: click.total_amount.to_string(),
            created_at: click.created_at.format(CLICK_TIME_FORMAT).to_string(),
        }
    }
}

/// Number newest-first rows so the oldest handoff is #1.
fn numbered(clicks: &[WhatsappClick]) -> Vec<ClickView> {
    let total = clicks.len();
    clicks
        .iter()
        .enumerate()
        .map(|(i, click)| ClickView {
            number: total - i,
            ..ClickView::from(click)
        })
        .collect()
}

/// Orders list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub nav: NavLinks,
    pub clicks: Vec<ClickView>,
}

/// Orders page handler.
///
/// GET /admin/orders
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Html<String> {
    let clicks = or_empty(
        state.supabase().list_clicks(admin.access_token(), None).await,
        "clicks",
    );

    let template = OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin/orders".to_string(),
        nav: NavLinks::new(&state),
        clicks: numbered(&clicks),
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use fasatina_core::{ClickId, Price};

    use super::*;

    fn click(id: &str, items_count: i64, total: &str, minute: u32) -> WhatsappClick {
        WhatsappClick {
            id: ClickId::new(id),
            total_amount: Price::parse(total).unwrap(),
            items_count,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 18, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_numbering_counts_down_from_newest() {
        let rows = vec![click("c3", 1, "75", 30), click("c2", 2, "150", 20), click("c1", 4, "310", 10)];
        let views = numbered(&rows);

        assert_eq!(
            views.iter().map(|v| v.number).collect::<Vec<_>>(),
            vec![3, 2, 1]
        );
        assert_eq!(views[1].items_count, 2);
        assert_eq!(views[1].total, "150 ر.س");
        assert_eq!(views[1].created_at, "2026/03/14 18:20");
    }

    #[test]
    fn test_numbering_empty() {
        assert!(numbered(&[]).is_empty());
    }
}
