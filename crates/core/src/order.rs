//! Order summary text and click-tracking rows.
//!
//! Orders are not stored by the shop. Checkout formats the cart into a chat
//! message for the shop's WhatsApp number and records one
//! `whatsapp_clicks` row for analytics.

use core::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{ClickId, Price};

/// A recorded order handoff, as read back by the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsappClick {
    pub id: ClickId,
    pub total_amount: Price,
    pub items_count: i64,
    pub created_at: DateTime<Utc>,
}

/// The row written for each order handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWhatsappClick {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Number of distinct lines in the cart, not the unit count.
    pub items_count: i64,
}

impl NewWhatsappClick {
    /// Tracking row for the given cart.
    #[must_use]
    pub fn for_cart(cart: &Cart) -> Self {
        Self {
            total_amount: cart.total_price().amount(),
            items_count: i64::try_from(cart.len()).unwrap_or(i64::MAX),
        }
    }
}

/// Format the cart as the order message sent over WhatsApp.
///
/// One numbered line per item with size and color only when chosen,
/// followed by the grand total.
#[must_use]
pub fn format_order_message(cart: &Cart, total: Price) -> String {
    let mut message = String::from("🛍️ طلب جديد من متجر فساتينا السعودية\n\n");
    message.push_str("📦 المنتجات:\n");

    for (index, item) in cart.items().iter().enumerate() {
        let _ = write!(message, "{}. {}", index + 1, item.name);
        if !item.size.is_empty() {
            let _ = write!(message, " - المقاس: {}", item.size);
        }
        if !item.color.is_empty() {
            let _ = write!(message, " - اللون: {}", item.color);
        }
        let _ = write!(message, " - الكمية: {}", item.quantity);
        let _ = writeln!(message, " - السعر: {}", item.line_total());
    }

    let _ = write!(message, "\n💰 الإجمالي: {total}");
    message.push_str("\n📍 التوصيل: يحدد لاحقاً");
    message.push_str("\n\nشكراً لتسوقكم معنا! 🌸");

    message
}
