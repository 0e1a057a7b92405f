//! WhatsApp order handoff.
//!
//! Turns the visitor's cart into a prefilled chat message for the shop,
//! records one tracking row in the background, and empties the cart. The
//! tracking write is never awaited by the request: a failure is logged and
//! the shopper still gets their link.

use std::fmt::Display;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::instrument;

use fasatina_core::{NewWhatsappClick, format_order_message};

use crate::config::WhatsappConfig;
use crate::middleware::{CartSaveError, SessionCart};
use crate::supabase::{SupabaseClient, SupabaseError};

/// Destination for order-handoff tracking rows.
pub trait OrderTracker: Clone + Send + Sync + 'static {
    type Error: Display + Send;

    /// Store one tracking row.
    fn record(&self, click: &NewWhatsappClick)
    -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl OrderTracker for SupabaseClient {
    type Error = SupabaseError;

    fn record(
        &self,
        click: &NewWhatsappClick,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.record_click(click)
    }
}

/// Build the deep link that opens a chat with `phone` prefilled with `message`.
#[must_use]
pub fn whatsapp_url(base_url: &str, phone: &str, message: &str) -> String {
    format!(
        "{}/{phone}?text={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(message)
    )
}

/// Result of a started handoff.
#[derive(Debug)]
pub struct HandoffStarted {
    /// Deep link to open in a new browser context.
    pub url: String,
    /// The background tracking write. Dropping it does not cancel it.
    pub tracking: JoinHandle<()>,
}

/// Starts order handoffs for a given tracker and target number.
#[derive(Clone)]
pub struct OrderHandoff<T> {
    tracker: T,
    whatsapp: WhatsappConfig,
}

impl<T: OrderTracker> OrderHandoff<T> {
    /// Create a handoff service.
    pub const fn new(tracker: T, whatsapp: WhatsappConfig) -> Self {
        Self { tracker, whatsapp }
    }

    /// Hand the cart off to WhatsApp.
    ///
    /// Returns `None` for an empty cart, in which case nothing is tracked and
    /// the cart is untouched. Otherwise the tracking row is spawned, the cart
    /// is cleared, and the deep link is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the emptied cart cannot be saved.
    #[instrument(skip(self, cart), fields(lines = cart.cart().len()))]
    pub async fn start(
        &self,
        cart: &mut SessionCart,
    ) -> Result<Option<HandoffStarted>, CartSaveError> {
        if cart.cart().is_empty() {
            return Ok(None);
        }

        let total = cart.cart().total_price();
        let message = format_order_message(cart.cart(), total);
        let url = whatsapp_url(&self.whatsapp.base_url, &self.whatsapp.phone, &message);
        let click = NewWhatsappClick::for_cart(cart.cart());

        let tracker = self.tracker.clone();
        let tracking = tokio::spawn(async move {
            if let Err(e) = tracker.record(&click).await {
                tracing::warn!(error = %e, "Failed to record order handoff");
            }
        });

        cart.clear().await?;
        tracing::info!(total = %total, "Order handed off to WhatsApp");

        Ok(Some(HandoffStarted { url, tracking }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use fasatina_core::{CartItem, Price, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::{MemoryStore, Session};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingTracker {
        clicks: Arc<Mutex<Vec<NewWhatsappClick>>>,
    }

    impl OrderTracker for RecordingTracker {
        type Error = String;

        async fn record(&self, click: &NewWhatsappClick) -> Result<(), Self::Error> {
            self.clicks.lock().unwrap().push(click.clone());
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FailingTracker;

    impl OrderTracker for FailingTracker {
        type Error = String;

        async fn record(&self, _click: &NewWhatsappClick) -> Result<(), Self::Error> {
            Err("insert rejected".to_string())
        }
    }

    fn item(id: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("منتج {id}"),
            price: Price::parse(price).unwrap(),
            image_url: String::new(),
            size: String::new(),
            color: String::new(),
            quantity,
        }
    }

    async fn two_line_cart() -> SessionCart {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = SessionCart::load(session).await;
        cart.add(item("p1", "50", 3)).await.unwrap();
        cart.add(item("p2", "20", 1)).await.unwrap();
        cart
    }

    #[test]
    fn test_whatsapp_url_encodes_message() {
        let url = whatsapp_url("https://wa.me/", "967775376507", "طلب 1\nسطر");
        assert!(url.starts_with("https://wa.me/967775376507?text="));
        assert!(url.contains("%0A"));
        assert!(url.contains("%20"));
        assert!(!url.contains(' '));
    }

    #[tokio::test]
    async fn test_handoff_tracks_and_clears() {
        let tracker = RecordingTracker::default();
        let handoff = OrderHandoff::new(tracker.clone(), WhatsappConfig::default());
        let mut cart = two_line_cart().await;

        let started = handoff.start(&mut cart).await.unwrap().unwrap();
        started.tracking.await.unwrap();

        let clicks = tracker.clicks.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].items_count, 2);
        assert_eq!(clicks[0].total_amount, Decimal::from(170));

        assert!(cart.cart().is_empty());
        assert!(started.url.starts_with("https://wa.me/967775376507?text="));
    }

    #[tokio::test]
    async fn test_handoff_clears_even_when_tracking_fails() {
        let handoff = OrderHandoff::new(FailingTracker, WhatsappConfig::default());
        let mut cart = two_line_cart().await;

        let started = handoff.start(&mut cart).await.unwrap().unwrap();
        started.tracking.await.unwrap();

        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_not_handed_off() {
        let tracker = RecordingTracker::default();
        let handoff = OrderHandoff::new(tracker.clone(), WhatsappConfig::default());
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let mut cart = SessionCart::load(session).await;

        assert!(handoff.start(&mut cart).await.unwrap().is_none());
        assert!(tracker.clicks.lock().unwrap().is_empty());
    }
}
