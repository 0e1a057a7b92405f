//! Session-backed cart extractor.
//!
//! [`SessionCart`] loads the visitor's cart from the session snapshot when a
//! handler asks for it, and every mutation through it is followed by an
//! explicit save that rewrites the snapshot. Nothing else reads or writes the
//! `cart` session key.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn clear(mut cart: SessionCart) -> Result<Redirect, AppError> {
//!     cart.clear().await?;
//!     Ok(Redirect::to("/cart"))
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use thiserror::Error;
use tower_sessions::Session;

use fasatina_core::{Cart, CartItem, LineKey};

use crate::models::session_keys;

/// Errors that can occur when writing the cart snapshot.
#[derive(Debug, Error)]
pub enum CartSaveError {
    /// The cart could not be serialized.
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The session store rejected the write.
    #[error("session write failed: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// The visitor's cart, bound to their session.
pub struct SessionCart {
    session: Session,
    cart: Cart,
}

impl SessionCart {
    /// Load the cart stored in the session. Missing or unreadable data is an
    /// empty cart.
    pub async fn load(session: Session) -> Self {
        let snapshot = match session.get::<String>(session_keys::CART).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read cart from session");
                None
            }
        };

        let cart = snapshot
            .as_deref()
            .map(Cart::from_snapshot)
            .unwrap_or_default();

        Self { session, cart }
    }

    /// The current cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add a line, merging with an existing line of the same identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub async fn add(&mut self, item: CartItem) -> Result<(), CartSaveError> {
        self.cart.add(item);
        self.save().await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub async fn remove(&mut self, key: &LineKey) -> Result<(), CartSaveError> {
        self.cart.remove(key);
        self.save().await
    }

    /// Overwrite a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub async fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartSaveError> {
        self.cart.set_quantity(key, quantity);
        self.save().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub async fn clear(&mut self) -> Result<(), CartSaveError> {
        self.cart.clear();
        self.save().await
    }

    /// Rewrite the session snapshot from the in-memory cart.
    async fn save(&self) -> Result<(), CartSaveError> {
        let snapshot = self.cart.to_snapshot()?;
        self.session.insert(session_keys::CART, snapshot).await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session layer is not configured",
        ))?;

        Ok(Self::load(session).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use fasatina_core::{Price, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn item(size: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new("p1"),
            name: "فستان".to_string(),
            price: Price::parse("50").unwrap(),
            image_url: String::new(),
            size: size.to_string(),
            color: "red".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_empty_session_is_empty_cart() {
        let cart = SessionCart::load(session()).await;
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_saved() {
        let session = session();

        let mut cart = SessionCart::load(session.clone()).await;
        cart.add(item("M", 1)).await.unwrap();
        cart.add(item("M", 2)).await.unwrap();
        cart.add(item("L", 1)).await.unwrap();

        let reloaded = SessionCart::load(session.clone()).await;
        assert_eq!(reloaded.cart(), cart.cart());
        assert_eq!(reloaded.cart().len(), 2);
        assert_eq!(reloaded.cart().total_items(), 4);

        let mut cart = reloaded;
        cart.set_quantity(&LineKey::new("p1", "L", "red"), 0)
            .await
            .unwrap();
        let reloaded = SessionCart::load(session).await;
        assert_eq!(reloaded.cart().len(), 1);
        assert_eq!(reloaded.cart().total_price().plain(), "150");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let session = session();
        session
            .insert(session_keys::CART, "{not json".to_string())
            .await
            .unwrap();

        let cart = SessionCart::load(session).await;
        assert!(cart.cart().is_empty());
    }

    #[tokio::test]
    async fn test_clear_persists_empty_list() {
        let session = session();
        let mut cart = SessionCart::load(session.clone()).await;
        cart.add(item("M", 1)).await.unwrap();
        cart.clear().await.unwrap();

        let stored: Option<String> = session.get(session_keys::CART).await.unwrap();
        assert_eq!(stored.as_deref(), Some("[]"));
    }
}
