//! The shopping cart.
//!
//! A [`Cart`] is a list of [`CartItem`]s where each line is identified by the
//! tuple (product id, size, color). Adding a line that already exists merges
//! the quantities; changing a quantity to zero or below removes the line.
//!
//! The cart itself does no I/O. Callers persist it by writing
//! [`Cart::to_snapshot`] after each mutation and restore it with
//! [`Cart::from_snapshot`], which never fails: a missing or unreadable
//! snapshot is an empty cart.
//!
//! # Example
//!
//! ```rust
//! use fasatina_core::{Cart, CartItem, LineKey, Price, ProductId};
//!
//! let mut cart = Cart::new();
//! let item = CartItem {
//!     product_id: ProductId::new("p1"),
//!     name: "فستان".to_string(),
//!     price: Price::parse("50").unwrap(),
//!     image_url: String::new(),
//!     size: "M".to_string(),
//!     color: "red".to_string(),
//!     quantity: 1,
//! };
//!
//! cart.add(item.clone());
//! cart.add(CartItem { quantity: 2, ..item });
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total_items(), 3);
//! assert_eq!(cart.total_price().plain(), "150");
//!
//! cart.set_quantity(&LineKey::new("p1", "M", "red"), 0);
//! assert!(cart.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Identity of a cart line: the same product in another size or color is a
/// separate line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl LineKey {
    /// Build a key from its parts. Empty size or color is a valid value.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        size: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            size: size.into(),
            color: color.into(),
        }
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product the line refers to.
    pub product_id: ProductId,
    /// Product name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub price: Price,
    /// Primary product image, may be empty.
    #[serde(default)]
    pub image_url: String,
    /// Selected size, empty when the product has no sizes.
    #[serde(default)]
    pub size: String,
    /// Selected color, empty when the product has no colors.
    #[serde(default)]
    pub color: String,
    /// Number of units, always at least 1 inside a [`Cart`].
    pub quantity: u32,
}

impl CartItem {
    /// The identity tuple of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Whether this line has the given identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The cart: an ordered list of lines with unique identity tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a line, merging into an existing line with the same identity.
    ///
    /// Quantities are unbounded; a merge saturates at `u32::MAX` rather than
    /// wrapping. Adding zero units does nothing.
    pub fn add(&mut self, item: CartItem) {
        if item.quantity == 0 {
            return;
        }

        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
    }

    /// Remove the line with the given identity, if any.
    pub fn remove(&mut self, key: &LineKey) {
        self.items.retain(|i| !i.matches(key));
    }

    /// Overwrite the quantity of a line.
    ///
    /// A quantity of zero or below removes the line. Unknown keys are ignored.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) {
        if quantity <= 0 {
            self.remove(key);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(key)) {
            existing.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up a line by identity.
    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartItem> {
        self.items.iter().find(|i| i.matches(key))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Serialize the full item list for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    /// Restore a cart from a stored snapshot.
    ///
    /// Unreadable input yields an empty cart. Lines are re-added one by one,
    /// so a tampered snapshot with duplicate identities or zero quantities
    /// still produces a cart that upholds the invariants.
    #[must_use]
    pub fn from_snapshot(snapshot: &str) -> Self {
        match serde_json::from_str::<Vec<CartItem>>(snapshot) {
            Ok(items) => items.into_iter().fold(Self::new(), |mut cart, item| {
                cart.add(item);
                cart
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unreadable cart snapshot");
                Self::new()
            }
        }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
