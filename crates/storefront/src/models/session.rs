//! Session keys.
//!
//! Visitors are anonymous; the session only carries their cart.

/// Session keys for visitor data.
pub mod keys {
    /// Key for the JSON snapshot of the visitor's cart.
    pub const CART: &str = "cart";
}
