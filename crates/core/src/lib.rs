//! Fasatina Core - Shared types and cart logic.
//!
//! This crate provides the types used across all Fasatina components:
//! - `storefront` - Public catalog, cart, and WhatsApp order handoff
//! - `admin` - Product management and click analytics (login required)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no session access. Persistence of the cart is done by thin
//! adapters in the binaries around [`cart::Cart`].
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - The cart store: line items merged by identity tuple
//! - [`catalog`] - Product and category rows plus the text filter
//! - [`order`] - Order summary text and click-tracking rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod types;

pub use cart::{Cart, CartItem, LineKey};
pub use catalog::{Category, Product, ProductFilter};
pub use order::{NewWhatsappClick, WhatsappClick, format_order_message};
pub use types::*;
