//! Storefront services that sit between handlers and the hosted database.
//!
//! - `handoff` - WhatsApp order handoff with fire-and-forget click tracking

pub mod handoff;

pub use handoff::{HandoffStarted, OrderHandoff, OrderTracker, whatsapp_url};
