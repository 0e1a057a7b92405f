//! Session-stored data for storefront visitors.

pub mod session;

pub use session::keys as session_keys;
