//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, isolation)
//! 5. Session layer (tower-sessions over a bounded moka store)
//!
//! [`SessionCart`] is an extractor rather than a layer: handlers that need
//! the cart ask for it.

pub mod cart;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use cart::{CartSaveError, SessionCart};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
