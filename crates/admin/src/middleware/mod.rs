//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (stricter CSP, no caching)
//! 5. Session layer (tower-sessions over a bounded moka store)
//! 6. Rate limiting (login form only)
//!
//! The authentication gate is the [`RequireAdminAuth`] extractor: every
//! console handler takes it as its first argument.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, GateState, LOGIN_PATH, RequireAdminAuth, SessionVerifier,
    clear_auth_session, load_auth_session, set_auth_session,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
