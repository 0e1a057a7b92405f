//! Integration tests for Fasatina.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no network)
//! cargo test -p fasatina-integration-tests
//!
//! # Live tests against running servers and a hosted project
//! cargo test -p fasatina-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart and order handoff across the session boundary
//! - `admin_gate` - Authentication gate and login form
//!
//! In-process tests build the real routers with a session layer and an
//! unreachable backend URL, so only paths that never call the backend are
//! exercised there. Everything else is behind `#[ignore]`.

use axum::Router;
use secrecy::SecretString;
use url::Url;

/// Backend URL that nothing listens on.
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin console (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

fn backend_url() -> Url {
    Url::parse(UNREACHABLE_BACKEND).expect("static backend URL is valid")
}

/// Storefront configuration for in-process tests.
#[must_use]
pub fn storefront_config() -> fasatina_storefront::config::StorefrontConfig {
    use fasatina_storefront::config::{StorefrontConfig, SupabaseConfig, WhatsappConfig};

    StorefrontConfig {
        host: "127.0.0.1".parse().expect("static host is valid"),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        supabase: SupabaseConfig {
            url: backend_url(),
            anon_key: SecretString::from("integration_test_anon_key"),
        },
        whatsapp: WhatsappConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Admin configuration for in-process tests.
#[must_use]
pub fn admin_config() -> fasatina_admin::config::AdminConfig {
    use fasatina_admin::config::{AdminConfig, DEFAULT_STORAGE_BUCKET, SupabaseConfig};

    AdminConfig {
        host: "127.0.0.1".parse().expect("static host is valid"),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        storefront_url: "http://localhost:3000".to_string(),
        trust_proxy_headers: false,
        supabase: SupabaseConfig {
            url: backend_url(),
            anon_key: SecretString::from("integration_test_anon_key"),
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The storefront routes with a fresh session store.
#[must_use]
pub fn storefront_app() -> Router {
    use fasatina_storefront::{middleware::create_session_layer, routes, state::AppState};

    let config = storefront_config();
    let session_layer = create_session_layer(&config);
    let state = AppState::new(config).expect("test CSP is a valid header");

    routes::routes().layer(session_layer).with_state(state)
}

/// The admin routes with a fresh session store.
#[must_use]
pub fn admin_app() -> Router {
    use fasatina_admin::{middleware::create_session_layer, routes, state::AppState};

    let config = admin_config();
    let session_layer = create_session_layer(&config);
    let router = routes::routes(&config);
    let state = AppState::new(config).expect("test CSP is a valid header");

    router.layer(session_layer).with_state(state)
}
