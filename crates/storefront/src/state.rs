//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::config::StorefrontConfig;
use crate::middleware::security_headers::content_security_policy;
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// Created once at startup and cheaply cloneable via `Arc`. Per-visitor
/// state (the cart) never lives here; it comes from the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    supabase: SupabaseClient,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the content security policy built from the
    /// configured hosts is not a valid header value.
    pub fn new(config: StorefrontConfig) -> Result<Self, axum::http::header::InvalidHeaderValue> {
        let supabase = SupabaseClient::new(&config.supabase);
        let csp = HeaderValue::from_str(&content_security_policy(
            &config.supabase.url,
            &config.whatsapp.base_url,
        ))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                csp,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the hosted database client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// The `Content-Security-Policy` value for every response.
    #[must_use]
    pub fn csp(&self) -> &HeaderValue {
        &self.inner.csp
    }
}
