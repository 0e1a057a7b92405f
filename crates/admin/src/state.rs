//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::header::InvalidHeaderValue;

use crate::config::AdminConfig;
use crate::middleware::security_headers::content_security_policy;
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    supabase: SupabaseClient,
    csp: HeaderValue,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the content security policy built from the
    /// project URL is not a valid header value.
    pub fn new(config: AdminConfig) -> Result<Self, InvalidHeaderValue> {
        let supabase = SupabaseClient::new(&config.supabase);
        let csp = HeaderValue::from_str(&content_security_policy(&config.supabase.url))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                csp,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the hosted backend client.
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
