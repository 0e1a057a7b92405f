//! Client for the hosted backend: auth, database, and object storage.
//!
//! Every call carries the project's anon key as `apikey`. Calls made on
//! behalf of a signed-in admin also carry that admin's access token as the
//! bearer, so row-level security decides what the console may write.
//!
//! # Modules
//!
//! - [`auth`] - Password sign-in, token refresh, user lookup, sign-out
//! - [`rest`] - Products, categories, and click-tracking rows
//! - [`storage`] - Product image uploads and public URLs
//!
//! # Example
//!
//! ```rust,ignore
//! use fasatina_admin::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase);
//! let session = client.sign_in_with_password("owner@fasatina.sa", "...").await?;
//! let products = client.list_products(&session.access_token).await?;
//! ```

pub mod auth;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::SupabaseConfig;

pub use rest::{ProductPopularity, TABLE_CLICKS, TABLE_PRODUCTS};
pub use storage::object_name;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A count response carried no usable `Content-Range`.
    #[error("Missing row count in response")]
    MissingCount,
}

impl SupabaseError {
    /// The message reported by the service, if it sent one.
    #[must_use]
    pub fn provider_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the service rejected the caller's credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// Error body shapes used across the REST, auth, and storage endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Pull a human-readable message out of an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            let snippet: String = body.chars().take(200).collect();
            if snippet.is_empty() {
                status.to_string()
            } else {
                snippet
            }
        })
}

/// Client for one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

impl SupabaseClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                anon_key: config.anon_key.expose_secret().to_string(),
                bucket: config.storage_bucket.clone(),
            }),
        }
    }

    /// Start a request against `<project>/<path>`.
    ///
    /// The bearer is the admin's access token when given, else the anon key.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{path}", self.inner.base_url))
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token.unwrap_or(&self.inner.anon_key))
    }

    /// Send a request, turning non-success statuses into [`SupabaseError::Api`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        if status.is_server_error() {
            tracing::error!(status = %status, message = %message, "Supabase returned server error");
        } else {
            tracing::warn!(status = %status, message = %message, "Supabase rejected request");
        }

        Err(SupabaseError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, SupabaseError> {
        let body = self.send(request).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }

    /// Cheap round trip used by the readiness check.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached.
    pub async fn ping(&self) -> Result<(), SupabaseError> {
        let request = self
            .request(Method::GET, "rest/v1/categories", None)
            .query(&[("select", "id"), ("limit", "1")]);
        self.send(request).await.map(|_| ())
    }
}
