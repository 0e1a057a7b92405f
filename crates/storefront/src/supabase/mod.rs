//! Read-mostly client for the hosted database's REST interface.
//!
//! The storefront only ever uses the public anon key. It reads the catalog,
//! bumps the add-to-cart counter through an RPC, and inserts one tracking
//! row per order handoff.
//!
//! # Example
//!
//! ```rust,ignore
//! use fasatina_storefront::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase);
//! let products = client.list_products().await?;
//! ```

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use fasatina_core::{Category, NewWhatsappClick, Product, ProductId};

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the hosted database.
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

/// Client for the catalog and tracking tables.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    rest_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        let base = config.url.as_str().trim_end_matches('/');

        Self {
            inner: Arc::new(SupabaseClientInner {
                client: reqwest::Client::new(),
                rest_url: format!("{base}/rest/v1"),
                anon_key: config.anon_key.expose_secret().to_string(),
            }),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{path}", self.inner.rest_url))
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(&self.inner.anon_key)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Supabase returned non-success status"
            );
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(body)
    }

    /// Fetch rows from a table.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, SupabaseError> {
        let body = self
            .send(self.request(reqwest::Method::GET, table).query(query))
            .await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                table,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Supabase rows"
            );
            SupabaseError::Parse(e)
        })
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, SupabaseError> {
        self.select("products", &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    /// A single product, or `None` if no row has the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the row cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, SupabaseError> {
        let filter = format!("eq.{id}");
        let rows: Vec<Product> = self
            .select(
                "products",
                &[("select", "*"), ("id", filter.as_str()), ("limit", "1")],
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    /// All categories, in table order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, SupabaseError> {
        self.select("categories", &[("select", "*")]).await
    }

    /// Bump the product's add-to-cart counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn increment_cart_count(&self, id: &ProductId) -> Result<(), SupabaseError> {
        let request = self
            .request(reqwest::Method::POST, "rpc/increment_cart_count")
            .json(&serde_json::json!({ "product_id": id }));

        self.send(request).await.map(|_| ())
    }

    /// Insert one order-handoff tracking row.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    #[instrument(skip(self), fields(items_count = click.items_count))]
    pub async fn record_click(&self, click: &NewWhatsappClick) -> Result<(), SupabaseError> {
        let request = self
            .request(reqwest::Method::POST, "whatsapp_clicks")
            .header("Prefer", "return=minimal")
            .json(click);

        self.send(request).await.map(|_| ())
    }

    /// Cheap round trip used by the readiness check.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached.
    pub async fn ping(&self) -> Result<(), SupabaseError> {
        let _: Vec<serde_json::Value> = self
            .select("categories", &[("select", "id"), ("limit", "1")])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            error_message(StatusCode::NOT_ACCEPTABLE, body),
            "JSON object requested, multiple (or no) rows returned"
        );
    }

    #[test]
    fn test_error_message_auth_shapes() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Refresh Token Not Found"}"#
            ),
            "Refresh Token Not Found"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_body_or_status() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn test_provider_message() {
        let err = SupabaseError::Api {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.provider_message(), "duplicate key value");
    }
}
