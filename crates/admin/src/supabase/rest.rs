//! Database operations behind the console screens.
//!
//! All of these run with the signed-in admin's access token.

use reqwest::Method;
use reqwest::header::CONTENT_RANGE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::instrument;

use fasatina_core::{Category, Product, ProductId, WhatsappClick};

use super::{SupabaseClient, SupabaseError};
use crate::models::ProductDraft;

/// Products table.
pub const TABLE_PRODUCTS: &str = "products";

/// Order handoff tracking table.
pub const TABLE_CLICKS: &str = "whatsapp_clicks";

const TABLE_CATEGORIES: &str = "categories";

/// A product's add-to-cart tally, for the dashboard leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductPopularity {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cart_count: i64,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Total row count from a `Content-Range` value such as `0-24/310` or `*/0`.
fn parse_total(content_range: &str) -> Option<u64> {
    content_range.rsplit_once('/')?.1.trim().parse().ok()
}

impl SupabaseClient {
    fn table(&self, method: Method, table: &str, token: &str) -> reqwest::RequestBuilder {
        self.request(method, &format!("rest/v1/{table}"), Some(token))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        token: &str,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, SupabaseError> {
        self.send_json(self.table(Method::GET, table, token).query(query))
            .await
    }

    /// Exact number of rows in a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the count header is missing.
    #[instrument(skip(self, token))]
    pub async fn count(&self, token: &str, table: &str) -> Result<u64, SupabaseError> {
        let request = self
            .table(Method::HEAD, table, token)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");

        let response = self.send(request).await?;
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_total)
            .ok_or(SupabaseError::MissingCount)
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self, token))]
    pub async fn list_products(&self, token: &str) -> Result<Vec<Product>, SupabaseError> {
        self.select(
            token,
            TABLE_PRODUCTS,
            &[("select", "*"), ("order", "created_at.desc")],
        )
        .await
    }

    /// A single product, or `None` if no row has the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the row cannot be parsed.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: &str,
        id: &ProductId,
    ) -> Result<Option<Product>, SupabaseError> {
        let filter = format!("eq.{id}");
        let rows: Vec<Product> = self
            .select(
                token,
                TABLE_PRODUCTS,
                &[("select", "*"), ("id", filter.as_str()), ("limit", "1")],
            )
            .await?;

        Ok(rows.into_iter().next())
    }

    /// The most-added products, highest count first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self, token))]
    pub async fn top_products(
        &self,
        token: &str,
        limit: usize,
    ) -> Result<Vec<ProductPopularity>, SupabaseError> {
        let limit = limit.to_string();
        self.select(
            token,
            TABLE_PRODUCTS,
            &[
                ("select", "id,name,cart_count"),
                ("order", "cart_count.desc"),
                ("limit", limit.as_str()),
            ],
        )
        .await
    }

    /// All categories, in table order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self, token))]
    pub async fn list_categories(&self, token: &str) -> Result<Vec<Category>, SupabaseError> {
        self.select(token, TABLE_CATEGORIES, &[("select", "*")]).await
    }

    /// Order handoff records, newest first, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows cannot be parsed.
    #[instrument(skip(self, token))]
    pub async fn list_clicks(
        &self,
        token: &str,
        limit: Option<usize>,
    ) -> Result<Vec<WhatsappClick>, SupabaseError> {
        let limit = limit.map(|n| n.to_string());
        let mut query = vec![("select", "*"), ("order", "created_at.desc")];
        if let Some(limit) = limit.as_deref() {
            query.push(("limit", limit));
        }

        self.select(token, TABLE_CLICKS, &query).await
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the insert is rejected.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn insert_product(
        &self,
        token: &str,
        draft: &ProductDraft,
    ) -> Result<(), SupabaseError> {
        let request = self
            .table(Method::POST, TABLE_PRODUCTS, token)
            .header("Prefer", "return=minimal")
            .json(draft);

        self.send(request).await.map(|_| ())
    }

    /// Overwrite a product's editable columns.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the update is rejected.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &str,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), SupabaseError> {
        let filter = format!("eq.{id}");
        let request = self
            .table(Method::PATCH, TABLE_PRODUCTS, token)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(draft);

        self.send(request).await.map(|_| ())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the delete is rejected.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &str, id: &ProductId) -> Result<(), SupabaseError> {
        let filter = format!("eq.{id}");
        let request = self
            .table(Method::DELETE, TABLE_PRODUCTS, token)
            .query(&[("id", filter.as_str())]);

        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total() {
        assert_eq!(parse_total("0-24/310"), Some(310));
        assert_eq!(parse_total("*/0"), Some(0));
        assert_eq!(parse_total("0-24/*"), None);
        assert_eq!(parse_total("garbage"), None);
    }

    #[test]
    fn test_popularity_row() {
        let rows: Vec<ProductPopularity> = serde_json::from_str(
            r#"[{"id":"p1","name":"فستان","cart_count":12},{"id":"p2","name":"طقم","cart_count":null}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].cart_count, 12);
        assert_eq!(rows[1].cart_count, 0);
    }
}
