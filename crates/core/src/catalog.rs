//! Catalog rows and the storefront text filter.
//!
//! Rows mirror the `products` and `categories` tables of the hosted
//! database. Nullable columns are folded into their defaults on the way in
//! so templates never branch on `null` versus empty.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{CategoryId, Price, ProductId};

/// Deserialize a nullable column into `T::default()` when it is `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub old_price: Option<Price>,
    /// Primary image, empty when the product has none.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    /// Full gallery, may be empty for older rows.
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    /// Category slug.
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sizes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub colors: Vec<String>,
    #[serde(default)]
    pub badge: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// How many times the product was added to a cart.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cart_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Images to show on the detail page.
    ///
    /// The gallery when it has entries, otherwise the primary image alone,
    /// otherwise nothing.
    #[must_use]
    pub fn gallery(&self) -> Vec<String> {
        if !self.images.is_empty() {
            return self.images.clone();
        }
        if self.image_url.is_empty() {
            Vec::new()
        } else {
            vec![self.image_url.clone()]
        }
    }

    /// Percentage saved against the prior price, rounded half away from zero.
    ///
    /// `None` when there is no usable prior price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<i64> {
        let old = self.old_price?.amount();
        if old <= Decimal::ZERO {
            return None;
        }

        ((old - self.price.amount()) / old * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    /// Emoji shown next to the name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon: String,
}

/// The storefront product filter.
///
/// The text query is a case-sensitive substring match against name,
/// category, and badge. A blank query matches everything. The optional
/// category restricts results to one slug before the text query applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub query: String,
    pub category: Option<String>,
}

impl ProductFilter {
    /// A filter with only a text query.
    #[must_use]
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
        }
    }

    /// Restrict to a category slug. Empty slugs mean "all".
    #[must_use]
    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        self.category = (!slug.is_empty()).then_some(slug);
        self
    }

    /// Whether the text query is active.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Whether a single product passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(slug) = &self.category
            && product.category != *slug
        {
            return false;
        }

        if !self.is_searching() {
            return true;
        }

        let q = self.query.as_str();
        product.name.contains(q)
            || product.category.contains(q)
            || product.badge.as_deref().is_some_and(|b| b.contains(q))
    }

    /// Filter a product list, keeping order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}
