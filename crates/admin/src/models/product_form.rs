//! Product create/edit form.
//!
//! The form arrives as multipart: text fields, zero or more image files,
//! the gallery URLs the admin kept, and which image should be the primary
//! one. Parsing and validation here are pure; uploading is the route's job.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use fasatina_core::{Price, PriceError, Product};

/// Sizes offered by the form, in display order.
pub const ALL_SIZES: [&str; 10] = [
    "0-3M", "3-6M", "6-12M", "1-2Y", "2-3Y", "3-4Y", "4-5Y", "5-6Y", "6-7Y", "7-8Y",
];

/// `default_image` value prefix selecting a new upload by position.
pub const NEW_UPLOAD_PREFIX: &str = "new:";

/// Validation failures, worded for the error banner.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductFormError {
    #[error("يرجى إدخال اسم المنتج والسعر")]
    MissingRequired,
    #[error("السعر غير صالح")]
    InvalidPrice(#[source] PriceError),
}

/// Raw form fields, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFormInput {
    pub name: String,
    pub description: String,
    pub price: String,
    pub old_price: String,
    pub category: String,
    pub sizes: Vec<String>,
    /// Comma separated; Arabic commas are accepted too.
    pub colors: String,
    pub badge: String,
    pub material: String,
    /// Existing gallery URLs left checked on the edit form.
    pub keep_images: Vec<String>,
    /// An existing URL, `new:<n>` for the n-th uploaded file, or empty.
    pub default_image: String,
}

impl ProductFormInput {
    /// Record one text field by its form name. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "price" => self.price = value,
            "old_price" => self.old_price = value,
            "category" => self.category = value,
            "sizes" => self.sizes.push(value),
            "colors" => self.colors = value,
            "badge" => self.badge = value,
            "material" => self.material = value,
            "keep_images" => self.keep_images.push(value),
            "default_image" => self.default_image = value,
            _ => {}
        }
    }

    /// Validate and normalize the text fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or price is missing or a price is not a
    /// non-negative number.
    pub fn validate(&self) -> Result<ValidProduct, ProductFormError> {
        let name = self.name.trim();
        if name.is_empty() || self.price.trim().is_empty() {
            return Err(ProductFormError::MissingRequired);
        }

        let price = Price::parse(&self.price).map_err(ProductFormError::InvalidPrice)?;
        let old_price = if self.old_price.trim().is_empty() {
            None
        } else {
            Some(Price::parse(&self.old_price).map_err(ProductFormError::InvalidPrice)?)
        };

        Ok(ValidProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            old_price,
            category: self.category.trim().to_string(),
            sizes: normalize_sizes(&self.sizes),
            colors: parse_colors(&self.colors),
            badge: non_empty(&self.badge),
            material: non_empty(&self.material),
        })
    }

    /// Which image the admin picked as primary.
    #[must_use]
    pub fn default_choice(&self) -> DefaultImage {
        let value = self.default_image.trim();
        if value.is_empty() {
            return DefaultImage::Unset;
        }
        match value.strip_prefix(NEW_UPLOAD_PREFIX) {
            Some(index) => index
                .parse()
                .map_or(DefaultImage::Unset, DefaultImage::NewUpload),
            None => DefaultImage::Existing(value.to_string()),
        }
    }
}

impl From<&Product> for ProductFormInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.plain(),
            old_price: product.old_price.map(|p| p.plain()).unwrap_or_default(),
            category: product.category.clone(),
            sizes: product.sizes.clone(),
            colors: product.colors.join("، "),
            badge: product.badge.clone().unwrap_or_default(),
            material: product.material.clone().unwrap_or_default(),
            keep_images: product.gallery(),
            default_image: product.image_url.clone(),
        }
    }
}

/// Form fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub category: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub badge: Option<String>,
    pub material: Option<String>,
}

/// The admin's choice of primary image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultImage {
    /// A gallery URL that was already stored.
    Existing(String),
    /// The n-th file uploaded with this submission.
    NewUpload(usize),
    Unset,
}

/// Gallery for one save: kept URLs first, then this submission's uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    pub kept: Vec<String>,
    /// Public URL per uploaded file, `None` where the upload failed.
    pub uploaded: Vec<Option<String>>,
}

impl ImageSet {
    /// Every stored image URL, failed uploads skipped.
    #[must_use]
    pub fn gallery(&self) -> Vec<String> {
        self.kept
            .iter()
            .cloned()
            .chain(self.uploaded.iter().flatten().cloned())
            .collect()
    }

    /// The primary image: the chosen one when it exists, else the first,
    /// else empty.
    #[must_use]
    pub fn primary(&self, choice: &DefaultImage) -> String {
        let chosen = match choice {
            DefaultImage::Existing(url) => self.kept.iter().find(|k| *k == url).cloned(),
            DefaultImage::NewUpload(index) => self.uploaded.get(*index).cloned().flatten(),
            DefaultImage::Unset => None,
        };

        chosen
            .or_else(|| self.gallery().into_iter().next())
            .unwrap_or_default()
    }
}

/// Row written on insert and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub old_price: Option<Decimal>,
    pub category: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub badge: Option<String>,
    pub material: Option<String>,
    pub image_url: String,
    pub images: Vec<String>,
}

impl ProductDraft {
    /// Combine validated fields with the saved images.
    #[must_use]
    pub fn new(product: ValidProduct, images: &ImageSet, choice: &DefaultImage) -> Self {
        Self {
            name: product.name,
            description: product.description,
            price: product.price.amount(),
            old_price: product.old_price.map(|p| p.amount()),
            category: product.category,
            sizes: product.sizes,
            colors: product.colors,
            badge: product.badge,
            material: product.material,
            image_url: images.primary(choice),
            images: images.gallery(),
        }
    }
}

/// Keep offered sizes only, once each, in [`ALL_SIZES`] order.
fn normalize_sizes(submitted: &[String]) -> Vec<String> {
    ALL_SIZES
        .iter()
        .filter(|size| submitted.iter().any(|s| s.trim() == **size))
        .map(|size| (*size).to_string())
        .collect()
}

/// Split a color list on commas, trimming and dropping repeats.
fn parse_colors(raw: &str) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for color in raw.split([',', '،']).map(str::trim) {
        if !color.is_empty() && !colors.iter().any(|c| c == color) {
            colors.push(color.to_string());
        }
    }
    colors
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
