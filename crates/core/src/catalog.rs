//! Catalog records: stocked products and flat-fee services.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::text::{blank_text_as_none, lenient_money, opaque_text};
use crate::types::{Money, ProductCategory, ProductId, ServiceId};

/// A product in the store catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    #[serde(deserialize_with = "opaque_text")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub category: ProductCategory,
    /// Default unit price.
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Money,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub sku: Option<String>,
}

/// A service in the store catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: ServiceId,
    #[serde(deserialize_with = "opaque_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_money")]
    pub price: Money,
    #[serde(default, deserialize_with = "blank_text_as_none")]
    pub description: Option<String>,
}

/// Body of the create-product call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    name: String,
    #[serde(rename = "type")]
    category: ProductCategory,
    price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
}

impl NewProduct {
    /// # Errors
    ///
    /// Returns [`ValidationError::NameRequired`] if the name is blank.
    pub fn new(name: &str, category: ProductCategory, price: Money) -> ValidationResult<Self> {
        Ok(Self {
            name: required_name(name)?,
            category,
            price,
            sku: None,
        })
    }

    #[must_use]
    pub fn with_sku(mut self, sku: Option<String>) -> Self {
        self.sku = sku.filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Body of the create-service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewService {
    name: String,
    price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl NewService {
    /// # Errors
    ///
    /// Returns [`ValidationError::NameRequired`] if the name is blank.
    pub fn new(name: &str, price: Money) -> ValidationResult<Self> {
        Ok(Self {
            name: required_name(name)?,
            price,
            description: None,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn required_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    Ok(name.to_owned())
}

/// Narrow a product list by category and free text.
///
/// The text matches case-insensitively against the name, the category label
/// and the SKU, so searching `"lens"` finds every lens.
#[must_use]
pub fn filter_products<'a>(
    products: &'a [CatalogProduct],
    category: Option<ProductCategory>,
    search: &str,
) -> Vec<&'a CatalogProduct> {
    let needle = search.trim().to_lowercase();
    products
        .iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| {
            needle.is_empty()
                || format!("{} {} {}", p.name, p.category, p.sku.as_deref().unwrap_or(""))
                    .to_lowercase()
                    .contains(&needle)
        })
        .collect()
}
