//! # Catalog
//!
//! Products, their variations and modifiers, and the lookups the register
//! needs: by id, free-text search, and scan-code resolution.
//!
//! The catalog is reference data. The only mutation the sale flow performs
//! is the stock write-back in [`Catalog::set_stock`].
//!
//! ## Scan Code Resolution
//! ```text
//! code ──► product.barcode ──► product.sku ──► variation.sku ──► None
//!           (first match wins, in that order)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Modifier / Variation
// =============================================================================

/// An add-on choice such as "extra shot". A missing price means free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub price: Option<Money>,
}

/// A sellable variant of a product (size, colour) with its own price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variation {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i64,
    pub sku: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// ## Stock Tracking
/// - `stock_quantity: Some(n)` tracks inventory; checkout decrements it
/// - `stock_quantity: None` is untracked; the cart only enforces the
///   per-line quantity ceiling
///
/// For a product with variations the product-level quantity is the sum of
/// its variations, kept in step by [`Catalog::set_stock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub stock_quantity: Option<i64>,
    pub variations: Vec<Variation>,
    pub modifiers: Vec<Modifier>,
}

impl Product {
    /// Creates an untracked product with a fresh id.
    pub fn new(name: impl Into<String>, price: Money, category: impl Into<String>) -> Self {
        Product {
            id: crate::new_id(),
            name: name.into(),
            price,
            category: category.into(),
            sku: None,
            barcode: None,
            stock_quantity: None,
            variations: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = Some(quantity);
        self
    }

    /// Adds a variation and re-totals product stock.
    pub fn with_variation(mut self, variation: Variation) -> Self {
        self.variations.push(variation);
        self.stock_quantity = Some(self.variations.iter().map(|v| v.stock_quantity).sum());
        self
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn variation(&self, variation_id: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.id == variation_id)
    }

    pub fn is_tracked(&self) -> bool {
        self.stock_quantity.is_some()
    }

    fn matches(&self, needle: &str) -> bool {
        let contains = |s: &str| s.to_lowercase().contains(needle);
        contains(&self.name)
            || self.sku.as_deref().is_some_and(contains)
            || contains(&self.category)
            || self
                .variations
                .iter()
                .any(|v| contains(&v.name) || v.sku.as_deref().is_some_and(contains))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Ordered product list. Insertion order is the display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    /// Inserts a product, replacing any existing product with the same id.
    pub fn upsert(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    pub fn remove(&mut self, product_id: &str) -> Option<Product> {
        let idx = self.products.iter().position(|p| p.id == product_id)?;
        Some(self.products.remove(idx))
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Case-insensitive search over name, sku, category and variation
    /// name/sku. An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products.iter().filter(|p| p.matches(&needle)).collect()
    }

    /// Resolves a scanned code to a product and, for variation skus, the
    /// variation.
    pub fn find_by_code(&self, code: &str) -> Option<(&Product, Option<&Variation>)> {
        if let Some(p) = self
            .products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code))
        {
            return Some((p, None));
        }
        if let Some(p) = self.products.iter().find(|p| p.sku.as_deref() == Some(code)) {
            return Some((p, None));
        }
        self.products.iter().find_map(|p| {
            p.variations
                .iter()
                .find(|v| v.sku.as_deref() == Some(code))
                .map(|v| (p, Some(v)))
        })
    }

    /// Writes stock on record.
    ///
    /// With a variation id, the variation's quantity is set and the product
    /// quantity becomes the sum over its variations.
    pub fn set_stock(
        &mut self,
        product_id: &str,
        variation_id: Option<&str>,
        quantity: i64,
    ) -> CoreResult<()> {
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        match variation_id {
            Some(vid) => {
                let variation = product
                    .variations
                    .iter_mut()
                    .find(|v| v.id == vid)
                    .ok_or_else(|| CoreError::VariationNotFound {
                        product_id: product_id.to_string(),
                        variation_id: vid.to_string(),
                    })?;
                variation.stock_quantity = quantity;
                product.stock_quantity =
                    Some(product.variations.iter().map(|v| v.stock_quantity).sum());
            }
            None => product.stock_quantity = Some(quantity),
        }
        Ok(())
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.products.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

// =============================================================================
// Scan Record
// =============================================================================

/// One barcode scan, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanRecord {
    pub code: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub success: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
