//! # Cart
//!
//! The in-progress sale: lines built from catalog entries plus the
//! cart-level discount, tax rate, tip and restaurant assignment.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartItem                                                               │
//! │    base  = (override ?? unit_price + Σ modifier.price × mod.qty) × qty  │
//! │    total = base − line discount (floored at zero)                       │
//! │                                                                         │
//! │  Cart                                                                   │
//! │    subtotal = Σ item.total_price()                                      │
//! │    discount = order discount on subtotal (never above subtotal)         │
//! │    tax      = (subtotal − discount) × tax_rate                          │
//! │    total    = subtotal − discount + tax + tip                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is cached. Every total is recomputed from the lines on read,
//! so a quantity or modifier change can never leave a stale price behind.
//!
//! Stock and permission checks live in `PosStore`; this module only knows
//! about the cart itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::{Modifier, Product, Variation};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::{Course, Discount, OrderType};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Selected Modifier
// =============================================================================

/// A modifier chosen for one cart line, priced at the time it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectedModifier {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

impl SelectedModifier {
    pub fn from_modifier(modifier: &Modifier, quantity: i64) -> Self {
        SelectedModifier {
            id: modifier.id.clone(),
            name: modifier.name.clone(),
            price: modifier.price.unwrap_or_default(),
            quantity,
        }
    }

    pub fn total(&self) -> Money {
        self.price * self.quantity
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// One cart line.
///
/// Product name, sku, category and unit price are frozen when the line is
/// created; a later catalog edit does not reprice the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub variation_id: Option<String>,
    pub variation_name: Option<String>,
    pub sku: String,
    pub quantity: i64,
    pub modifiers: Vec<SelectedModifier>,
    /// Variation price if present, else product price.
    pub unit_price: Money,
    pub price_override: Option<Money>,
    pub override_reason: Option<String>,
    pub discount: Option<Discount>,
    pub discount_reason: Option<String>,
    pub seat_number: Option<u32>,
    pub course: Option<Course>,
}

impl CartItem {
    /// Creates a quantity-1 line for a product (and optional variation).
    pub fn new(product: &Product, variation: Option<&Variation>, modifiers: Vec<SelectedModifier>) -> Self {
        let unit_price = variation.map(|v| v.price).unwrap_or(product.price);
        let sku = variation
            .and_then(|v| v.sku.clone())
            .or_else(|| product.sku.clone())
            .unwrap_or_else(|| product.id.clone());
        CartItem {
            id: crate::new_id(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            category: product.category.clone(),
            variation_id: variation.map(|v| v.id.clone()),
            variation_name: variation.map(|v| v.name.clone()),
            sku,
            quantity: 1,
            modifiers,
            unit_price,
            price_override: None,
            override_reason: None,
            discount: None,
            discount_reason: None,
            seat_number: None,
            course: None,
        }
    }

    /// "Name - Variation" when a variation is selected.
    pub fn display_name(&self) -> String {
        match &self.variation_name {
            Some(v) => format!("{} - {}", self.product_name, v),
            None => self.product_name.clone(),
        }
    }

    /// Override price if set, else the frozen unit price.
    pub fn effective_unit_price(&self) -> Money {
        self.price_override.unwrap_or(self.unit_price)
    }

    pub fn modifiers_total(&self) -> Money {
        self.modifiers.iter().map(SelectedModifier::total).sum()
    }

    /// Line total before the line discount.
    pub fn base_price(&self) -> Money {
        (self.effective_unit_price() + self.modifiers_total()) * self.quantity
    }

    pub fn discount_amount(&self) -> Money {
        self.discount
            .map(|d| d.amount_off(self.base_price()))
            .unwrap_or_default()
    }

    /// Line total after the line discount, never negative.
    pub fn total_price(&self) -> Money {
        self.base_price() - self.discount_amount()
    }

    /// True for a plain line (no variation, no modifiers) that a repeat
    /// tap on the same product merges into.
    pub fn is_plain_line_of(&self, product_id: &str) -> bool {
        self.product_id == product_id && self.variation_id.is_none() && self.modifiers.is_empty()
    }

    /// True when this line draws on the given stock bucket.
    pub fn reserves(&self, product_id: &str, variation_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variation_id.as_deref() == variation_id
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart totals summary, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub tip: Money,
    pub total: Money,
}

impl CartTotals {
    /// Applies the cart pricing rules to an arbitrary set of lines.
    pub fn compute(
        items: &[CartItem],
        discount: Option<Discount>,
        tax_rate: TaxRate,
        tip: Money,
    ) -> Self {
        let subtotal: Money = items.iter().map(CartItem::total_price).sum();
        let discount = discount
            .map(|d| d.amount_off(subtotal))
            .unwrap_or_default();
        let tax = (subtotal - discount).calculate_tax(tax_rate);
        CartTotals {
            item_count: items.len(),
            total_quantity: items.iter().map(|i| i.quantity).sum(),
            subtotal,
            discount,
            tax,
            tip,
            total: subtotal - discount + tax + tip,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Every line has quantity ≥ 1
/// - At most `MAX_CART_ITEMS` lines
/// - `discount` and any line discount are never set at the same time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub customer_id: Option<String>,
    pub notes: String,
    pub discount: Option<Discount>,
    pub tax_rate: TaxRate,
    pub tip: Money,
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub server_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(TaxRate::default())
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new(tax_rate: TaxRate) -> Self {
        Cart {
            items: Vec::new(),
            customer_id: None,
            notes: String::new(),
            discount: None,
            tax_rate,
            tip: Money::zero(),
            order_type: OrderType::default(),
            table_id: None,
            server_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::CartItemNotFound(item_id.to_string()))
    }

    /// Appends a line, refusing past `MAX_CART_ITEMS`.
    pub(crate) fn push(&mut self, item: CartItem) -> CoreResult<()> {
        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn remove(&mut self, item_id: &str) -> CoreResult<CartItem> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| CoreError::CartItemNotFound(item_id.to_string()))?;
        Ok(self.items.remove(idx))
    }

    /// Quantity of the given stock bucket already in this cart.
    pub fn reserved_quantity(&self, product_id: &str, variation_id: Option<&str>) -> i64 {
        self.items
            .iter()
            .filter(|i| i.reserves(product_id, variation_id))
            .map(|i| i.quantity)
            .sum()
    }

    pub fn has_item_discounts(&self) -> bool {
        self.items.iter().any(|i| i.discount.is_some())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.items, self.discount, self.tax_rate, self.tip)
    }
}

// =============================================================================
// Parked Sale
// =============================================================================

/// A cart set aside so the register can serve someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParkedSale {
    pub id: String,
    pub cart: Cart,
    pub user_id: String,
    #[ts(as = "String")]
    pub parked_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
