//! # Validation Module
//!
//! Input validation for register forms and single values.
//!
//! ## Two Shapes of Result
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scalar validators            validate_sku("COKE-330")                  │
//! │    → Result<(), ValidationError>   first failure only                   │
//! │                                                                         │
//! │  Form validators              validate_product(&ProductForm { .. })     │
//! │    → Result<(), FieldErrors>       one message per failing field        │
//! │                                                                         │
//! │  Forms never throw: the UI renders FieldErrors next to each input.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aura_core::money::Money;
//! use aura_core::validation::{validate_product, ProductForm};
//!
//! let form = ProductForm {
//!     name: "".into(),
//!     price: Money::from_cents(-1),
//!     category: "Coffee".into(),
//!     sku: None,
//!     stock_quantity: None,
//! };
//! let errors = validate_product(&form).unwrap_err();
//! assert_eq!(errors.get("name"), Some("Product name is required"));
//! assert_eq!(errors.get("price"), Some("Price must be 0 or greater"));
//! assert_eq!(errors.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartItem, SelectedModifier};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Discount;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Errors
// =============================================================================

/// Field name → message. Only the first failure per field is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors::default()
    }

    /// Records a failure unless the field already has one.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Records `message` for `field` when `failed` is true.
    fn check(&mut self, failed: bool, field: &str, message: &str) {
        if failed {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductForm {
    pub name: String,
    pub price: Money,
    pub category: String,
    pub sku: Option<String>,
    pub stock_quantity: Option<i64>,
}

/// Highest price a product form accepts ($999,999.99).
pub const MAX_PRODUCT_PRICE: Money = Money::from_cents(99_999_999);

pub fn validate_product(form: &ProductForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = form.name.trim();
    errors.check(name.is_empty(), "name", "Product name is required");
    errors.check(
        name.chars().count() > 100,
        "name",
        "Name must be less than 100 characters",
    );
    errors.check(form.price.is_negative(), "price", "Price must be 0 or greater");
    errors.check(form.price > MAX_PRODUCT_PRICE, "price", "Price is too large");
    errors.check(
        form.category.trim().is_empty(),
        "category",
        "Category is required",
    );
    if let Some(sku) = form.sku.as_deref().filter(|s| !s.trim().is_empty()) {
        if let Err(e) = validate_sku(sku) {
            errors.add("sku", e.to_string());
        }
    }
    errors.check(
        form.stock_quantity.is_some_and(|q| q < 0),
        "stock_quantity",
        "Stock must be 0 or greater",
    );
    errors.into_result()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerForm {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn validate_customer(form: &CustomerForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = form.name.trim();
    errors.check(name.is_empty(), "name", "Customer name is required");
    errors.check(
        name.chars().count() > 100,
        "name",
        "Name must be less than 100 characters",
    );
    if let Some(email) = form.email.as_deref().filter(|e| !e.is_empty()) {
        errors.check(!is_email(email), "email", "Invalid email address");
    }
    if let Some(phone) = form.phone.as_deref().filter(|p| !p.is_empty()) {
        let allowed = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));
        errors.check(!allowed, "phone", "Invalid phone number format");
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        errors.check(digits < 10, "phone", "Phone number must be at least 10 digits");
    }
    errors.into_result()
}

/// `local@domain.tld` with no whitespace.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountForm {
    pub name: String,
    pub discount: Discount,
}

pub fn validate_discount(form: &DiscountForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = form.name.trim();
    errors.check(name.is_empty(), "name", "Discount name is required");
    errors.check(name.chars().count() > 50, "name", "Name must be less than 50 characters");
    match form.discount {
        Discount::Percentage(bps) => errors.check(
            bps > 10_000,
            "value",
            "Percentage discount cannot exceed 100%",
        ),
        Discount::Fixed(amount) => {
            errors.check(amount.is_negative(), "value", "Value must be 0 or greater")
        }
    }
    errors.into_result()
}

pub fn validate_payment(amount: Money) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(!amount.is_positive(), "amount", "Amount must be greater than 0");
    errors.into_result()
}

pub fn validate_cash_movement(amount: Money, note: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(!amount.is_positive(), "amount", "Amount must be greater than 0");
    errors.check(
        note.chars().count() > 200,
        "note",
        "Notes must be less than 200 characters",
    );
    errors.into_result()
}

// =============================================================================
// Scalar Validators
// =============================================================================

/// Sign-in PIN: 4 to 6 ASCII digits.
///
/// ```rust
/// use aura_core::validation::validate_pin;
///
/// assert!(validate_pin("1234").is_ok());
/// assert!(validate_pin("12a4").is_err());
/// ```
pub fn validate_pin(pin: &str) -> ValidationResult<()> {
    if (4..=6).contains(&pin.len()) && pin.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "pin".to_string(),
            reason: "PIN must be 4-6 digits".to_string(),
        })
    }
}

/// Validates a SKU: 1-50 characters of letters, digits, `-` and `_`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Line quantity: 1..=MAX_ITEM_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices may be zero (free items) but not negative.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRODUCT_PRICE.cents(),
        });
    }
    Ok(())
}

/// 0..=10000 basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Each modifier must be taken at least once and may not carry a credit.
pub fn validate_modifiers(modifiers: &[SelectedModifier]) -> ValidationResult<()> {
    for modifier in modifiers {
        if modifier.quantity < 1 || modifier.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "modifier_quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if modifier.price.is_negative() {
            return Err(ValidationError::OutOfRange {
                field: "modifier_price".to_string(),
                min: 0,
                max: MAX_PRODUCT_PRICE.cents(),
            });
        }
    }
    Ok(())
}

/// A line built outside the cart (exchange replacements) must satisfy the
/// same rules the cart enforces on its own lines.
pub fn validate_cart_item(item: &CartItem) -> ValidationResult<()> {
    validate_quantity(item.quantity)?;
    validate_price(item.unit_price)?;
    if let Some(price) = item.price_override {
        validate_price(price)?;
    }
    validate_modifiers(&item.modifiers)
}

// =============================================================================
// Unit Tests
// =============================================================================
