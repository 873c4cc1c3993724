//! # Error Types
//!
//! Domain error types for aura-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  aura-core errors (this file)                                          │
//! │  ├── CoreError        - A store operation was refused                  │
//! │  └── ValidationError  - A single input value failed a rule             │
//! │                                                                         │
//! │  aura-register errors (separate crate)                                 │
//! │  ├── RegisterError    - Config, storage, export, printing              │
//! │  └── PrintError       - Printer transport                              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → RegisterError → UI notification   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refusal Contract
//! Every `Err(CoreError)` returned by `PosStore` means nothing was changed.
//! A cashier-facing UI may simply drop the error; the action just does not
//! happen.

use thiserror::Error;

use crate::types::{OrderStatus, Permission};

// =============================================================================
// Core Error
// =============================================================================

/// Refusals of business operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No shift is open on this register.
    #[error("No open shift")]
    NoOpenShift,

    /// A shift is already open; close it before starting another.
    #[error("Shift {0} is already open")]
    ShiftAlreadyOpen(String),

    /// Nobody is signed in.
    #[error("No user signed in")]
    NoCurrentUser,

    /// Checkout or park was attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A parked sale cannot be restored over a cart that has lines.
    #[error("Cart is not empty")]
    CartNotEmpty,

    /// Nothing left to sell.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap product (stock on record: 2, in cart: 2)
    ///      │
    ///      ▼
    /// available_stock() = 0
    ///      │
    ///      ▼
    /// OutOfStock { product_id: "p-1" }  → tap is ignored
    /// ```
    #[error("Product {product_id} is out of stock")]
    OutOfStock { product_id: String },

    /// The signed-in user lacks the permission for this action.
    #[error("Permission denied: {0:?}")]
    PermissionDenied(Permission),

    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Variation {variation_id} not found on product {product_id}")]
    VariationNotFound {
        product_id: String,
        variation_id: String,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Voiding an order that is already voided
    /// - Returning items from a return order
    #[error("Order {order_id} is {status:?}, cannot perform operation")]
    InvalidOrderStatus { order_id: String, status: OrderStatus },

    /// None of the requested lines can be returned.
    #[error("No returnable items on order {0}")]
    NothingToReturn(String),

    /// Order-level and line-level discounts are mutually exclusive.
    #[error("Order discount and item discounts cannot be combined")]
    DiscountConflict,

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Gift card not found or inactive: {0}")]
    GiftCardNotFound(String),

    #[error("Gift card {card_number} has insufficient balance")]
    InsufficientGiftCardBalance { card_number: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Parked sale not found: {0}")]
    ParkedSaleNotFound(String),

    #[error("Shift not found: {0}")]
    ShiftNotFound(String),

    /// No user matches the entered PIN.
    #[error("Invalid PIN")]
    InvalidCredentials,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a single value doesn't meet requirements.
/// Form validators collect them into a `FieldErrors` map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
