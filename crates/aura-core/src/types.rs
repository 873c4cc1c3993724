//! # Domain Types
//!
//! Closed sets of values shared across the core. Each one replaces a loosely
//! typed string in the web client, so every consumer matches exhaustively.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Enums                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │ TransactionType │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Paid           │   │  Sale   Return  │   │  Cash           │       │
//! │  │  Pending        │   │  Void   CashIn  │   │  Card           │       │
//! │  │  Cancelled      │   │  CashOut        │   │  Cheque         │       │
//! │  │  Voided         │   │  NoSale         │   │  GiftCard       │       │
//! │  │  Returned       │   │  Exchange       │   │  StoreCredit    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderType     │   │   FireStatus    │   │  KitchenStatus  │       │
//! │  │  DineIn ...     │   │  AutoFired ...  │   │  New ... Served │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Status Machine
//! ```text
//!   (none) ──checkout──► Paid ──void_order──► Voided
//!                          │
//!                          └── return_order ──► new linked order (Returned)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that can produce change.
    Cash,
    Card,
    Cheque,
    GiftCard,
    StoreCredit,
}

impl PaymentMethod {
    /// Every method, in Z-report order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Cheque,
        PaymentMethod::GiftCard,
        PaymentMethod::StoreCredit,
    ];

    /// Human-readable label for reports and receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::GiftCard => "Gift Card",
            PaymentMethod::StoreCredit => "Store Credit",
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
    Pending,
    Cancelled,
    /// Terminal. The order stays in the shift with a compensating transaction.
    Voided,
    /// Carried by the negative order created by a return.
    Returned,
}

// =============================================================================
// Transaction Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Return,
    Void,
    CashIn,
    CashOut,
    NoSale,
    Exchange,
}

impl TransactionType {
    /// True for drawer movements that carry no order.
    pub fn is_cash_movement(&self) -> bool {
        matches!(self, TransactionType::CashIn | TransactionType::CashOut)
    }
}

// =============================================================================
// Permission
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    VoidItems,
    VoidTransactions,
    ApplyDiscounts,
    PriceOverride,
    ProcessReturns,
    OpenCashDrawer,
    ManagerOverride,
    ViewReports,
    ModifyOrders,
    /// Grants every other permission.
    All,
}

// =============================================================================
// Order Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
    #[default]
    InStore,
    Pickup,
}

impl OrderType {
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::DineIn => "Dine In",
            OrderType::Takeout => "Takeout",
            OrderType::Delivery => "Delivery",
            OrderType::InStore => "In-Store",
            OrderType::Pickup => "Pickup",
        }
    }
}

// =============================================================================
// Restaurant Types
// =============================================================================

/// Course tag on a cart line, used when splitting a table's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Course {
    Appetizer,
    Main,
    Dessert,
    Beverage,
}

/// How an order reached the kitchen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum FireStatus {
    AutoFired,
    ManuallyFired,
    Held,
    #[default]
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum KitchenStatus {
    New,
    Preparing,
    Ready,
    Served,
}

// =============================================================================
// Discount
// =============================================================================

/// A discount on a cart line or on the whole cart.
///
/// ## Semantics
/// - `Percentage(bps)`: 1000 = 10% of the base amount, rounded to the cent
/// - `Fixed(amount)`: flat amount, never more than the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Discount {
    Percentage(u32),
    Fixed(Money),
}

impl Discount {
    /// Amount taken off `base`. Never exceeds `base`, never negative.
    ///
    /// ```rust
    /// use aura_core::money::Money;
    /// use aura_core::types::Discount;
    ///
    /// let base = Money::from_cents(2000);
    /// assert_eq!(Discount::Percentage(1000).amount_off(base).cents(), 200);
    /// assert_eq!(Discount::Fixed(Money::from_cents(5000)).amount_off(base).cents(), 2000);
    /// ```
    pub fn amount_off(&self, base: Money) -> Money {
        let base = base.max_zero();
        match *self {
            Discount::Percentage(bps) => base.percentage_of(bps.min(10_000)),
            Discount::Fixed(amount) => amount.max_zero().min(base),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
