//! # aura-core: Pure Business Logic for Aura POS
//!
//! This crate holds the register's state core: cart math, the stock ledger,
//! checkout, shifts, the transaction ledger, customer analytics and the
//! Z-report. Nothing in here touches a file, socket or clock source other
//! than `chrono::Utc::now()` for timestamps.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aura POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                UI front end (web or desktop)                    │   │
//! │  │    Product grid ──► Cart panel ──► Tender dialog ──► Receipt    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ method calls                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 aura-register (I/O layer)                       │   │
//! │  │    config, settings file, printer, JSON export, tracing         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ aura-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   catalog ─► cart ─► stock ─► order ─► shift/ledger             │   │
//! │  │                                  │                              │   │
//! │  │                                  ├─► customer (analytics, RFM)  │   │
//! │  │                                  └─► report (Z-report)          │   │
//! │  │                                                                 │   │
//! │  │   store::PosStore owns all of the above and exposes mutators    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and TaxRate with integer arithmetic
//! - [`types`] - Shared enums (payment method, order status, permissions)
//! - [`catalog`] - Products, variations, modifiers and lookup
//! - [`cart`] - Cart lines, discounts and totals
//! - [`stock`] - Available stock net of cart reservations
//! - [`order`] - Orders, payment lines and tender evaluation
//! - [`shift`] / [`ledger`] - Shift sessions and the transaction log
//! - [`customer`] - Customers, recomputed analytics and RFM scoring
//! - [`report`] - Z-report rollup of a shift
//! - [`validation`] - Form validation with field-keyed errors
//! - [`settings`] - App settings blob over a key/value storage trait
//! - [`store`] - The `PosStore` state container
//!
//! ## Example Usage
//!
//! ```rust
//! use aura_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::from_cents(2000); // $20.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
//! assert_eq!(tax.cents(), 160);
//! assert_eq!((subtotal + tax).cents(), 2160);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod gift_card;
pub mod ledger;
pub mod money;
pub mod order;
pub mod report;
pub mod settings;
pub mod shift;
pub mod stock;
pub mod store;
pub mod table;
pub mod types;
pub mod user;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals, SelectedModifier};
pub use catalog::{Catalog, Modifier, Product, Variation};
pub use customer::{Customer, CustomerAnalytics};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::Transaction;
pub use money::{Money, TaxRate};
pub use order::{CheckoutRequest, Order, OrderItem, PaymentLine, Tender};
pub use report::ZReport;
pub use settings::{AppSettings, KeyValueStorage, MemoryStorage};
pub use shift::{Shift, Terminal};
pub use store::{ExchangeOutcome, PosStore, Snapshot};
pub use types::*;
pub use user::User;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Also the ceiling on available stock for products that do not track
/// inventory.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Tax rate a fresh cart starts with (8%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 800;

/// Generates a new entity id (UUID v4, hyphenated).
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
