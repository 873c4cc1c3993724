//! # PosStore
//!
//! The register's single state container. It owns every entity and exposes
//! mutator methods; UI event handlers call into it one at a time.
//!
//! ## Ownership Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PosStore                                                               │
//! │  ├── catalog         products, variations, stock on record              │
//! │  ├── cart            the active sale            (store/cart.rs)         │
//! │  ├── parked_sales    carts set aside            (store/cart.rs)         │
//! │  ├── current_shift   open shift: orders + txns  (store/shift.rs)        │
//! │  ├── shifts          closed shifts, read only                           │
//! │  ├── customers       records + cached analytics (store/customers.rs)    │
//! │  ├── users           sign-in and permissions                            │
//! │  ├── gift_cards, tables, scans                                          │
//! │  └── training_mode   checkout without stock/analytics side effects      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Refusals
//! Every mutator validates all of its preconditions before touching state.
//! An `Err` therefore means the store is exactly as it was, and the refusal
//! is logged at `debug`. Callers that want the cashier-UI behaviour of
//! "nothing happens" can drop the error.
//!
//! Checkout is the one place where side effects run in sequence (stock, then
//! ledger, then analytics); see `store/checkout.rs`.

mod cart;
mod checkout;
mod customers;
mod shift;

pub use checkout::ExchangeOutcome;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::{Cart, ParkedSale};
use crate::catalog::{Catalog, Product, ScanRecord};
use crate::customer::Customer;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::gift_card::GiftCard;
use crate::ledger::{self, Transaction};
use crate::money::{Money, TaxRate};
use crate::order::Order;
use crate::shift::Shift;
use crate::table::RestaurantTable;
use crate::types::{OrderType, Permission};
use crate::user::User;

/// Logs a refusal and returns it.
fn refuse<T>(err: CoreError) -> CoreResult<T> {
    Err(refused(err))
}

/// Logs a refusal raised further down (catalog, cart) before it propagates.
fn refused(err: CoreError) -> CoreError {
    debug!(reason = %err, "operation refused");
    err
}

// =============================================================================
// Snapshot
// =============================================================================

/// Read-only copy of the store for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    /// Closed shifts followed by the open one, if any.
    pub shifts: Vec<Shift>,
    pub orders: Vec<Order>,
    /// Newest first.
    pub transactions: Vec<Transaction>,
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct PosStore {
    catalog: Catalog,
    cart: Cart,
    default_tax_rate: TaxRate,
    parked_sales: Vec<ParkedSale>,
    users: Vec<User>,
    current_user: Option<User>,
    current_shift: Option<Shift>,
    shifts: Vec<Shift>,
    customers: Vec<Customer>,
    gift_cards: Vec<GiftCard>,
    tables: Vec<RestaurantTable>,
    scans: Vec<ScanRecord>,
    training_mode: bool,
}

impl Default for PosStore {
    fn default() -> Self {
        PosStore::new(Catalog::new())
    }
}

impl PosStore {
    pub fn new(catalog: Catalog) -> Self {
        PosStore::with_tax_rate(catalog, TaxRate::default())
    }

    /// Store whose carts start at `tax_rate`.
    pub fn with_tax_rate(catalog: Catalog, tax_rate: TaxRate) -> Self {
        PosStore {
            catalog,
            cart: Cart::new(tax_rate),
            default_tax_rate: tax_rate,
            parked_sales: Vec::new(),
            users: Vec::new(),
            current_user: None,
            current_shift: None,
            shifts: Vec::new(),
            customers: Vec::new(),
            gift_cards: Vec::new(),
            tables: Vec::new(),
            scans: Vec::new(),
            training_mode: false,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Direct catalog edits (product admin screens).
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn current_shift(&self) -> Option<&Shift> {
        self.current_shift.as_ref()
    }

    /// Closed shifts, oldest first.
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_training_mode(&self) -> bool {
        self.training_mode
    }

    pub fn set_training_mode(&mut self, enabled: bool) {
        info!(enabled, "training mode changed");
        self.training_mode = enabled;
    }

    // -------------------------------------------------------------------------
    // Preconditions
    // -------------------------------------------------------------------------

    fn require_user(&self) -> CoreResult<&User> {
        match self.current_user.as_ref() {
            Some(user) => Ok(user),
            None => refuse(CoreError::NoCurrentUser),
        }
    }

    fn require_shift(&self) -> CoreResult<&Shift> {
        match self.current_shift.as_ref() {
            Some(shift) => Ok(shift),
            None => refuse(CoreError::NoOpenShift),
        }
    }

    fn require_permission(&self, permission: Permission) -> CoreResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            refuse(CoreError::PermissionDenied(permission))
        }
    }

    /// Open shift for a mutation. Only call after every check has passed.
    fn shift_mut(&mut self) -> CoreResult<&mut Shift> {
        self.current_shift.as_mut().ok_or(CoreError::NoOpenShift)
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Adds a user, replacing any with the same id.
    pub fn add_user(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    pub fn sign_in_with_pin(&mut self, pin: &str) -> CoreResult<&User> {
        let Some(user) = self.users.iter().find(|u| u.pin == pin).cloned() else {
            return refuse(CoreError::InvalidCredentials);
        };
        info!(user_id = %user.id, "user signed in");
        Ok(&*self.current_user.insert(user))
    }

    pub fn set_current_user(&mut self, user: Option<User>) {
        self.current_user = user;
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.current_user.take() {
            info!(user_id = %user.id, "user signed out");
        }
    }

    /// False when nobody is signed in.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|u| u.has_permission(permission))
    }

    // -------------------------------------------------------------------------
    // Order lookups
    // -------------------------------------------------------------------------

    /// Every order, closed shifts first, then the open shift.
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.shifts
            .iter()
            .chain(self.current_shift.iter())
            .flat_map(|s| s.orders.iter())
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.all_orders().find(|o| o.id == order_id)
    }

    /// Newest first.
    pub fn recent_orders(&self, limit: usize) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.all_orders().collect();
        orders.reverse();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(limit);
        orders
    }

    pub fn snapshot(&self) -> Snapshot {
        let shifts: Vec<Shift> = self
            .shifts
            .iter()
            .chain(self.current_shift.iter())
            .cloned()
            .collect();
        Snapshot {
            products: self.catalog.products().to_vec(),
            customers: self.customers.clone(),
            orders: self.all_orders().cloned().collect(),
            transactions: self.all_transactions(),
            shifts,
        }
    }

    // -------------------------------------------------------------------------
    // Gift cards
    // -------------------------------------------------------------------------

    pub fn create_gift_card(&mut self, amount: Money) -> CoreResult<GiftCard> {
        if !amount.is_positive() {
            return refuse(
                ValidationError::MustBePositive {
                    field: "amount".to_string(),
                }
                .into(),
            );
        }
        let card = GiftCard::issue(amount);
        info!(card_number = %card.card_number, amount = %amount, "gift card issued");
        self.gift_cards.push(card.clone());
        Ok(card)
    }

    /// Deducts from an active card and returns the remaining balance.
    pub fn redeem_gift_card(&mut self, card_number: &str, amount: Money) -> CoreResult<Money> {
        let Some(card) = self
            .gift_cards
            .iter_mut()
            .find(|c| c.card_number == card_number && c.is_active)
        else {
            return refuse(CoreError::GiftCardNotFound(card_number.to_string()));
        };
        let remaining = card.redeem(amount).map_err(refused)?;
        info!(card_number, amount = %amount, remaining = %remaining, "gift card redeemed");
        Ok(remaining)
    }

    /// Balance of an active card; zero for unknown or inactive cards.
    pub fn gift_card_balance(&self, card_number: &str) -> Money {
        self.gift_cards
            .iter()
            .find(|c| c.card_number == card_number && c.is_active)
            .map(|c| c.balance)
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Tables
    // -------------------------------------------------------------------------

    pub fn add_table(&mut self, table: RestaurantTable) {
        self.tables.push(table);
    }

    pub fn tables(&self) -> &[RestaurantTable] {
        &self.tables
    }

    /// Seats the active cart at a table: dine-in, table occupied, signed-in
    /// user recorded as server.
    pub fn assign_cart_to_table(&mut self, table_id: &str) -> CoreResult<()> {
        let user = self.require_user()?.clone();
        let Some(table) = self.tables.iter_mut().find(|t| t.id == table_id) else {
            return refuse(CoreError::TableNotFound(table_id.to_string()));
        };
        table.occupy(&user.name);
        self.cart.table_id = Some(table_id.to_string());
        self.cart.order_type = OrderType::DineIn;
        self.cart.server_id = Some(user.id.clone());
        info!(table_id, server = %user.name, "cart assigned to table");
        Ok(())
    }

    pub fn clear_table(&mut self, table_id: &str) -> CoreResult<()> {
        let Some(table) = self.tables.iter_mut().find(|t| t.id == table_id) else {
            return refuse(CoreError::TableNotFound(table_id.to_string()));
        };
        table.release();
        info!(table_id, "table cleared");
        Ok(())
    }

    /// Orders in the open shift for one table.
    pub fn table_orders(&self, table_id: &str) -> Vec<&Order> {
        self.current_shift
            .iter()
            .flat_map(|s| s.orders.iter())
            .filter(|o| o.table_id.as_deref() == Some(table_id))
            .collect()
    }

    /// Appends to the open shift's ledger, stamping shift id and time.
    fn append_transaction(&mut self, transaction: Transaction) -> CoreResult<Transaction> {
        let shift = self.shift_mut()?;
        let mut transaction = transaction;
        transaction.shift_id = shift.id.clone();
        shift.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// All transactions across closed and open shifts, newest first.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        ledger::newest_first(
            self.shifts
                .iter()
                .chain(self.current_shift.iter())
                .flat_map(|s| s.transactions.iter().cloned()),
        )
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::catalog::Variation;
    use crate::shift::Terminal;

    pub fn catalog() -> Catalog {
        Catalog::from_products(vec![
            Product::new("Burger", Money::from_cents(1000), "Food")
                .with_id("burger")
                .with_sku("BRG")
                .with_barcode("400100")
                .with_stock(5),
            Product::new("Fries", Money::from_cents(350), "Food").with_id("fries"),
            Product::new("Hoodie", Money::from_cents(4000), "Apparel")
                .with_id("hoodie")
                .with_variation(Variation {
                    id: "hoodie-m".into(),
                    name: "Medium".into(),
                    price: Money::from_cents(4000),
                    stock_quantity: 2,
                    sku: Some("HOOD-M".into()),
                })
                .with_variation(Variation {
                    id: "hoodie-xl".into(),
                    name: "XL".into(),
                    price: Money::from_cents(4500),
                    stock_quantity: 1,
                    sku: Some("HOOD-XL".into()),
                }),
        ])
    }

    pub fn cashier() -> User {
        User {
            id: "cashier".into(),
            ..User::new("Casey", "1111").with_permissions([Permission::VoidItems])
        }
    }

    pub fn manager() -> User {
        User {
            id: "manager".into(),
            ..User::new("Morgan", "2222").with_permissions([Permission::All])
        }
    }

    /// Store with the manager signed in and a shift open with $100 float.
    pub fn open_store() -> PosStore {
        let mut store = PosStore::new(catalog());
        store.add_user(cashier());
        store.add_user(manager());
        store.sign_in_with_pin("2222").unwrap();
        store
            .start_shift("manager", Terminal::new("t1", "Front Counter"), Money::from_cents(10_000))
            .unwrap();
        store
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::table::TableStatus;

    #[test]
    fn test_sign_in_with_pin() {
        let mut store = PosStore::new(catalog());
        store.add_user(cashier());
        assert_eq!(store.sign_in_with_pin("9999"), Err(CoreError::InvalidCredentials));
        assert!(store.current_user().is_none());
        assert!(!store.has_permission(Permission::VoidItems));

        store.sign_in_with_pin("1111").unwrap();
        assert!(store.has_permission(Permission::VoidItems));
        assert!(!store.has_permission(Permission::PriceOverride));

        store.sign_out();
        assert!(store.current_user().is_none());
    }

    #[test]
    fn test_gift_card_flow() {
        let mut store = PosStore::default();
        assert!(store.create_gift_card(Money::zero()).is_err());

        let card = store.create_gift_card(Money::from_cents(2_500)).unwrap();
        assert_eq!(store.gift_card_balance(&card.card_number).cents(), 2_500);
        assert_eq!(
            store.redeem_gift_card(&card.card_number, Money::from_cents(1_000)),
            Ok(Money::from_cents(1_500))
        );
        assert!(store
            .redeem_gift_card(&card.card_number, Money::from_cents(2_000))
            .is_err());
        assert_eq!(store.gift_card_balance(&card.card_number).cents(), 1_500);
        assert_eq!(store.gift_card_balance("GC000"), Money::zero());
    }

    #[test]
    fn test_negative_redeem_cannot_add_value() {
        let mut store = PosStore::default();
        let card = store.create_gift_card(Money::from_cents(1_000)).unwrap();
        assert_eq!(
            store.redeem_gift_card(&card.card_number, Money::from_cents(-5_000)),
            Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "amount".to_string()
            }))
        );
        assert!(store.redeem_gift_card(&card.card_number, Money::zero()).is_err());
        assert_eq!(store.gift_card_balance(&card.card_number).cents(), 1_000);
    }

    #[test]
    fn test_assign_and_clear_table() {
        let mut store = open_store();
        let table = RestaurantTable::new(3, 4, "Main");
        let table_id = table.id.clone();
        store.add_table(table);

        assert!(store.assign_cart_to_table("missing").is_err());
        store.assign_cart_to_table(&table_id).unwrap();
        assert_eq!(store.cart().order_type, OrderType::DineIn);
        assert_eq!(store.cart().table_id.as_deref(), Some(table_id.as_str()));
        assert_eq!(store.cart().server_id.as_deref(), Some("manager"));
        assert_eq!(store.tables()[0].status, TableStatus::Occupied);
        assert_eq!(store.tables()[0].server.as_deref(), Some("Morgan"));

        store.clear_table(&table_id).unwrap();
        assert_eq!(store.tables()[0].status, TableStatus::Available);
    }

    #[test]
    fn test_snapshot_collects_everything() {
        let mut store = open_store();
        store.no_sale("check drawer").unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.products.len(), 3);
        assert_eq!(snapshot.shifts.len(), 1);
        assert_eq!(snapshot.transactions.len(), 1);
        assert!(snapshot.orders.is_empty());
    }
}
