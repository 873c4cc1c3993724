//! Cart mutators, parked sales and barcode scanning.
//!
//! Every quantity that reaches the cart has been clamped against the stock
//! ledger first: `add_item` refuses at zero available, `update_quantity`
//! clamps to `available + already in this line`.

use chrono::Utc;
use tracing::{debug, info};

use super::{refuse, refused, PosStore};
use crate::cart::{Cart, CartItem, ParkedSale, SelectedModifier};
use crate::catalog::ScanRecord;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::Transaction;
use crate::money::{Money, TaxRate};
use crate::stock;
use crate::types::{Course, Discount, OrderType, Permission, TransactionType};
use crate::validation::validate_modifiers;
use crate::MAX_ITEM_QUANTITY;

impl PosStore {
    // =========================================================================
    // Lines
    // =========================================================================

    /// Stock left for a product or variation once the active cart is netted
    /// out. Never negative.
    pub fn available_stock(&self, product_id: &str, variation_id: Option<&str>) -> i64 {
        stock::available_stock(&self.catalog, &self.cart, product_id, variation_id)
    }

    /// Adds one unit and returns the id of the line it landed on.
    ///
    /// A plain tap (no variation, no modifiers) merges into an existing plain
    /// line for the same product; anything else gets its own line.
    pub fn add_item(
        &mut self,
        product_id: &str,
        variation_id: Option<&str>,
        modifiers: Vec<SelectedModifier>,
    ) -> CoreResult<String> {
        validate_modifiers(&modifiers).map_err(|e| refused(e.into()))?;
        let Some(product) = self.catalog.get(product_id) else {
            return refuse(CoreError::ProductNotFound(product_id.to_string()));
        };
        let variation = match variation_id {
            Some(vid) => match product.variation(vid) {
                Some(v) => Some(v),
                None => {
                    return refuse(CoreError::VariationNotFound {
                        product_id: product_id.to_string(),
                        variation_id: vid.to_string(),
                    })
                }
            },
            None => None,
        };

        if self.available_stock(product_id, variation_id) <= 0 {
            return refuse(CoreError::OutOfStock {
                product_id: product_id.to_string(),
            });
        }

        if variation.is_none() && modifiers.is_empty() {
            if let Some(line) = self
                .cart
                .items
                .iter_mut()
                .find(|i| i.is_plain_line_of(product_id))
            {
                if line.quantity >= MAX_ITEM_QUANTITY {
                    return refuse(CoreError::QuantityTooLarge {
                        requested: line.quantity + 1,
                        max: MAX_ITEM_QUANTITY,
                    });
                }
                line.quantity += 1;
                debug!(item_id = %line.id, quantity = line.quantity, "cart line incremented");
                return Ok(line.id.clone());
            }
        }

        let item = CartItem::new(product, variation, modifiers);
        let item_id = item.id.clone();
        self.cart.push(item).map_err(refused)?;
        debug!(item_id = %item_id, product_id, "cart line added");
        Ok(item_id)
    }

    /// Sets a line's quantity.
    ///
    /// `qty ≤ 0` removes the line. Otherwise the quantity is clamped to the
    /// stock this line may draw on and to `MAX_ITEM_QUANTITY`; a clamp to
    /// zero also removes it. Returns the quantity actually set.
    pub fn update_quantity(&mut self, item_id: &str, qty: i64) -> CoreResult<i64> {
        let Some(item) = self.cart.item(item_id) else {
            return refuse(CoreError::CartItemNotFound(item_id.to_string()));
        };
        if qty <= 0 {
            self.cart.remove(item_id)?;
            debug!(item_id, "cart line removed");
            return Ok(0);
        }

        let limit = (self.available_stock(&item.product_id, item.variation_id.as_deref())
            + item.quantity)
            .min(MAX_ITEM_QUANTITY);
        let quantity = qty.min(limit);
        if quantity < 1 {
            self.cart.remove(item_id)?;
            debug!(item_id, "cart line removed, no stock left");
            return Ok(0);
        }

        self.cart.item_mut(item_id)?.quantity = quantity;
        if quantity < qty {
            debug!(item_id, requested = qty, quantity, "quantity clamped to stock");
        }
        Ok(quantity)
    }

    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<CartItem> {
        let item = self.cart.remove(item_id).map_err(refused)?;
        debug!(item_id, "cart line removed");
        Ok(item)
    }

    /// Replaces a line's modifiers. Totals follow on the next read.
    pub fn update_modifiers(
        &mut self,
        item_id: &str,
        modifiers: Vec<SelectedModifier>,
    ) -> CoreResult<()> {
        validate_modifiers(&modifiers).map_err(|e| refused(e.into()))?;
        self.cart.item_mut(item_id).map_err(refused)?.modifiers = modifiers;
        Ok(())
    }

    /// Removes a line under the void-items permission.
    ///
    /// With a shift open the line's value is written to the ledger as a
    /// `void` transaction so the removal shows up on the shift audit.
    pub fn void_item(&mut self, item_id: &str, reason: &str) -> CoreResult<CartItem> {
        self.require_permission(Permission::VoidItems)?;
        let user_id = self.require_user()?.id.clone();
        let Some(item) = self.cart.item(item_id) else {
            return refuse(CoreError::CartItemNotFound(item_id.to_string()));
        };

        if self.current_shift.is_some() {
            let txn = Transaction::new(TransactionType::Void, item.total_price(), user_id, "")
                .with_note(format!("Voided: {} - {}", item.product_name, reason))
                .training(self.training_mode);
            self.append_transaction(txn)?;
        }

        let item = self.cart.remove(item_id)?;
        info!(item_id, value = %item.total_price(), reason, "cart line voided");
        Ok(item)
    }

    // =========================================================================
    // Line pricing
    // =========================================================================

    /// Sets a line discount. Refused while an order discount is set.
    pub fn apply_item_discount(
        &mut self,
        item_id: &str,
        discount: Discount,
        reason: Option<String>,
    ) -> CoreResult<()> {
        if self.cart.discount.is_some() {
            return refuse(CoreError::DiscountConflict);
        }
        check_discount(discount)?;
        let item = self.cart.item_mut(item_id).map_err(refused)?;
        item.discount = Some(discount);
        item.discount_reason = reason;
        debug!(item_id, ?discount, "line discount applied");
        Ok(())
    }

    pub fn clear_item_discount(&mut self, item_id: &str) -> CoreResult<()> {
        let item = self.cart.item_mut(item_id).map_err(refused)?;
        item.discount = None;
        item.discount_reason = None;
        Ok(())
    }

    /// Replaces a line's unit price. Modifier prices still apply on top.
    pub fn set_override_price(
        &mut self,
        item_id: &str,
        price: Money,
        reason: Option<String>,
    ) -> CoreResult<()> {
        self.require_permission(Permission::PriceOverride)?;
        if price.is_negative() {
            return refuse(
                ValidationError::OutOfRange {
                    field: "price".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        let item = self.cart.item_mut(item_id).map_err(refused)?;
        let was = item.effective_unit_price();
        item.price_override = Some(price);
        item.override_reason = reason;
        info!(item_id, was = %was, now = %price, "price overridden");
        Ok(())
    }

    pub fn set_item_seat(&mut self, item_id: &str, seat: Option<u32>) -> CoreResult<()> {
        self.cart.item_mut(item_id).map_err(refused)?.seat_number = seat;
        Ok(())
    }

    pub fn set_item_course(&mut self, item_id: &str, course: Option<Course>) -> CoreResult<()> {
        self.cart.item_mut(item_id).map_err(refused)?.course = course;
        Ok(())
    }

    // =========================================================================
    // Cart-level fields
    // =========================================================================

    pub fn set_customer(&mut self, customer_id: Option<&str>) -> CoreResult<()> {
        if let Some(id) = customer_id {
            if self.customer(id).is_none() {
                return refuse(CoreError::CustomerNotFound(id.to_string()));
            }
        }
        self.cart.customer_id = customer_id.map(str::to_string);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.cart.notes = notes.into();
    }

    /// Sets the order discount. Refused while any line carries a discount.
    pub fn set_order_discount(&mut self, discount: Discount) -> CoreResult<()> {
        if self.cart.has_item_discounts() {
            return refuse(CoreError::DiscountConflict);
        }
        check_discount(discount)?;
        self.cart.discount = Some(discount);
        debug!(?discount, "order discount set");
        Ok(())
    }

    pub fn clear_order_discount(&mut self) {
        self.cart.discount = None;
    }

    pub fn set_tax_rate(&mut self, tax_rate: TaxRate) -> CoreResult<()> {
        crate::validation::validate_tax_rate_bps(tax_rate.bps()).map_err(|e| refused(e.into()))?;
        self.cart.tax_rate = tax_rate;
        Ok(())
    }

    pub fn set_tip(&mut self, tip: Money) -> CoreResult<()> {
        if tip.is_negative() {
            return refuse(
                ValidationError::OutOfRange {
                    field: "tip".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        self.cart.tip = tip;
        Ok(())
    }

    pub fn set_order_type(&mut self, order_type: OrderType) {
        self.cart.order_type = order_type;
    }

    /// Drops every line and cart-level field.
    pub fn clear_cart(&mut self) {
        self.cart = Cart::new(self.default_tax_rate);
    }

    // =========================================================================
    // Parked sales
    // =========================================================================

    /// Sets the active cart aside and starts a fresh one.
    pub fn park_sale(&mut self) -> CoreResult<&ParkedSale> {
        let user_id = self.require_user()?.id.clone();
        if self.cart.is_empty() {
            return refuse(CoreError::EmptyCart);
        }
        let cart = std::mem::replace(&mut self.cart, Cart::new(self.default_tax_rate));
        let parked = ParkedSale {
            id: crate::new_id(),
            cart,
            user_id,
            parked_at: Utc::now(),
        };
        info!(parked_id = %parked.id, items = parked.cart.items.len(), "sale parked");
        self.parked_sales.push(parked);
        let idx = self.parked_sales.len() - 1;
        Ok(&self.parked_sales[idx])
    }

    /// Brings a parked cart back. Refused over a non-empty active cart.
    pub fn restore_parked_sale(&mut self, parked_id: &str) -> CoreResult<()> {
        if !self.cart.is_empty() {
            return refuse(CoreError::CartNotEmpty);
        }
        let Some(idx) = self.parked_sales.iter().position(|p| p.id == parked_id) else {
            return refuse(CoreError::ParkedSaleNotFound(parked_id.to_string()));
        };
        self.cart = self.parked_sales.remove(idx).cart;
        info!(parked_id, "parked sale restored");
        Ok(())
    }

    pub fn delete_parked_sale(&mut self, parked_id: &str) -> CoreResult<ParkedSale> {
        let Some(idx) = self.parked_sales.iter().position(|p| p.id == parked_id) else {
            return refuse(CoreError::ParkedSaleNotFound(parked_id.to_string()));
        };
        Ok(self.parked_sales.remove(idx))
    }

    pub fn parked_sales(&self) -> &[ParkedSale] {
        &self.parked_sales
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Adds the product a scanned code resolves to. Every scan is recorded,
    /// including misses.
    pub fn add_product_by_code(&mut self, code: &str) -> CoreResult<String> {
        let resolved = self
            .catalog
            .find_by_code(code)
            .map(|(p, v)| (p.id.clone(), p.name.clone(), v.map(|v| v.id.clone())));

        let result = match &resolved {
            Some((product_id, _, variation_id)) => {
                self.add_item(product_id, variation_id.as_deref(), Vec::new())
            }
            None => refuse(CoreError::ProductNotFound(code.to_string())),
        };

        self.scans.push(ScanRecord {
            code: code.to_string(),
            timestamp: Utc::now(),
            product_id: resolved.as_ref().map(|(id, _, _)| id.clone()),
            product_name: resolved.map(|(_, name, _)| name),
            success: result.is_ok(),
        });
        result
    }

    /// Newest first.
    pub fn recent_scans(&self, limit: usize) -> Vec<&ScanRecord> {
        self.scans.iter().rev().take(limit).collect()
    }
}

fn check_discount(discount: Discount) -> CoreResult<()> {
    let out_of_range = match discount {
        Discount::Percentage(bps) => bps > 10_000,
        Discount::Fixed(amount) => amount.is_negative(),
    };
    if out_of_range {
        return refuse(
            ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 10_000,
            }
            .into(),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::MAX_CART_ITEMS;

    #[test]
    fn test_same_product_twice_merges() {
        let mut store = open_store();
        let a = store.add_item("fries", None, Vec::new()).unwrap();
        let b = store.add_item("fries", None, Vec::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.cart().items.len(), 1);
        assert_eq!(store.cart().items[0].quantity, 2);
    }

    #[test]
    fn test_modified_lines_stay_separate() {
        let mut store = open_store();
        store.add_item("fries", None, Vec::new()).unwrap();
        let salt = SelectedModifier {
            id: "salt".into(),
            name: "Extra salt".into(),
            price: Money::zero(),
            quantity: 1,
        };
        store.add_item("fries", None, vec![salt]).unwrap();
        assert_eq!(store.cart().items.len(), 2);
    }

    #[test]
    fn test_modifiers_cannot_credit_a_line() {
        let mut store = open_store();
        let salt = SelectedModifier {
            id: "salt".into(),
            name: "Extra salt".into(),
            price: Money::from_cents(50),
            quantity: 1,
        };
        let negative_qty = SelectedModifier {
            quantity: -2,
            ..salt.clone()
        };
        let negative_price = SelectedModifier {
            price: Money::from_cents(-500),
            ..salt.clone()
        };
        assert!(store.add_item("fries", None, vec![negative_qty.clone()]).is_err());
        assert!(store.add_item("fries", None, vec![negative_price.clone()]).is_err());
        assert!(store.cart().is_empty());

        let id = store.add_item("fries", None, vec![salt]).unwrap();
        assert!(store.update_modifiers(&id, vec![negative_qty]).is_err());
        assert!(store.update_modifiers(&id, vec![negative_price]).is_err());
        assert_eq!(store.cart().item(&id).unwrap().modifiers[0].quantity, 1);
        assert_eq!(store.cart().totals().subtotal.cents(), 400);
    }

    #[test]
    fn test_add_refuses_when_out_of_stock() {
        let mut store = open_store();
        for _ in 0..5 {
            store.add_item("burger", None, Vec::new()).unwrap();
        }
        assert_eq!(store.available_stock("burger", None), 0);
        let before = store.cart().clone();
        assert_eq!(
            store.add_item("burger", None, Vec::new()),
            Err(CoreError::OutOfStock {
                product_id: "burger".into()
            })
        );
        assert_eq!(store.cart(), &before);
    }

    #[test]
    fn test_variation_stock_is_separate() {
        let mut store = open_store();
        store.add_item("hoodie", Some("hoodie-xl"), Vec::new()).unwrap();
        assert!(store.add_item("hoodie", Some("hoodie-xl"), Vec::new()).is_err());
        assert!(store.add_item("hoodie", Some("hoodie-m"), Vec::new()).is_ok());
        assert!(matches!(
            store.add_item("hoodie", Some("hoodie-s"), Vec::new()),
            Err(CoreError::VariationNotFound { .. })
        ));
    }

    #[test]
    fn test_update_quantity_clamps_to_stock() {
        let mut store = open_store();
        let id = store.add_item("burger", None, Vec::new()).unwrap();
        assert_eq!(store.update_quantity(&id, 9), Ok(5));
        assert_eq!(store.available_stock("burger", None), 0);

        // idempotent
        let total = store.cart().items[0].total_price();
        store.update_quantity(&id, 3).unwrap();
        store.update_quantity(&id, 3).unwrap();
        assert_eq!(store.cart().items[0].quantity, 3);
        assert_ne!(store.cart().items[0].total_price(), total);
        assert_eq!(store.cart().items[0].total_price().cents(), 3000);

        assert_eq!(store.update_quantity(&id, 0), Ok(0));
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_untracked_product_capped_at_max_quantity() {
        let mut store = open_store();
        let id = store.add_item("fries", None, Vec::new()).unwrap();
        assert_eq!(store.update_quantity(&id, 5_000), Ok(MAX_ITEM_QUANTITY));
    }

    #[test]
    fn test_discount_exclusivity() {
        let mut store = open_store();
        let id = store.add_item("fries", None, Vec::new()).unwrap();
        store
            .apply_item_discount(&id, Discount::Percentage(1_000), Some("staff".into()))
            .unwrap();
        assert_eq!(
            store.set_order_discount(Discount::Percentage(500)),
            Err(CoreError::DiscountConflict)
        );

        store.clear_item_discount(&id).unwrap();
        store.set_order_discount(Discount::Percentage(500)).unwrap();
        assert_eq!(
            store.apply_item_discount(&id, Discount::Fixed(Money::from_cents(50)), None),
            Err(CoreError::DiscountConflict)
        );
        assert!(store.set_order_discount(Discount::Percentage(10_001)).is_err());
    }

    #[test]
    fn test_override_requires_permission() {
        let mut store = open_store();
        let id = store.add_item("fries", None, Vec::new()).unwrap();
        store.sign_in_with_pin("1111").unwrap();
        assert_eq!(
            store.set_override_price(&id, Money::from_cents(100), None),
            Err(CoreError::PermissionDenied(Permission::PriceOverride))
        );
        assert_eq!(store.cart().items[0].price_override, None);

        store.sign_in_with_pin("2222").unwrap();
        store
            .set_override_price(&id, Money::from_cents(100), Some("damaged".into()))
            .unwrap();
        assert_eq!(store.cart().totals().subtotal.cents(), 100);
    }

    #[test]
    fn test_void_item_logs_line_value() {
        let mut store = open_store();
        let id = store.add_item("burger", None, Vec::new()).unwrap();
        store.update_quantity(&id, 2).unwrap();
        store.void_item(&id, "wrong item").unwrap();
        assert!(store.cart().is_empty());

        let shift = store.current_shift().unwrap();
        assert_eq!(shift.transactions.len(), 1);
        let txn = &shift.transactions[0];
        assert_eq!(txn.kind, TransactionType::Void);
        assert_eq!(txn.amount.cents(), 2000);
        assert_eq!(txn.shift_id, shift.id);
        assert_eq!(txn.note.as_deref(), Some("Voided: Burger - wrong item"));
    }

    #[test]
    fn test_void_item_refused_without_permission() {
        let mut store = open_store();
        let id = store.add_item("fries", None, Vec::new()).unwrap();
        store.sign_out();
        assert!(store.void_item(&id, "x").is_err());
        assert_eq!(store.cart().items.len(), 1);
    }

    #[test]
    fn test_park_and_restore() {
        let mut store = open_store();
        assert_eq!(store.park_sale().err(), Some(CoreError::EmptyCart));

        store.add_item("fries", None, Vec::new()).unwrap();
        store.set_notes("window seat");
        let parked_id = store.park_sale().unwrap().id.clone();
        assert!(store.cart().is_empty());
        assert_eq!(store.parked_sales().len(), 1);

        store.add_item("burger", None, Vec::new()).unwrap();
        assert_eq!(
            store.restore_parked_sale(&parked_id),
            Err(CoreError::CartNotEmpty)
        );
        store.clear_cart();
        store.restore_parked_sale(&parked_id).unwrap();
        assert_eq!(store.cart().notes, "window seat");
        assert!(store.parked_sales().is_empty());
        assert!(store.delete_parked_sale(&parked_id).is_err());
    }

    #[test]
    fn test_scan_records_hits_and_misses() {
        let mut store = open_store();
        store.add_product_by_code("400100").unwrap();
        store.add_product_by_code("HOOD-M").unwrap();
        assert!(store.add_product_by_code("000000").is_err());

        let scans = store.recent_scans(10);
        assert_eq!(scans.len(), 3);
        assert!(!scans[0].success);
        assert_eq!(scans[1].product_id.as_deref(), Some("hoodie"));
        assert_eq!(store.cart().items[1].variation_id.as_deref(), Some("hoodie-m"));
        assert_eq!(store.recent_scans(1).len(), 1);
    }

    #[test]
    fn test_cart_line_limit() {
        let mut store = open_store();
        let salt = |n: usize| SelectedModifier {
            id: format!("m{n}"),
            name: "Salt".into(),
            price: Money::zero(),
            quantity: 1,
        };
        for n in 0..MAX_CART_ITEMS {
            store.add_item("fries", None, vec![salt(n)]).unwrap();
        }
        assert_eq!(
            store.add_item("fries", None, vec![salt(0)]),
            Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS })
        );
    }

    #[test]
    fn test_set_customer_requires_known_customer() {
        let mut store = open_store();
        assert!(store.set_customer(Some("nobody")).is_err());
        let id = store
            .add_customer(crate::customer::CustomerDraft::new("Ada", "Lovelace"))
            .unwrap()
            .id
            .clone();
        store.set_customer(Some(&id)).unwrap();
        assert_eq!(store.cart().customer_id.as_deref(), Some(id.as_str()));
    }
}
