//! # Checkout, Voids, Returns and Exchanges
//!
//! ## Checkout Side Effects
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  checkout(request)                                                   │
//! │    1. shift open? user signed in? cart non-empty? gift cards cover?  │
//! │       any "no" ──► Err, nothing touched                              │
//! │    2. order number ◄── shift counter                                 │
//! │    3. Order::from_cart, auto-fire dine-in table orders               │
//! │    4. shift.orders += order, shift.transactions += sale              │
//! │    5. unless training:                                               │
//! │         gift cards redeemed                                          │
//! │         stock decremented  (per line, not atomic, see stock.rs)      │
//! │         customer analytics recomputed                                │
//! │    6. cart reset                                                     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Voids mutate the original order. Returns and exchanges append new
//! orders linked through `returned_order_id`, each with its own number.
//! Neither path restocks.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{refuse, refused, PosStore};
use crate::cart::{Cart, CartItem};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::Transaction;
use crate::money::Money;
use crate::order::{CheckoutRequest, Order, OrderContext, OrderItem, PaymentLine};
use crate::stock;
use crate::types::{FireStatus, KitchenStatus, OrderStatus, PaymentMethod, Permission, TransactionType};
use crate::validation::validate_cart_item;

/// Result of an exchange: the refund for the returned lines and the paid
/// order for the replacements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub refund: Order,
    pub replacement: Order,
}

impl PosStore {
    // =========================================================================
    // Checkout
    // =========================================================================

    pub fn checkout(&mut self, request: CheckoutRequest) -> CoreResult<Order> {
        let user_id = self.require_user()?.id.clone();
        self.require_shift()?;
        if self.cart.is_empty() {
            return refuse(CoreError::EmptyCart);
        }
        if request.payments.iter().any(|p| p.amount.is_negative()) {
            return refuse(
                ValidationError::OutOfRange {
                    field: "payments".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        if let Some(tip) = request.tip.filter(|t| t.is_negative()) {
            debug!(tip = %tip, "negative tip");
            return refuse(
                ValidationError::OutOfRange {
                    field: "tip".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        let gift_card_draws = self.check_gift_card_payments(&request.payments)?;

        let training = self.training_mode;
        let tip = request.tip.unwrap_or(self.cart.tip);
        let shift = self.shift_mut()?;
        let shift_id = shift.id.clone();
        let ctx = OrderContext {
            order_number: shift.take_order_number(),
            shift_id: &shift_id,
            user_id: &user_id,
            is_training: training,
        };
        let mut order = Order::from_cart(&self.cart, request.payments, tip, request.hold, ctx);
        if order.fire_status == FireStatus::AutoFired {
            order.fire(FireStatus::AutoFired);
        }

        let sale = Transaction::new(TransactionType::Sale, order.total, &user_id, &shift_id)
            .with_order(&order.id)
            .with_method(order.primary_payment_method())
            .training(training);
        let shift = self.shift_mut()?;
        shift.orders.push(order.clone());
        shift.transactions.push(sale);

        if !training {
            for (card_number, amount) in gift_card_draws {
                self.redeem_gift_card(&card_number, amount)?;
            }
            stock::decrement(&mut self.catalog, &order.items);
            if let Some(customer_id) = order.customer_id.as_deref() {
                self.refresh_customer_analytics(customer_id);
            }
        }

        self.cart = Cart::new(self.default_tax_rate);
        info!(
            order_id = %order.id,
            order_number = order.order_number,
            total = %order.total,
            items = order.items.len(),
            training,
            "order created"
        );
        Ok(order)
    }

    /// Totals per gift card drawn on by `payments`, refused unless every
    /// gift card line names a card and every card is active and can cover
    /// its draw.
    fn check_gift_card_payments(&self, payments: &[PaymentLine]) -> CoreResult<Vec<(String, Money)>> {
        let mut draws: BTreeMap<&str, Money> = BTreeMap::new();
        for payment in payments.iter().filter(|p| p.method == PaymentMethod::GiftCard) {
            let Some(number) = payment.gift_card_number.as_deref() else {
                return refuse(
                    ValidationError::Required {
                        field: "gift_card_number".to_string(),
                    }
                    .into(),
                );
            };
            *draws.entry(number).or_default() += payment.amount;
        }
        for (number, amount) in &draws {
            let Some(card) = self
                .gift_cards
                .iter()
                .find(|c| c.card_number == *number && c.is_active)
            else {
                return refuse(CoreError::GiftCardNotFound(number.to_string()));
            };
            if card.balance < *amount {
                return refuse(CoreError::InsufficientGiftCardBalance {
                    card_number: number.to_string(),
                });
            }
        }
        // zero draws leave the card untouched
        Ok(draws
            .into_iter()
            .filter(|(_, a)| a.is_positive())
            .map(|(n, a)| (n.to_string(), a))
            .collect())
    }

    // =========================================================================
    // Void
    // =========================================================================

    /// Voids a paid order in the open shift.
    ///
    /// The order keeps its number and lines; a `void` transaction carries the
    /// negated total. Stock is not restored.
    pub fn void_order(&mut self, order_id: &str, reason: &str) -> CoreResult<&Order> {
        self.require_shift()?;
        self.require_permission(Permission::VoidTransactions)?;
        let user_id = self.require_user()?.id.clone();
        let shift = self.require_shift()?;
        let Some(order) = shift.order(order_id) else {
            return refuse(CoreError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Paid {
            return refuse(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: order.status,
            });
        }

        let void = Transaction::new(TransactionType::Void, -order.total, &user_id, "")
            .with_order(order_id)
            .with_method(order.primary_payment_method())
            .with_note(reason)
            .training(order.is_training);
        let customer_id = order.customer_id.clone();
        self.append_transaction(void)?;

        let order = self
            .shift_mut()?
            .order_mut(order_id)
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        order.status = OrderStatus::Voided;
        order.void_reason = Some(reason.to_string());
        order.voided_by = Some(user_id);
        order.voided_at = Some(Utc::now());
        info!(order_id, total = %order.total, reason, "order voided");

        if let Some(customer_id) = customer_id.as_deref() {
            self.refresh_customer_analytics(customer_id);
        }
        self.current_shift
            .as_ref()
            .and_then(|s| s.order(order_id))
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))
    }

    // =========================================================================
    // Returns and exchanges
    // =========================================================================

    /// Refunds lines of a paid order from any shift into the open shift.
    ///
    /// `item_ids` are order line ids. Lines already covered by an earlier
    /// return of the same order are dropped; if nothing is left the return
    /// is refused.
    pub fn return_order(
        &mut self,
        order_id: &str,
        item_ids: &[&str],
        reason: &str,
    ) -> CoreResult<Order> {
        let (original, lines) = self.plan_return(order_id, item_ids)?;
        self.record_return(&original, lines, reason)
    }

    /// Returns lines of a paid order and sells replacement lines in one step.
    ///
    /// The replacement order is charged at the active cart's tax rate, paid
    /// with the original's first payment method and linked back to the
    /// original. Stock on record must cover every replacement line.
    pub fn exchange_order(
        &mut self,
        order_id: &str,
        return_item_ids: &[&str],
        replacement_items: Vec<CartItem>,
    ) -> CoreResult<ExchangeOutcome> {
        let (original, lines) = self.plan_return(order_id, return_item_ids)?;
        if replacement_items.is_empty() {
            return refuse(CoreError::EmptyCart);
        }
        for item in &replacement_items {
            validate_cart_item(item).map_err(|e| refused(e.into()))?;
        }
        let mut wanted: BTreeMap<(&str, Option<&str>), i64> = BTreeMap::new();
        for item in &replacement_items {
            *wanted
                .entry((item.product_id.as_str(), item.variation_id.as_deref()))
                .or_default() += item.quantity;
        }
        for ((product_id, variation_id), qty) in wanted {
            if stock::stock_on_record(&self.catalog, product_id, variation_id) < qty {
                return refuse(CoreError::OutOfStock {
                    product_id: product_id.to_string(),
                });
            }
        }

        let refund = self.record_return(&original, lines, "Exchange")?;

        let user_id = self.require_user()?.id.clone();
        let training = self.training_mode;
        let mut cart = Cart::new(self.cart.tax_rate);
        cart.items = replacement_items;
        cart.customer_id = original.customer_id.clone();
        cart.order_type = original.order_type;
        let method = original
            .primary_payment_method()
            .unwrap_or(PaymentMethod::Cash);
        let payments = vec![PaymentLine::new(method, cart.totals().total)];

        let shift = self.shift_mut()?;
        let shift_id = shift.id.clone();
        let ctx = OrderContext {
            order_number: shift.take_order_number(),
            shift_id: &shift_id,
            user_id: &user_id,
            is_training: training,
        };
        let mut replacement = Order::from_cart(&cart, payments, Money::zero(), false, ctx);
        replacement.notes = Some(format!("Exchange from order #{}", original.order_number));
        replacement.returned_order_id = Some(original.id.clone());

        let exchange = Transaction::new(TransactionType::Exchange, replacement.total, &user_id, &shift_id)
            .with_order(&replacement.id)
            .with_method(Some(method))
            .with_note(format!("Exchange from order #{}", original.order_number))
            .training(training);
        let shift = self.shift_mut()?;
        shift.orders.push(replacement.clone());
        shift.transactions.push(exchange);

        if !training {
            stock::decrement(&mut self.catalog, &replacement.items);
            if let Some(customer_id) = replacement.customer_id.as_deref() {
                self.refresh_customer_analytics(customer_id);
            }
        }
        info!(
            original_id = %original.id,
            refund_id = %refund.id,
            replacement_id = %replacement.id,
            net = %(replacement.total + refund.total),
            "order exchanged"
        );
        Ok(ExchangeOutcome {
            refund,
            replacement,
        })
    }

    /// Checks a return and picks the lines it covers. Touches nothing.
    fn plan_return(&self, order_id: &str, item_ids: &[&str]) -> CoreResult<(Order, Vec<OrderItem>)> {
        self.require_shift()?;
        self.require_permission(Permission::ProcessReturns)?;
        self.require_user()?;
        let Some(original) = self.order(order_id) else {
            return refuse(CoreError::OrderNotFound(order_id.to_string()));
        };
        if original.status != OrderStatus::Paid {
            return refuse(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: original.status,
            });
        }

        let already_returned: HashSet<&str> = self
            .all_orders()
            .filter(|o| {
                o.status == OrderStatus::Returned && o.returned_order_id.as_deref() == Some(order_id)
            })
            .flat_map(|o| o.items.iter().map(|i| i.id.as_str()))
            .collect();
        let lines: Vec<OrderItem> = original
            .items
            .iter()
            .filter(|i| item_ids.contains(&i.id.as_str()) && !already_returned.contains(i.id.as_str()))
            .cloned()
            .collect();
        if lines.is_empty() {
            return refuse(CoreError::NothingToReturn(order_id.to_string()));
        }
        Ok((original.clone(), lines))
    }

    fn record_return(&mut self, original: &Order, lines: Vec<OrderItem>, reason: &str) -> CoreResult<Order> {
        let user_id = self.require_user()?.id.clone();
        let training = self.training_mode;
        let shift = self.shift_mut()?;
        let shift_id = shift.id.clone();
        let ctx = OrderContext {
            order_number: shift.take_order_number(),
            shift_id: &shift_id,
            user_id: &user_id,
            is_training: training,
        };
        let refund = Order::refund_of(original, lines, reason, ctx);
        let txn = Transaction::new(TransactionType::Return, refund.total, &user_id, &shift_id)
            .with_order(&refund.id)
            .with_method(refund.primary_payment_method())
            .with_note(reason)
            .training(training);
        shift.orders.push(refund.clone());
        shift.transactions.push(txn);
        info!(
            order_id = %refund.id,
            original_id = %original.id,
            total = %refund.total,
            reason,
            "order returned"
        );
        Ok(refund)
    }

    // =========================================================================
    // Kitchen
    // =========================================================================

    /// Sends a held order to the kitchen.
    pub fn fire_order(&mut self, order_id: &str) -> CoreResult<()> {
        let shift = self.require_shift()?;
        let Some(order) = shift.order(order_id) else {
            return refuse(CoreError::OrderNotFound(order_id.to_string()));
        };
        if order.status != OrderStatus::Paid || order.kitchen_status.is_some() {
            return refuse(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: order.status,
            });
        }
        if let Some(order) = self.shift_mut()?.order_mut(order_id) {
            order.fire(FireStatus::ManuallyFired);
        }
        info!(order_id, "order fired to kitchen");
        Ok(())
    }

    /// Moves a fired order along the kitchen display.
    pub fn update_kitchen_status(&mut self, order_id: &str, status: KitchenStatus) -> CoreResult<()> {
        let shift = self.require_shift()?;
        let Some(order) = shift.order(order_id) else {
            return refuse(CoreError::OrderNotFound(order_id.to_string()));
        };
        if order.kitchen_status.is_none() {
            return refuse(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                status: order.status,
            });
        }
        if let Some(order) = self.shift_mut()?.order_mut(order_id) {
            order.kitchen_status = Some(status);
        }
        debug!(order_id, ?status, "kitchen status updated");
        Ok(())
    }

    /// Today's paid kitchen orders not yet served, held ones included.
    pub fn kitchen_orders(&self) -> Vec<&Order> {
        let today = Utc::now().date_naive();
        self.all_orders()
            .filter(|o| {
                o.status == OrderStatus::Paid
                    && !o.is_training
                    && o.fire_status != FireStatus::NotApplicable
                    && o.kitchen_status != Some(KitchenStatus::Served)
                    && o.created_at.date_naive() == today
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::cart::SelectedModifier;
    use crate::customer::CustomerDraft;
    use crate::table::RestaurantTable;
    use crate::types::OrderType;

    fn card(amount: Money) -> CheckoutRequest {
        CheckoutRequest::new(vec![PaymentLine::card(amount, "4242")])
    }

    /// Two burgers at $10, 8% tax: $21.60.
    fn sell_two_burgers(store: &mut PosStore) -> Order {
        let id = store.add_item("burger", None, Vec::new()).unwrap();
        store.update_quantity(&id, 2).unwrap();
        let total = store.cart().totals().total;
        store
            .checkout(CheckoutRequest::new(vec![PaymentLine::cash(
                total,
                Money::from_cents(2_500),
            )]))
            .unwrap()
    }

    #[test]
    fn test_checkout_scenario() {
        let mut store = open_store();
        let order = sell_two_burgers(&mut store);
        assert_eq!(order.order_number, 1);
        assert_eq!(order.subtotal.cents(), 2_000);
        assert_eq!(order.tax.cents(), 160);
        assert_eq!(order.total.cents(), 2_160);
        assert_eq!(order.payments[0].change, Some(Money::from_cents(340)));
        assert_eq!(order.items_total(), order.subtotal);

        assert!(store.cart().is_empty());
        assert_eq!(store.catalog().get("burger").unwrap().stock_quantity, Some(3));

        let shift = store.current_shift().unwrap();
        assert_eq!(shift.orders.len(), 1);
        assert_eq!(shift.transactions[0].kind, TransactionType::Sale);
        assert_eq!(shift.transactions[0].amount.cents(), 2_160);
        assert_eq!(shift.transactions[0].order_id.as_deref(), Some(order.id.as_str()));
    }

    #[test]
    fn test_checkout_preconditions_leave_state_alone() {
        let mut store = open_store();
        assert_eq!(store.checkout(card(Money::zero())), Err(CoreError::EmptyCart));

        store.add_item("fries", None, Vec::new()).unwrap();
        store.sign_out();
        assert_eq!(
            store.checkout(card(Money::from_cents(378))),
            Err(CoreError::NoCurrentUser)
        );
        assert_eq!(store.cart().items.len(), 1);
        assert!(store.current_shift().unwrap().orders.is_empty());

        let mut closed = PosStore::new(catalog());
        closed.set_current_user(Some(manager()));
        closed.add_item("fries", None, Vec::new()).unwrap();
        assert_eq!(
            closed.checkout(card(Money::from_cents(378))),
            Err(CoreError::NoOpenShift)
        );
    }

    #[test]
    fn test_order_numbers_increase_by_one() {
        let mut store = open_store();
        let first = sell_two_burgers(&mut store);
        store.add_item("fries", None, Vec::new()).unwrap();
        let second = store.checkout(card(Money::from_cents(378))).unwrap();
        let refund = store.return_order(&first.id, &[first.items[0].id.as_str()], "cold").unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        let fourth = store.checkout(card(Money::from_cents(378))).unwrap();
        assert_eq!(
            [first.order_number, second.order_number, refund.order_number, fourth.order_number],
            [1, 2, 3, 4]
        );
    }

    #[test]
    fn test_checkout_tip_override() {
        let mut store = open_store();
        store.add_item("fries", None, Vec::new()).unwrap();
        store.set_tip(Money::from_cents(100)).unwrap();
        let order = store
            .checkout(card(Money::from_cents(578)).with_tip(Money::from_cents(200)))
            .unwrap();
        assert_eq!(order.tip.cents(), 200);
        assert_eq!(order.total, order.subtotal - order.discount + order.tax + order.tip);
    }

    #[test]
    fn test_training_mode_skips_stock_and_analytics() {
        let mut store = open_store();
        let customer_id = store.add_customer(CustomerDraft::new("Ada", "L")).unwrap().id.clone();
        store.set_training_mode(true);
        store.set_customer(Some(&customer_id)).unwrap();
        let order = sell_two_burgers(&mut store);
        assert!(order.is_training);
        assert_eq!(store.catalog().get("burger").unwrap().stock_quantity, Some(5));
        assert_eq!(store.customer_analytics(&customer_id).unwrap().visit_count, 0);
        assert!(store.current_shift().unwrap().transactions[0].is_training);
    }

    #[test]
    fn test_checkout_updates_customer_analytics() {
        let mut store = open_store();
        let customer_id = store.add_customer(CustomerDraft::new("Ada", "L")).unwrap().id.clone();
        store.set_customer(Some(&customer_id)).unwrap();
        sell_two_burgers(&mut store);
        store.set_customer(Some(&customer_id)).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        store.checkout(card(Money::from_cents(378))).unwrap();

        let cached = store.customer(&customer_id).unwrap().analytics;
        assert_eq!(cached.visit_count, 2);
        assert_eq!(cached.total_spent.cents(), 2_160 + 378);
        assert_eq!(cached.average_order_value.cents(), 1_269);
        assert_eq!(store.customer_analytics(&customer_id).unwrap(), cached);
    }

    #[test]
    fn test_gift_card_payment_redeems_balance() {
        let mut store = open_store();
        let gc = store.create_gift_card(Money::from_cents(1_000)).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        // 1050 + 84 tax
        let over = CheckoutRequest::new(vec![PaymentLine::gift_card(
            Money::from_cents(1_134),
            &gc.card_number,
        )]);
        assert!(matches!(
            store.checkout(over),
            Err(CoreError::InsufficientGiftCardBalance { .. })
        ));
        assert_eq!(store.cart().items.len(), 1);

        let split = CheckoutRequest::new(vec![
            PaymentLine::gift_card(Money::from_cents(1_000), &gc.card_number),
            PaymentLine::cash(Money::from_cents(134), Money::from_cents(200)),
        ]);
        store.checkout(split).unwrap();
        assert_eq!(store.gift_card_balance(&gc.card_number), Money::zero());
    }

    #[test]
    fn test_gift_card_line_needs_card_number() {
        let mut store = open_store();
        store.add_item("fries", None, Vec::new()).unwrap();
        let numberless = CheckoutRequest::new(vec![PaymentLine::new(
            PaymentMethod::GiftCard,
            Money::from_cents(378),
        )]);
        assert_eq!(
            store.checkout(numberless),
            Err(CoreError::Validation(ValidationError::Required {
                field: "gift_card_number".into()
            }))
        );
        assert_eq!(store.cart().items.len(), 1);
        assert!(store.current_shift().unwrap().orders.is_empty());
        assert!(store.current_shift().unwrap().transactions.is_empty());
    }

    #[test]
    fn test_void_order() {
        let mut store = open_store();
        let order = sell_two_burgers(&mut store);
        let voided = store.void_order(&order.id, "customer left").unwrap();
        assert_eq!(voided.status, OrderStatus::Voided);
        assert_eq!(voided.voided_by.as_deref(), Some("manager"));
        assert_eq!(voided.void_reason.as_deref(), Some("customer left"));

        let txn = store.current_shift().unwrap().transactions.last().unwrap().clone();
        assert_eq!(txn.kind, TransactionType::Void);
        assert_eq!(txn.amount, -order.total);
        // no restock
        assert_eq!(store.catalog().get("burger").unwrap().stock_quantity, Some(3));

        assert!(matches!(
            store.void_order(&order.id, "again"),
            Err(CoreError::InvalidOrderStatus { .. })
        ));
    }

    #[test]
    fn test_void_requires_permission() {
        let mut store = open_store();
        let order = sell_two_burgers(&mut store);
        store.sign_in_with_pin("1111").unwrap();
        assert_eq!(
            store.void_order(&order.id, "x").err(),
            Some(CoreError::PermissionDenied(Permission::VoidTransactions))
        );
        assert_eq!(store.order(&order.id).unwrap().status, OrderStatus::Paid);
    }

    #[test]
    fn test_return_selected_lines_once() {
        let mut store = open_store();
        store.add_item("burger", None, Vec::new()).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        let order = store.checkout(card(Money::from_cents(1_458))).unwrap();
        let fries_line = order.items[1].id.clone();

        let refund = store.return_order(&order.id, &[fries_line.as_str()], "soggy").unwrap();
        assert_eq!(refund.status, OrderStatus::Returned);
        assert_eq!(refund.subtotal.cents(), -350);
        assert_eq!(refund.tax.cents(), -28);
        assert_eq!(refund.total.cents(), -378);
        assert_eq!(refund.returned_order_id.as_deref(), Some(order.id.as_str()));
        assert_eq!(refund.notes.as_deref(), Some("Return: soggy"));

        let txn = store.current_shift().unwrap().transactions.last().unwrap().clone();
        assert_eq!(txn.kind, TransactionType::Return);
        assert_eq!(txn.amount.cents(), -378);

        assert_eq!(
            store.return_order(&order.id, &[fries_line.as_str()], "again"),
            Err(CoreError::NothingToReturn(order.id.clone()))
        );
        assert_eq!(
            store.return_order(&order.id, &["not-a-line"], "x"),
            Err(CoreError::NothingToReturn(order.id.clone()))
        );
    }

    #[test]
    fn test_return_requires_permission() {
        let mut store = open_store();
        let order = sell_two_burgers(&mut store);
        store.sign_in_with_pin("1111").unwrap();
        let line = order.items[0].id.clone();
        assert_eq!(
            store.return_order(&order.id, &[line.as_str()], "x"),
            Err(CoreError::PermissionDenied(Permission::ProcessReturns))
        );
    }

    #[test]
    fn test_exchange_links_both_orders() {
        let mut store = open_store();
        store.add_item("hoodie", Some("hoodie-m"), Vec::new()).unwrap();
        let order = store.checkout(card(Money::from_cents(4_320))).unwrap();
        let line = order.items[0].id.clone();

        let hoodie = store.catalog().get("hoodie").unwrap().clone();
        let xl = CartItem::new(&hoodie, hoodie.variation("hoodie-xl"), Vec::new());
        let outcome = store.exchange_order(&order.id, &[line.as_str()], vec![xl]).unwrap();

        assert_eq!(outcome.refund.total.cents(), -4_320);
        assert_eq!(outcome.refund.order_number, 2);
        assert_eq!(outcome.replacement.order_number, 3);
        assert_eq!(outcome.replacement.status, OrderStatus::Paid);
        assert_eq!(outcome.replacement.total.cents(), 4_860);
        assert_eq!(
            outcome.replacement.returned_order_id.as_deref(),
            Some(order.id.as_str())
        );
        assert_eq!(
            outcome.replacement.primary_payment_method(),
            Some(PaymentMethod::Card)
        );
        assert_eq!(outcome.replacement.notes.as_deref(), Some("Exchange from order #1"));

        let hoodie = store.catalog().get("hoodie").unwrap();
        assert_eq!(hoodie.variation("hoodie-xl").unwrap().stock_quantity, 0);
        let last = store.current_shift().unwrap().transactions.last().unwrap().clone();
        assert_eq!(last.kind, TransactionType::Exchange);
        assert_eq!(last.amount.cents(), 4_860);
    }

    #[test]
    fn test_exchange_refused_without_stock() {
        let mut store = open_store();
        store.add_item("fries", None, Vec::new()).unwrap();
        let order = store.checkout(card(Money::from_cents(378))).unwrap();
        let line = order.items[0].id.clone();

        let hoodie = store.catalog().get("hoodie").unwrap().clone();
        let mut xl = CartItem::new(&hoodie, hoodie.variation("hoodie-xl"), Vec::new());
        xl.quantity = 2;
        assert_eq!(
            store.exchange_order(&order.id, &[line.as_str()], vec![xl]),
            Err(CoreError::OutOfStock {
                product_id: "hoodie".into()
            })
        );
        assert_eq!(store.current_shift().unwrap().orders.len(), 1);
    }

    #[test]
    fn test_exchange_refuses_invalid_replacement_lines() {
        let mut store = open_store();
        store.add_item("fries", None, Vec::new()).unwrap();
        let order = store.checkout(card(Money::from_cents(378))).unwrap();
        let line = order.items[0].id.clone();

        let burger = store.catalog().get("burger").unwrap().clone();
        let mut negative = CartItem::new(&burger, None, Vec::new());
        negative.quantity = -3;
        assert_eq!(
            store.exchange_order(&order.id, &[line.as_str()], vec![negative]),
            Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".into()
            }))
        );

        let credit = SelectedModifier {
            id: "credit".into(),
            name: "Credit".into(),
            price: Money::from_cents(-2_000),
            quantity: 1,
        };
        let discounted = CartItem::new(&burger, None, vec![credit]);
        assert!(store
            .exchange_order(&order.id, &[line.as_str()], vec![discounted])
            .is_err());

        assert_eq!(store.catalog().get("burger").unwrap().stock_quantity, Some(5));
        assert_eq!(store.current_shift().unwrap().orders.len(), 1);
        assert_eq!(store.current_shift().unwrap().transactions.len(), 1);
    }

    #[test]
    fn test_dine_in_fires_and_held_waits() {
        let mut store = open_store();
        let table = RestaurantTable::new(1, 2, "Main");
        let table_id = table.id.clone();
        store.add_table(table);

        store.assign_cart_to_table(&table_id).unwrap();
        store.add_item("fries", None, Vec::new()).unwrap();
        let fired = store.checkout(card(Money::from_cents(378))).unwrap();
        assert_eq!(fired.fire_status, FireStatus::AutoFired);
        assert_eq!(fired.kitchen_status, Some(KitchenStatus::New));
        assert!(fired.items.iter().all(|i| i.sent_to_kitchen));

        store.set_order_type(OrderType::Takeout);
        store.add_item("fries", None, Vec::new()).unwrap();
        let held = store.checkout(card(Money::from_cents(378)).held()).unwrap();
        assert_eq!(held.fire_status, FireStatus::Held);
        assert_eq!(store.kitchen_orders().len(), 2);

        assert!(store.update_kitchen_status(&held.id, KitchenStatus::Ready).is_err());
        store.fire_order(&held.id).unwrap();
        assert_eq!(
            store.order(&held.id).unwrap().fire_status,
            FireStatus::ManuallyFired
        );
        assert!(store.fire_order(&held.id).is_err());

        store.update_kitchen_status(&fired.id, KitchenStatus::Served).unwrap();
        assert_eq!(store.kitchen_orders().len(), 1);
        assert_eq!(store.table_orders(&table_id).len(), 1);
    }
}
