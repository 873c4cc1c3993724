//! # Orders
//!
//! The immutable record produced at checkout, its line items and payment
//! lines, plus tender evaluation for cash drawers.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Cart ──checkout──► Order { status: Paid, number: n }                   │
//! │                        │                                                │
//! │                        ├── void_order ──► same order, status Voided     │
//! │                        │                  + void transaction (−total)   │
//! │                        │                                                │
//! │                        ├── return_order ──► NEW order n+k, Returned,    │
//! │                        │                    negative totals, linked     │
//! │                        │                                                │
//! │                        └── exchange_order ──► return + NEW paid order   │
//! │                                               linked to the original    │
//! │                                                                         │
//! │  Orders are never deleted.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartItem, CartTotals, SelectedModifier};
use crate::money::{Money, TaxRate};
use crate::types::{Course, FireStatus, KitchenStatus, OrderStatus, OrderType, PaymentMethod};

// =============================================================================
// Tender
// =============================================================================

/// Result of comparing cash received against an amount due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tender {
    /// `max(0, received − total)`
    pub change_due: Money,
    /// `received ≥ total`
    pub is_valid: bool,
}

impl Tender {
    /// ```rust
    /// use aura_core::money::Money;
    /// use aura_core::order::Tender;
    ///
    /// let t = Tender::evaluate(Money::from_cents(2160), Money::from_cents(2500));
    /// assert_eq!(t.change_due.cents(), 340);
    /// assert!(t.is_valid);
    /// ```
    pub fn evaluate(total: Money, received: Money) -> Self {
        Tender {
            change_due: (received - total).max_zero(),
            is_valid: received >= total,
        }
    }
}

// =============================================================================
// Payment Line
// =============================================================================

/// One payment applied to an order.
///
/// `amount` is what the payment covers. For cash, `tendered` is what the
/// customer handed over and `change` what went back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentLine {
    pub method: PaymentMethod,
    pub amount: Money,
    pub tendered: Option<Money>,
    pub change: Option<Money>,
    pub card_last4: Option<String>,
    pub gift_card_number: Option<String>,
}

impl PaymentLine {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        PaymentLine {
            method,
            amount,
            tendered: None,
            change: None,
            card_last4: None,
            gift_card_number: None,
        }
    }

    /// Cash covering `amount` with `tendered` handed over.
    pub fn cash(amount: Money, tendered: Money) -> Self {
        let tender = Tender::evaluate(amount, tendered);
        PaymentLine {
            tendered: Some(tendered),
            change: Some(tender.change_due),
            ..PaymentLine::new(PaymentMethod::Cash, amount)
        }
    }

    pub fn card(amount: Money, last4: impl Into<String>) -> Self {
        PaymentLine {
            card_last4: Some(last4.into()),
            ..PaymentLine::new(PaymentMethod::Card, amount)
        }
    }

    pub fn gift_card(amount: Money, card_number: impl Into<String>) -> Self {
        PaymentLine {
            gift_card_number: Some(card_number.into()),
            ..PaymentLine::new(PaymentMethod::GiftCard, amount)
        }
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// Input to `PosStore::checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub payments: Vec<PaymentLine>,
    /// `None` uses the tip already on the cart.
    pub tip: Option<Money>,
    /// Hold the order instead of firing it to the kitchen.
    pub hold: bool,
}

impl CheckoutRequest {
    pub fn new(payments: Vec<PaymentLine>) -> Self {
        CheckoutRequest {
            payments,
            tip: None,
            hold: false,
        }
    }

    pub fn with_tip(mut self, tip: Money) -> Self {
        self.tip = Some(tip);
        self
    }

    pub fn held(mut self) -> Self {
        self.hold = true;
        self
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A cart line flattened into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub product_id: String,
    pub variation_id: Option<String>,
    pub sku: String,
    pub quantity: i64,
    /// Unit price charged (override if one was applied).
    pub unit_price: Money,
    pub modifiers: Vec<SelectedModifier>,
    /// Line total after line discount.
    pub line_total: Money,
    pub seat_number: Option<u32>,
    pub course: Option<Course>,
    pub sent_to_kitchen: bool,
    #[ts(as = "Option<String>")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl OrderItem {
    pub fn from_cart_item(item: &CartItem) -> Self {
        OrderItem {
            id: item.id.clone(),
            name: item.display_name(),
            product_id: item.product_id.clone(),
            variation_id: item.variation_id.clone(),
            sku: item.sku.clone(),
            quantity: item.quantity,
            unit_price: item.effective_unit_price(),
            modifiers: item.modifiers.clone(),
            line_total: item.total_price(),
            seat_number: item.seat_number,
            course: item.course,
            sent_to_kitchen: false,
            sent_at: None,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Shift-side context stamped onto every new order.
#[derive(Debug, Clone)]
pub(crate) struct OrderContext<'a> {
    pub order_number: u32,
    pub shift_id: &'a str,
    pub user_id: &'a str,
    pub is_training: bool,
}

/// An order as recorded at checkout.
///
/// ## Invariant
/// `total == subtotal − discount + tax + tip`, in cents, for every order
/// including the negative ones produced by returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: u32,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub tax_rate: TaxRate,
    pub tip: Money,
    pub total: Money,
    pub items: Vec<OrderItem>,
    pub payments: Vec<PaymentLine>,
    pub shift_id: String,
    pub user_id: String,
    pub customer_id: Option<String>,
    pub notes: Option<String>,
    pub order_type: OrderType,
    pub table_id: Option<String>,
    pub server_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub is_training: bool,

    // Kitchen
    pub fire_status: FireStatus,
    pub kitchen_status: Option<KitchenStatus>,
    #[ts(as = "Option<String>")]
    pub fire_time: Option<DateTime<Utc>>,
    pub held_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub held_at: Option<DateTime<Utc>>,

    // Void / return linkage
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub returned_order_id: Option<String>,
}

impl Order {
    /// Snapshot of a cart. The caller has already checked the cart is
    /// non-empty.
    pub(crate) fn from_cart(
        cart: &Cart,
        payments: Vec<PaymentLine>,
        tip: Money,
        hold: bool,
        ctx: OrderContext<'_>,
    ) -> Self {
        let totals = CartTotals::compute(&cart.items, cart.discount, cart.tax_rate, tip);
        let now = Utc::now();
        let fire_status = match (cart.order_type, cart.table_id.is_some(), hold) {
            (OrderType::DineIn, true, true) => FireStatus::Held,
            (OrderType::DineIn, true, false) => FireStatus::AutoFired,
            (_, _, true) => FireStatus::Held,
            _ => FireStatus::NotApplicable,
        };

        Order {
            id: crate::new_id(),
            order_number: ctx.order_number,
            status: OrderStatus::Paid,
            subtotal: totals.subtotal,
            discount: totals.discount,
            tax: totals.tax,
            tax_rate: cart.tax_rate,
            tip: totals.tip,
            total: totals.total,
            items: cart.items.iter().map(OrderItem::from_cart_item).collect(),
            payments,
            shift_id: ctx.shift_id.to_string(),
            user_id: ctx.user_id.to_string(),
            customer_id: cart.customer_id.clone(),
            notes: Some(cart.notes.clone()).filter(|n| !n.is_empty()),
            order_type: cart.order_type,
            table_id: cart.table_id.clone(),
            server_id: cart.server_id.clone(),
            created_at: now,
            is_training: ctx.is_training,
            fire_status,
            kitchen_status: None,
            fire_time: None,
            held_by: hold.then(|| ctx.user_id.to_string()),
            held_at: hold.then_some(now),
            void_reason: None,
            voided_by: None,
            voided_at: None,
            returned_order_id: None,
        }
    }

    /// Negative order refunding `lines` of `original` at its tax rate.
    pub(crate) fn refund_of(
        original: &Order,
        lines: Vec<OrderItem>,
        reason: &str,
        ctx: OrderContext<'_>,
    ) -> Self {
        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let tax = subtotal.calculate_tax(original.tax_rate);
        let total = -(subtotal + tax);
        let method = original
            .primary_payment_method()
            .unwrap_or(PaymentMethod::Cash);

        Order {
            id: crate::new_id(),
            order_number: ctx.order_number,
            status: OrderStatus::Returned,
            subtotal: -subtotal,
            discount: Money::zero(),
            tax: -tax,
            tax_rate: original.tax_rate,
            tip: Money::zero(),
            total,
            items: lines,
            payments: vec![PaymentLine::new(method, total)],
            shift_id: ctx.shift_id.to_string(),
            user_id: ctx.user_id.to_string(),
            customer_id: original.customer_id.clone(),
            notes: Some(format!("Return: {reason}")),
            order_type: original.order_type,
            table_id: None,
            server_id: None,
            created_at: Utc::now(),
            is_training: ctx.is_training,
            fire_status: FireStatus::NotApplicable,
            kitchen_status: None,
            fire_time: None,
            held_by: None,
            held_at: None,
            void_reason: None,
            voided_by: None,
            voided_at: None,
            returned_order_id: Some(original.id.clone()),
        }
    }

    pub fn primary_payment_method(&self) -> Option<PaymentMethod> {
        self.payments.first().map(|p| p.method)
    }

    pub fn uses_method(&self, method: PaymentMethod) -> bool {
        self.payments.iter().any(|p| p.method == method)
    }

    /// Sum of payment amounts made with `method`.
    pub fn amount_paid_by(&self, method: PaymentMethod) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method == method)
            .map(|p| p.amount)
            .sum()
    }

    /// Sum of line totals; equals `subtotal` for sale orders.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|i| i.line_total).sum()
    }

    /// Marks every line as sent and stamps the fire time.
    pub(crate) fn fire(&mut self, fire_status: FireStatus) {
        let now = Utc::now();
        self.fire_status = fire_status;
        self.kitchen_status = Some(KitchenStatus::New);
        self.fire_time = Some(now);
        for item in &mut self.items {
            item.sent_to_kitchen = true;
            item.sent_at = Some(now);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::types::Discount;

    fn ctx() -> OrderContext<'static> {
        OrderContext {
            order_number: 1,
            shift_id: "shift-1",
            user_id: "user-1",
            is_training: false,
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::default();
        let mut a = CartItem::new(
            &Product::new("Burger", Money::from_cents(1250), "Food"),
            None,
            Vec::new(),
        );
        a.quantity = 2;
        a.discount = Some(Discount::Fixed(Money::from_cents(250)));
        let b = CartItem::new(
            &Product::new("Soda", Money::from_cents(199), "Drinks"),
            None,
            Vec::new(),
        );
        cart.items = vec![a, b];
        cart
    }

    #[test]
    fn test_tender_scenarios() {
        let total = Money::from_cents(2160);
        let ok = Tender::evaluate(total, Money::from_cents(2500));
        assert_eq!(ok.change_due.cents(), 340);
        assert!(ok.is_valid);

        let short = Tender::evaluate(total, Money::from_cents(2000));
        assert_eq!(short.change_due, Money::zero());
        assert!(!short.is_valid);

        let exact = Tender::evaluate(total, total);
        assert!(exact.is_valid);
        assert_eq!(exact.change_due, Money::zero());
    }

    #[test]
    fn test_cash_payment_line_records_change() {
        let line = PaymentLine::cash(Money::from_cents(2160), Money::from_cents(2500));
        assert_eq!(line.amount.cents(), 2160);
        assert_eq!(line.change, Some(Money::from_cents(340)));
    }

    #[test]
    fn test_order_items_reproduce_subtotal() {
        let cart = cart();
        let order = Order::from_cart(&cart, Vec::new(), Money::zero(), false, ctx());
        assert_eq!(order.items_total(), order.subtotal);
        assert_eq!(order.subtotal, cart.totals().subtotal);
        assert_eq!(
            order.total,
            order.subtotal - order.discount + order.tax + order.tip
        );
        assert_eq!(order.fire_status, FireStatus::NotApplicable);
    }

    #[test]
    fn test_fire_status_from_table_and_hold() {
        let mut cart = cart();
        cart.order_type = OrderType::DineIn;
        cart.table_id = Some("t1".into());
        let fired = Order::from_cart(&cart, Vec::new(), Money::zero(), false, ctx());
        assert_eq!(fired.fire_status, FireStatus::AutoFired);

        let held = Order::from_cart(&cart, Vec::new(), Money::zero(), true, ctx());
        assert_eq!(held.fire_status, FireStatus::Held);
        assert_eq!(held.held_by.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_refund_is_negative_and_balanced() {
        let cart = cart();
        let original = Order::from_cart(
            &cart,
            vec![PaymentLine::card(Money::from_cents(2500), "4242")],
            Money::zero(),
            false,
            ctx(),
        );
        let refund = Order::refund_of(
            &original,
            vec![original.items[1].clone()],
            "damaged",
            OrderContext {
                order_number: 2,
                ..ctx()
            },
        );
        // 199 + 16 tax
        assert_eq!(refund.subtotal.cents(), -199);
        assert_eq!(refund.tax.cents(), -16);
        assert_eq!(refund.total.cents(), -215);
        assert_eq!(refund.total, refund.subtotal - refund.discount + refund.tax + refund.tip);
        assert_eq!(refund.primary_payment_method(), Some(PaymentMethod::Card));
        assert_eq!(refund.returned_order_id.as_deref(), Some(original.id.as_str()));
    }
}
