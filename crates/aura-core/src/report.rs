//! # Z-Report
//!
//! End-of-shift rollup. Read only: generating a report never changes the
//! shift, so it can be produced as often as needed.
//!
//! ## What Counts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order status   Training   Included?   Sign                             │
//! │  ────────────   ────────   ─────────   ────                             │
//! │  Paid           no         yes         +                                │
//! │  Returned       no         yes         −  (return orders are negative)  │
//! │  Voided         any        no          (shown only in `voids`)          │
//! │  any            yes        no                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::money::Money;
use crate::order::Order;
use crate::shift::Shift;
use crate::types::{OrderStatus, PaymentMethod, TransactionType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMethodSales {
    pub method: PaymentMethod,
    pub label: String,
    /// Orders that used this method at least once.
    pub order_count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category: String,
    pub quantity: i64,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashEntry {
    pub kind: TransactionType,
    /// As recorded: cash out is negative.
    pub amount: Money,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ZReport {
    pub terminal: String,
    pub cashier: String,
    pub shift_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_balance: Money,
    pub closing_balance: Option<Money>,
    /// Paid orders.
    pub order_count: usize,
    pub gross_sales: Money,
    /// Sum of return orders (≤ 0).
    pub refunds: Money,
    /// Sum of voided order totals.
    pub voids: Money,
    pub payment_method_sales: Vec<PaymentMethodSales>,
    pub category_sales: Vec<CategorySales>,
    pub cash_in_total: Money,
    /// Magnitude of cash taken out (≥ 0).
    pub cash_out_total: Money,
    pub cash_transactions: Vec<CashEntry>,
    pub expected_cash: Money,
}

fn counts_toward_sales(order: &Order) -> bool {
    !order.is_training && matches!(order.status, OrderStatus::Paid | OrderStatus::Returned)
}

impl ZReport {
    pub fn generate(shift: &Shift, cashier: &str, catalog: &Catalog) -> Self {
        let included: Vec<&Order> = shift.orders.iter().filter(|o| counts_toward_sales(o)).collect();
        let paid = included.iter().filter(|o| o.status == OrderStatus::Paid);

        let payment_method_sales = PaymentMethod::ALL
            .iter()
            .filter_map(|method| {
                let using: Vec<&&Order> = included.iter().filter(|o| o.uses_method(*method)).collect();
                (!using.is_empty()).then(|| PaymentMethodSales {
                    method: *method,
                    label: method.label().to_string(),
                    order_count: using.len(),
                    total: using.iter().map(|o| o.amount_paid_by(*method)).sum(),
                })
            })
            .collect();

        let mut category_sales: Vec<CategorySales> = Vec::new();
        for order in &included {
            let sign = if order.status == OrderStatus::Returned { -1 } else { 1 };
            for item in &order.items {
                let Some(product) = catalog.get(&item.product_id) else {
                    continue;
                };
                let (quantity, total) = (item.quantity * sign, item.line_total * sign);
                match category_sales.iter_mut().find(|c| c.category == product.category) {
                    Some(entry) => {
                        entry.quantity += quantity;
                        entry.total += total;
                    }
                    None => category_sales.push(CategorySales {
                        category: product.category.clone(),
                        quantity,
                        total,
                    }),
                }
            }
        }

        let cash_transactions = shift
            .transactions
            .iter()
            .filter(|t| t.kind.is_cash_movement() && !t.is_training)
            .map(|t| CashEntry {
                kind: t.kind,
                amount: t.amount,
                note: t.note.clone().unwrap_or_default(),
            })
            .collect();

        ZReport {
            terminal: shift.terminal.name.clone(),
            cashier: cashier.to_string(),
            shift_id: shift.id.clone(),
            opened_at: shift.started_at,
            closed_at: shift.ended_at,
            opening_balance: shift.opening_balance,
            closing_balance: shift.closing_balance,
            order_count: paid.clone().count(),
            gross_sales: paid.map(|o| o.total).sum(),
            refunds: included
                .iter()
                .filter(|o| o.status == OrderStatus::Returned)
                .map(|o| o.total)
                .sum(),
            voids: shift
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Voided && !o.is_training)
                .map(|o| o.total)
                .sum(),
            payment_method_sales,
            category_sales,
            cash_in_total: shift.sum_of(TransactionType::CashIn),
            cash_out_total: shift.sum_of(TransactionType::CashOut).abs(),
            cash_transactions,
            expected_cash: shift.expected_cash(),
        }
    }
}
