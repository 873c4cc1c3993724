//! # Shift
//!
//! A work session for one user on one terminal. The shift owns the orders
//! and transactions created while it is open and the order-number counter.
//!
//! ## Cash Drawer Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  expected_cash = opening_balance                                        │
//! │                + Σ cash paid on orders   (returns are negative)         │
//! │                + Σ cash_in                                              │
//! │                + Σ cash_out              (stored negative)              │
//! │                                                                         │
//! │  voided and training orders are excluded                                │
//! │                                                                         │
//! │  cash_variance = closing_balance − expected_cash   (closed shifts only) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::Transaction;
use crate::money::Money;
use crate::order::Order;
use crate::types::{OrderStatus, PaymentMethod, TransactionType};

/// A register terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Terminal {
    pub id: String,
    pub name: String,
}

impl Terminal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Terminal {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    pub terminal: Terminal,
    pub opening_balance: Money,
    pub closing_balance: Option<Money>,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub ended_at: Option<DateTime<Utc>>,
    pub transactions: Vec<Transaction>,
    pub orders: Vec<Order>,
    /// Number the next order created in this shift will get.
    pub next_order_number: u32,
}

impl Shift {
    pub fn open(user_id: impl Into<String>, terminal: Terminal, opening_balance: Money) -> Self {
        Shift {
            id: crate::new_id(),
            user_id: user_id.into(),
            terminal,
            opening_balance,
            closing_balance: None,
            started_at: Utc::now(),
            ended_at: None,
            transactions: Vec::new(),
            orders: Vec::new(),
            next_order_number: 1,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Hands out the next order number and advances the counter.
    pub(crate) fn take_order_number(&mut self) -> u32 {
        let n = self.next_order_number;
        self.next_order_number += 1;
        n
    }

    pub(crate) fn close(&mut self, closing_balance: Money) {
        self.closing_balance = Some(closing_balance);
        self.ended_at = Some(Utc::now());
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub(crate) fn order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| o.id == order_id)
    }

    /// Total of live transactions of one type, as stored (cash out is
    /// negative). Training entries are skipped.
    pub fn sum_of(&self, kind: TransactionType) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.kind == kind && !t.is_training)
            .map(|t| t.amount)
            .sum()
    }

    /// Cash that should be in the drawer.
    pub fn expected_cash(&self) -> Money {
        let order_cash: Money = self
            .orders
            .iter()
            .filter(|o| !o.is_training && o.status != OrderStatus::Voided)
            .map(|o| o.amount_paid_by(PaymentMethod::Cash))
            .sum();
        self.opening_balance
            + order_cash
            + self.sum_of(TransactionType::CashIn)
            + self.sum_of(TransactionType::CashOut)
    }

    /// Counted minus expected. `None` while the shift is open.
    pub fn cash_variance(&self) -> Option<Money> {
        self.closing_balance.map(|closing| closing - self.expected_cash())
    }
}
