//! # Transaction Ledger
//!
//! Append-only log of monetary events within a shift.
//!
//! | Type       | Amount sign | Order link |
//! |------------|-------------|------------|
//! | `sale`     | +total      | yes        |
//! | `return`   | −refund     | yes (return order) |
//! | `void`     | −total / +line value for cart voids | order voids only |
//! | `exchange` | +replacement total | yes (replacement order) |
//! | `cash_in`  | +amount     | no         |
//! | `cash_out` | −amount     | no         |
//! | `no_sale`  | 0           | no         |
//!
//! Entries are never edited or removed once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, TransactionType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub shift_id: String,
    pub amount: Money,
    pub order_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub note: Option<String>,
    pub is_training: bool,
}

impl Transaction {
    /// Stamps a fresh id and the current time.
    pub fn new(
        kind: TransactionType,
        amount: Money,
        user_id: impl Into<String>,
        shift_id: impl Into<String>,
    ) -> Self {
        Transaction {
            id: crate::new_id(),
            kind,
            timestamp: Utc::now(),
            user_id: user_id.into(),
            shift_id: shift_id.into(),
            amount,
            order_id: None,
            payment_method: None,
            note: None,
            is_training: false,
        }
    }

    pub fn with_order(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_method(mut self, method: Option<PaymentMethod>) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn training(mut self, is_training: bool) -> Self {
        self.is_training = is_training;
        self
    }
}

/// Orders transactions newest first.
///
/// Input is expected in append order. Entries sharing a timestamp keep
/// reverse append order, so the later append still comes first.
pub fn newest_first<I>(transactions: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Transaction>,
{
    let mut all: Vec<Transaction> = transactions.into_iter().collect();
    all.reverse();
    all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_newest_first_breaks_ties_by_append_order() {
        let base = Utc::now();
        let mut first = Transaction::new(TransactionType::CashIn, Money::from_cents(100), "u", "s");
        let mut second = Transaction::new(TransactionType::NoSale, Money::zero(), "u", "s");
        let mut third = Transaction::new(TransactionType::CashOut, Money::from_cents(-50), "u", "s");
        first.timestamp = base;
        second.timestamp = base;
        third.timestamp = base + Duration::seconds(5);

        let ordered = newest_first(vec![first.clone(), second.clone(), third.clone()]);
        let ids: Vec<&str> = ordered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let t = Transaction::new(TransactionType::NoSale, Money::zero(), "u", "s").with_note("drawer check");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "no_sale");
        assert_eq!(json["note"], "drawer check");
    }
}
