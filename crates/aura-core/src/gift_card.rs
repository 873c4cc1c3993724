//! Stored-value gift cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftCard {
    pub id: String,
    pub card_number: String,
    pub balance: Money,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl GiftCard {
    /// Issues an active card. The number is "GC" plus 16 digits taken from
    /// a fresh UUID.
    pub fn issue(amount: Money) -> Self {
        let uuid = uuid::Uuid::new_v4();
        let digits: String = uuid
            .as_u128()
            .to_string()
            .chars()
            .take(16)
            .collect();
        GiftCard {
            id: uuid.to_string(),
            card_number: format!("GC{digits}"),
            balance: amount,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Deducts `amount`, refusing if the card cannot cover it. Only
    /// positive amounts can be drawn.
    pub fn redeem(&mut self, amount: Money) -> CoreResult<Money> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }
        if !self.is_active {
            return Err(CoreError::GiftCardNotFound(self.card_number.clone()));
        }
        if self.balance < amount {
            return Err(CoreError::InsufficientGiftCardBalance {
                card_number: self.card_number.clone(),
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}
