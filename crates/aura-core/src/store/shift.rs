//! Shift lifecycle, cash drawer movements and Z-reports.

use tracing::{info, warn};

use super::{refuse, PosStore};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::Transaction;
use crate::money::Money;
use crate::report::ZReport;
use crate::shift::{Shift, Terminal};
use crate::types::TransactionType;

const MAX_NOTE_CHARS: usize = 200;

impl PosStore {
    /// Opens a shift. The order counter starts again at 1.
    pub fn start_shift(
        &mut self,
        user_id: &str,
        terminal: Terminal,
        opening_balance: Money,
    ) -> CoreResult<&Shift> {
        if let Some(open) = &self.current_shift {
            return refuse(CoreError::ShiftAlreadyOpen(open.id.clone()));
        }
        if opening_balance.is_negative() {
            return refuse(
                ValidationError::OutOfRange {
                    field: "opening_balance".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        let shift = Shift::open(user_id, terminal, opening_balance);
        info!(
            shift_id = %shift.id,
            user_id,
            terminal = %shift.terminal.name,
            opening = %opening_balance,
            "shift started"
        );
        Ok(&*self.current_shift.insert(shift))
    }

    /// Closes the open shift and moves it to the archive.
    pub fn end_shift(&mut self, closing_balance: Money) -> CoreResult<&Shift> {
        self.require_shift()?;
        if closing_balance.is_negative() {
            return refuse(
                ValidationError::OutOfRange {
                    field: "closing_balance".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into(),
            );
        }
        let Some(mut shift) = self.current_shift.take() else {
            return refuse(CoreError::NoOpenShift);
        };
        shift.close(closing_balance);

        let expected = shift.expected_cash();
        let variance = closing_balance - expected;
        if variance.is_zero() {
            info!(shift_id = %shift.id, closing = %closing_balance, "shift ended");
        } else {
            warn!(
                shift_id = %shift.id,
                closing = %closing_balance,
                expected = %expected,
                variance = %variance,
                "shift ended with cash variance"
            );
        }
        self.shifts.push(shift);
        let idx = self.shifts.len() - 1;
        Ok(&self.shifts[idx])
    }

    /// Records cash put into (`CashIn`) or taken out of (`CashOut`) the
    /// drawer. `amount` is always given positive; cash out is stored
    /// negative.
    pub fn add_cash_movement(
        &mut self,
        kind: TransactionType,
        amount: Money,
        note: &str,
    ) -> CoreResult<Transaction> {
        let user_id = self.require_user()?.id.clone();
        self.require_shift()?;
        let signed = match kind {
            TransactionType::CashIn => amount,
            TransactionType::CashOut => -amount,
            other => {
                return refuse(
                    ValidationError::InvalidFormat {
                        field: "kind".to_string(),
                        reason: format!("{other:?} is not a cash movement"),
                    }
                    .into(),
                )
            }
        };
        if !amount.is_positive() {
            return refuse(
                ValidationError::MustBePositive {
                    field: "amount".to_string(),
                }
                .into(),
            );
        }
        check_note(note)?;

        let txn = Transaction::new(kind, signed, user_id, "")
            .with_note(note)
            .training(self.training_mode);
        let txn = self.append_transaction(txn)?;
        info!(kind = ?kind, amount = %signed, note, "cash movement recorded");
        Ok(txn)
    }

    /// Opens the drawer without a sale. Logged with a zero amount.
    pub fn no_sale(&mut self, reason: &str) -> CoreResult<Transaction> {
        let user_id = self.require_user()?.id.clone();
        self.require_shift()?;
        check_note(reason)?;
        let txn = Transaction::new(TransactionType::NoSale, Money::zero(), user_id, "")
            .with_note(reason)
            .training(self.training_mode);
        let txn = self.append_transaction(txn)?;
        info!(reason, "no sale");
        Ok(txn)
    }

    /// Z-report for the open shift, signed by the current user.
    pub fn generate_z_report(&self) -> CoreResult<ZReport> {
        let user = self.require_user()?;
        let shift = self.require_shift()?;
        Ok(ZReport::generate(shift, &user.name, &self.catalog))
    }

    /// Z-report for any shift, open or closed, signed by its owner.
    pub fn z_report_for_shift(&self, shift_id: &str) -> CoreResult<ZReport> {
        let Some(shift) = self
            .shifts
            .iter()
            .chain(self.current_shift.iter())
            .find(|s| s.id == shift_id)
        else {
            return refuse(CoreError::ShiftNotFound(shift_id.to_string()));
        };
        let cashier = self
            .users
            .iter()
            .find(|u| u.id == shift.user_id)
            .map_or(shift.user_id.as_str(), |u| u.name.as_str());
        Ok(ZReport::generate(shift, cashier, &self.catalog))
    }
}

fn check_note(note: &str) -> CoreResult<()> {
    if note.chars().count() > MAX_NOTE_CHARS {
        return refuse(
            ValidationError::TooLong {
                field: "note".to_string(),
                max: MAX_NOTE_CHARS,
            }
            .into(),
        );
    }
    Ok(())
}
