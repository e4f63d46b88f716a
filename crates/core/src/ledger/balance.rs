//! Account balance triple and its transition function.
//!
//! Balances are never mutated directly anywhere in the engine: every
//! change goes through [`AccountBalances::apply`], and the same function
//! replays the movement log during reconciliation. Whatever path a value
//! took into the database, replaying the log must land on the stored
//! triple exactly.

use serde::{Deserialize, Serialize};

use saldo_shared::types::MinorUnits;

use crate::ledger::error::LedgerError;
use crate::ledger::movement::MovementKind;

/// Snapshot of an account's balance buckets, in minor currency units.
///
/// All three buckets are non-negative at every committed state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    /// Funds the holder can spend or reserve.
    pub available: MinorUnits,
    /// Funds held for pending withdrawals.
    pub reserved: MinorUnits,
    /// Funds announced but not yet settled.
    pub pending: MinorUnits,
}

impl AccountBalances {
    /// An empty account.
    pub const ZERO: Self = Self {
        available: MinorUnits::ZERO,
        reserved: MinorUnits::ZERO,
        pending: MinorUnits::ZERO,
    };

    /// Creates a balance triple from raw minor-unit counts.
    #[must_use]
    pub const fn new(available: i64, reserved: i64, pending: i64) -> Self {
        Self {
            available: MinorUnits::new(available),
            reserved: MinorUnits::new(reserved),
            pending: MinorUnits::new(pending),
        }
    }

    /// Sum of all buckets.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Corruption` if the sum overflows `i64`.
    pub fn total(&self) -> Result<MinorUnits, LedgerError> {
        self.available
            .checked_add(self.reserved)
            .and_then(|t| t.checked_add(self.pending))
            .ok_or_else(|| LedgerError::Corruption("balance total overflows i64".into()))
    }

    /// Applies one movement and returns the resulting triple.
    ///
    /// `amount` is the signed stored amount per the kind's convention
    /// (see [`MovementKind`]). The input triple is not modified; commit
    /// points in the store persist the returned value atomically with the
    /// movement row.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount's sign does not match the kind or
    ///   the magnitude is zero
    /// - `InsufficientFunds` if a hold or fee debit exceeds available
    /// - `InvalidState` if a release exceeds reserved
    /// - `Corruption` if a withdrawal debit exceeds reserved or a credit
    ///   overflows (the store reserves before it debits, so either means
    ///   the books are already wrong)
    pub fn apply(&self, kind: MovementKind, amount: MinorUnits) -> Result<Self, LedgerError> {
        let magnitude = Self::checked_magnitude(kind, amount)?;

        let mut next = *self;
        match kind {
            MovementKind::ReserveHold => {
                if self.available < magnitude {
                    return Err(LedgerError::InsufficientFunds {
                        available: self.available,
                        requested: magnitude,
                    });
                }
                next.available = Self::sub(self.available, magnitude)?;
                next.reserved = Self::add(self.reserved, magnitude)?;
            }
            MovementKind::ReserveRelease => {
                if self.reserved < magnitude {
                    return Err(LedgerError::InvalidState(format!(
                        "release of {magnitude} exceeds reserved {}",
                        self.reserved
                    )));
                }
                next.reserved = Self::sub(self.reserved, magnitude)?;
                next.available = Self::add(self.available, magnitude)?;
            }
            MovementKind::WithdrawalDebit => {
                if self.reserved < magnitude {
                    return Err(LedgerError::Corruption(format!(
                        "withdrawal debit of {magnitude} exceeds reserved {}",
                        self.reserved
                    )));
                }
                next.reserved = Self::sub(self.reserved, magnitude)?;
            }
            MovementKind::FeeDebit => {
                if self.available < magnitude {
                    return Err(LedgerError::InsufficientFunds {
                        available: self.available,
                        requested: magnitude,
                    });
                }
                next.available = Self::sub(self.available, magnitude)?;
            }
            MovementKind::AnticipationCredit | MovementKind::WithdrawalReversal => {
                next.available = Self::add(self.available, magnitude)?;
            }
        }

        Ok(next)
    }

    /// Replays a movement log from an empty account.
    ///
    /// # Errors
    ///
    /// Propagates the first error any individual movement produces; a log
    /// that came from committed state must replay cleanly, so any error
    /// here is reported as corruption by the caller.
    pub fn replay<I>(movements: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (MovementKind, MinorUnits)>,
    {
        let mut balances = Self::ZERO;
        for (kind, amount) in movements {
            balances = balances.apply(kind, amount)?;
        }
        Ok(balances)
    }

    /// Validates the stored sign and extracts the positive magnitude.
    fn checked_magnitude(
        kind: MovementKind,
        amount: MinorUnits,
    ) -> Result<MinorUnits, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(format!(
                "zero-amount {kind} movement"
            )));
        }
        let expected_positive = matches!(
            kind,
            MovementKind::ReserveHold
                | MovementKind::AnticipationCredit
                | MovementKind::WithdrawalReversal
        );
        if amount.is_positive() != expected_positive {
            return Err(LedgerError::InvalidAmount(format!(
                "{kind} movement carries amount {amount} with the wrong sign"
            )));
        }
        Ok(if amount.is_negative() {
            amount.negate()
        } else {
            amount
        })
    }

    fn add(a: MinorUnits, b: MinorUnits) -> Result<MinorUnits, LedgerError> {
        a.checked_add(b)
            .ok_or_else(|| LedgerError::Corruption("balance overflows i64".into()))
    }

    fn sub(a: MinorUnits, b: MinorUnits) -> Result<MinorUnits, LedgerError> {
        a.checked_sub(b)
            .ok_or_else(|| LedgerError::Corruption("balance underflows i64".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(amount: i64) -> (MovementKind, MinorUnits) {
        (MovementKind::ReserveHold, MinorUnits::new(amount))
    }

    #[test]
    fn test_hold_moves_available_to_reserved() {
        let start = AccountBalances::new(10_000, 0, 0);
        let after = start
            .apply(MovementKind::ReserveHold, MinorUnits::new(7_000))
            .unwrap();
        assert_eq!(after, AccountBalances::new(3_000, 7_000, 0));
    }

    #[test]
    fn test_hold_rejects_overdraft() {
        let start = AccountBalances::new(500, 0, 0);
        let err = start
            .apply(MovementKind::ReserveHold, MinorUnits::new(700))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: MinorUnits::new(500),
                requested: MinorUnits::new(700),
            }
        );
    }

    #[test]
    fn test_release_round_trips_hold() {
        let start = AccountBalances::new(10_000, 0, 0);
        let held = start
            .apply(MovementKind::ReserveHold, MinorUnits::new(1_000))
            .unwrap();
        let released = held
            .apply(MovementKind::ReserveRelease, MinorUnits::new(-1_000))
            .unwrap();
        assert_eq!(released, start);
    }

    #[test]
    fn test_release_beyond_reserved_is_invalid_state() {
        let start = AccountBalances::new(0, 100, 0);
        let err = start
            .apply(MovementKind::ReserveRelease, MinorUnits::new(-200))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
    }

    #[test]
    fn test_withdrawal_debit_consumes_reservation() {
        let start = AccountBalances::new(3_000, 7_000, 0);
        let after = start
            .apply(MovementKind::WithdrawalDebit, MinorUnits::new(-7_000))
            .unwrap();
        assert_eq!(after, AccountBalances::new(3_000, 0, 0));
    }

    #[test]
    fn test_withdrawal_debit_beyond_reservation_is_corruption() {
        let start = AccountBalances::new(3_000, 100, 0);
        let err = start
            .apply(MovementKind::WithdrawalDebit, MinorUnits::new(-7_000))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Corruption(_)));
    }

    #[test]
    fn test_fee_debit_consumes_available() {
        let start = AccountBalances::new(3_000, 0, 0);
        let after = start
            .apply(MovementKind::FeeDebit, MinorUnits::new(-50))
            .unwrap();
        assert_eq!(after, AccountBalances::new(2_950, 0, 0));
    }

    #[test]
    fn test_fee_debit_beyond_available_is_insufficient() {
        let start = AccountBalances::new(30, 0, 0);
        let err = start
            .apply(MovementKind::FeeDebit, MinorUnits::new(-50))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_credit_increases_available() {
        let start = AccountBalances::ZERO;
        let after = start
            .apply(MovementKind::AnticipationCredit, MinorUnits::new(4_500))
            .unwrap();
        assert_eq!(after, AccountBalances::new(4_500, 0, 0));
    }

    #[test]
    fn test_wrong_sign_is_rejected() {
        let start = AccountBalances::new(1_000, 1_000, 0);
        assert!(matches!(
            start.apply(MovementKind::ReserveHold, MinorUnits::new(-100)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            start.apply(MovementKind::WithdrawalDebit, MinorUnits::new(100)),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            start.apply(MovementKind::FeeDebit, MinorUnits::ZERO),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_replay_full_withdrawal_lifecycle() {
        // Seed 10 000, withdraw 7 000 with a 50 fee: hold, debit, fee.
        let log = vec![
            (MovementKind::AnticipationCredit, MinorUnits::new(10_000)),
            hold(7_000),
            (MovementKind::WithdrawalDebit, MinorUnits::new(-7_000)),
            (MovementKind::FeeDebit, MinorUnits::new(-50)),
        ];
        let balances = AccountBalances::replay(log).unwrap();
        assert_eq!(balances, AccountBalances::new(2_950, 0, 0));
    }

    #[test]
    fn test_replay_denied_withdrawal_restores_balance() {
        let log = vec![
            (MovementKind::AnticipationCredit, MinorUnits::new(10_000)),
            hold(1_000),
            (MovementKind::ReserveRelease, MinorUnits::new(-1_000)),
        ];
        let balances = AccountBalances::replay(log).unwrap();
        assert_eq!(balances, AccountBalances::new(10_000, 0, 0));
    }

    #[test]
    fn test_total() {
        let balances = AccountBalances::new(3_000, 7_000, 500);
        assert_eq!(balances.total().unwrap(), MinorUnits::new(10_500));
    }
}
