//! Fee calculation for withdrawals and anticipations.
//!
//! The calculator is a pure function of its inputs and the configured
//! schedule: no state, no I/O. Withdrawals pay a flat per-transfer fee;
//! anticipations pay a percentage of the anticipated amount, reflecting
//! the time-value discount on the receivables being advanced.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use saldo_shared::config::FeesConfig;
use saldo_shared::types::MinorUnits;

/// Basis-point denominator: 10 000 bps = 100%.
const BPS_DENOMINATOR: u32 = 10_000;

/// The fee schedule the engine runs with.
///
/// Fee pricing is owned by an external system; this is the snapshot it
/// hands us through configuration. Rates are integer basis points so no
/// float ever enters the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee charged per withdrawal, in minor units.
    pub withdrawal_flat_fee: MinorUnits,
    /// Anticipation fee rate in basis points (1000 = 10.00%).
    pub anticipation_fee_bps: u32,
}

impl From<&FeesConfig> for FeeSchedule {
    fn from(config: &FeesConfig) -> Self {
        Self {
            withdrawal_flat_fee: MinorUnits::new(config.withdrawal_flat_fee),
            anticipation_fee_bps: config.anticipation_fee_bps,
        }
    }
}

/// Result of a fee computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Fee charged, in minor units.
    pub fee_amount: MinorUnits,
    /// Amount the holder receives: requested minus fee.
    pub net_amount: MinorUnits,
}

/// Errors from fee computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// The requested amount must be strictly positive.
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The offending amount.
        amount: MinorUnits,
    },

    /// The fee consumes the entire amount; the request is rejected before
    /// any ledger activity.
    #[error("amount {amount} does not cover the {fee} fee")]
    AmountTooSmall {
        /// The requested amount.
        amount: MinorUnits,
        /// The fee that would apply.
        fee: MinorUnits,
    },
}

/// Stateless fee calculator over a configured schedule.
#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator {
    schedule: FeeSchedule,
}

impl FeeCalculator {
    /// Creates a calculator for the given schedule.
    #[must_use]
    pub const fn new(schedule: FeeSchedule) -> Self {
        Self { schedule }
    }

    /// Returns the schedule this calculator runs with.
    #[must_use]
    pub const fn schedule(&self) -> FeeSchedule {
        self.schedule
    }

    /// Computes the fee breakdown for a withdrawal.
    ///
    /// The fee is the configured flat amount per transfer.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for zero or negative amounts
    /// - `AmountTooSmall` when the flat fee is greater than or equal to
    ///   the amount
    pub fn withdrawal(&self, amount: MinorUnits) -> Result<FeeBreakdown, FeeError> {
        if !amount.is_positive() {
            return Err(FeeError::NonPositiveAmount { amount });
        }

        let fee = self.schedule.withdrawal_flat_fee;
        if fee >= amount {
            return Err(FeeError::AmountTooSmall { amount, fee });
        }

        let net = amount
            .checked_sub(fee)
            .ok_or(FeeError::NonPositiveAmount { amount })?;

        Ok(FeeBreakdown {
            fee_amount: fee,
            net_amount: net,
        })
    }

    /// Computes the fee breakdown for an anticipation.
    ///
    /// The fee is `round_half_up(amount x rate)` in minor units.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` for zero or negative amounts
    /// - `AmountTooSmall` when the rounded fee leaves nothing to advance
    pub fn anticipation(&self, amount: MinorUnits) -> Result<FeeBreakdown, FeeError> {
        if !amount.is_positive() {
            return Err(FeeError::NonPositiveAmount { amount });
        }

        let gross = Decimal::from(amount.into_inner());
        let rate = Decimal::from(self.schedule.anticipation_fee_bps)
            / Decimal::from(BPS_DENOMINATOR);
        let fee_units = (gross * rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(FeeError::NonPositiveAmount { amount })?;
        let fee = MinorUnits::new(fee_units);

        if fee >= amount {
            return Err(FeeError::AmountTooSmall { amount, fee });
        }

        let net = amount
            .checked_sub(fee)
            .ok_or(FeeError::NonPositiveAmount { amount })?;

        Ok(FeeBreakdown {
            fee_amount: fee,
            net_amount: net,
        })
    }
}

#[cfg(test)]
mod props;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn calculator(flat: i64, bps: u32) -> FeeCalculator {
        FeeCalculator::new(FeeSchedule {
            withdrawal_flat_fee: MinorUnits::new(flat),
            anticipation_fee_bps: bps,
        })
    }

    #[test]
    fn test_withdrawal_flat_fee() {
        let calc = calculator(50, 1000);
        let breakdown = calc.withdrawal(MinorUnits::new(1_000)).unwrap();
        assert_eq!(breakdown.fee_amount, MinorUnits::new(50));
        assert_eq!(breakdown.net_amount, MinorUnits::new(950));
    }

    #[rstest]
    #[case(0)]
    #[case(-100)]
    fn test_withdrawal_rejects_non_positive(#[case] amount: i64) {
        let calc = calculator(50, 1000);
        assert!(matches!(
            calc.withdrawal(MinorUnits::new(amount)),
            Err(FeeError::NonPositiveAmount { .. })
        ));
    }

    #[rstest]
    #[case(50)] // equal to the fee
    #[case(49)] // below the fee
    fn test_withdrawal_rejects_amount_at_or_below_fee(#[case] amount: i64) {
        let calc = calculator(50, 1000);
        assert!(matches!(
            calc.withdrawal(MinorUnits::new(amount)),
            Err(FeeError::AmountTooSmall { .. })
        ));
    }

    #[test]
    fn test_anticipation_ten_percent() {
        let calc = calculator(50, 1000);
        let breakdown = calc.anticipation(MinorUnits::new(5_000)).unwrap();
        assert_eq!(breakdown.fee_amount, MinorUnits::new(500));
        assert_eq!(breakdown.net_amount, MinorUnits::new(4_500));
    }

    #[rstest]
    // 2.5% of 1000 = 25
    #[case(250, 1_000, 25, 975)]
    // 10% of 5 = 0.5, rounds half-up to 1
    #[case(1000, 5, 1, 4)]
    // 10% of 14 = 1.4, rounds down to 1
    #[case(1000, 14, 1, 13)]
    // 10% of 15 = 1.5, rounds half-up to 2
    #[case(1000, 15, 2, 13)]
    // 10% of 1 = 0.1, rounds to 0: anticipation is free at this size
    #[case(1000, 1, 0, 1)]
    fn test_anticipation_rounding_half_up(
        #[case] bps: u32,
        #[case] amount: i64,
        #[case] fee: i64,
        #[case] net: i64,
    ) {
        let calc = calculator(50, bps);
        let breakdown = calc.anticipation(MinorUnits::new(amount)).unwrap();
        assert_eq!(breakdown.fee_amount, MinorUnits::new(fee));
        assert_eq!(breakdown.net_amount, MinorUnits::new(net));
    }

    #[test]
    fn test_anticipation_full_rate_rejected() {
        // 100% rate: fee == amount, nothing left to advance.
        let calc = calculator(50, 10_000);
        assert!(matches!(
            calc.anticipation(MinorUnits::new(1_000)),
            Err(FeeError::AmountTooSmall { .. })
        ));
    }

    #[test]
    fn test_anticipation_rejects_non_positive() {
        let calc = calculator(50, 1000);
        assert!(matches!(
            calc.anticipation(MinorUnits::ZERO),
            Err(FeeError::NonPositiveAmount { .. })
        ));
    }

    #[test]
    fn test_determinism() {
        let calc = calculator(390, 1250);
        let amount = MinorUnits::new(123_457);
        assert_eq!(
            calc.anticipation(amount).unwrap(),
            calc.anticipation(amount).unwrap()
        );
        assert_eq!(
            calc.withdrawal(amount).unwrap(),
            calc.withdrawal(amount).unwrap()
        );
    }

    #[test]
    fn test_schedule_from_config() {
        let config = FeesConfig {
            withdrawal_flat_fee: 390,
            anticipation_fee_bps: 1000,
        };
        let schedule = FeeSchedule::from(&config);
        assert_eq!(schedule.withdrawal_flat_fee, MinorUnits::new(390));
        assert_eq!(schedule.anticipation_fee_bps, 1000);
    }
}
