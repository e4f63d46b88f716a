//! Property tests for fee arithmetic.

use proptest::prelude::*;

use saldo_shared::types::MinorUnits;

use crate::fee::{FeeCalculator, FeeSchedule};

fn calculator_strategy() -> impl Strategy<Value = FeeCalculator> {
    (0i64..100_000, 0u32..10_000).prop_map(|(flat, bps)| {
        FeeCalculator::new(FeeSchedule {
            withdrawal_flat_fee: MinorUnits::new(flat),
            anticipation_fee_bps: bps,
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Whenever a withdrawal fee computes, fee + net reassembles the
    /// gross amount exactly and the net is strictly positive.
    #[test]
    fn prop_withdrawal_fee_plus_net_is_gross(
        calc in calculator_strategy(),
        amount in 1i64..10_000_000,
    ) {
        if let Ok(breakdown) = calc.withdrawal(MinorUnits::new(amount)) {
            let reassembled = breakdown
                .fee_amount
                .checked_add(breakdown.net_amount)
                .unwrap();
            prop_assert_eq!(reassembled, MinorUnits::new(amount));
            prop_assert!(breakdown.net_amount.is_positive());
            prop_assert!(!breakdown.fee_amount.is_negative());
        }
    }

    /// Same conservation law for anticipations.
    #[test]
    fn prop_anticipation_fee_plus_net_is_gross(
        calc in calculator_strategy(),
        amount in 1i64..10_000_000,
    ) {
        if let Ok(breakdown) = calc.anticipation(MinorUnits::new(amount)) {
            let reassembled = breakdown
                .fee_amount
                .checked_add(breakdown.net_amount)
                .unwrap();
            prop_assert_eq!(reassembled, MinorUnits::new(amount));
            prop_assert!(breakdown.net_amount.is_positive());
            prop_assert!(!breakdown.fee_amount.is_negative());
        }
    }

    /// The anticipation fee never exceeds half a unit above the exact
    /// rate: |fee - amount*bps/10000| <= 0.5 minor units.
    #[test]
    fn prop_anticipation_fee_within_rounding_distance(
        calc in calculator_strategy(),
        amount in 1i64..10_000_000,
    ) {
        if let Ok(breakdown) = calc.anticipation(MinorUnits::new(amount)) {
            // |fee - amount*bps/10000| <= 0.5  <=>  |10000*fee - amount*bps| <= 5000
            let scaled_exact = i128::from(amount) * i128::from(calc.schedule().anticipation_fee_bps);
            let scaled_fee = i128::from(breakdown.fee_amount.into_inner()) * 10_000;
            prop_assert!((scaled_fee - scaled_exact).abs() <= 5_000);
        }
    }

    /// The calculator is a pure function: same inputs, same output.
    #[test]
    fn prop_deterministic(
        calc in calculator_strategy(),
        amount in 1i64..10_000_000,
    ) {
        let a = MinorUnits::new(amount);
        prop_assert_eq!(calc.withdrawal(a).ok(), calc.withdrawal(a).ok());
        prop_assert_eq!(calc.anticipation(a).ok(), calc.anticipation(a).ok());
    }
}
