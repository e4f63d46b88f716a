//! Property tests for balance replay arithmetic.

use proptest::prelude::*;

use saldo_shared::types::MinorUnits;

use crate::ledger::balance::AccountBalances;
use crate::ledger::movement::MovementKind;

/// One randomly chosen ledger operation with a positive magnitude.
#[derive(Debug, Clone, Copy)]
enum Op {
    Credit(i64),
    Hold(i64),
    Release(i64),
    Debit(i64),
    Fee(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let amount = 1i64..50_000;
    prop_oneof![
        amount.clone().prop_map(Op::Credit),
        amount.clone().prop_map(Op::Hold),
        amount.clone().prop_map(Op::Release),
        amount.clone().prop_map(Op::Debit),
        amount.prop_map(Op::Fee),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

/// Applies an op, skipping those the current state makes invalid.
///
/// Mirrors how the store behaves: operations that would overdraw are
/// rejected up front and never reach the movement log.
fn apply_if_valid(
    balances: AccountBalances,
    op: Op,
    log: &mut Vec<(MovementKind, MinorUnits)>,
) -> AccountBalances {
    let (kind, magnitude) = match op {
        Op::Credit(a) => (MovementKind::AnticipationCredit, a),
        Op::Hold(a) => (MovementKind::ReserveHold, a),
        Op::Release(a) => (MovementKind::ReserveRelease, a),
        Op::Debit(a) => (MovementKind::WithdrawalDebit, a),
        Op::Fee(a) => (MovementKind::FeeDebit, a),
    };
    let amount = kind.signed_amount(MinorUnits::new(magnitude));
    match balances.apply(kind, amount) {
        Ok(next) => {
            log.push((kind, amount));
            next
        }
        Err(_) => balances,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No sequence of accepted operations ever drives a bucket negative.
    #[test]
    fn prop_buckets_never_negative(ops in ops_strategy(40)) {
        let mut log = Vec::new();
        let mut balances = AccountBalances::ZERO;
        for op in ops {
            balances = apply_if_valid(balances, op, &mut log);
            prop_assert!(!balances.available.is_negative());
            prop_assert!(!balances.reserved.is_negative());
            prop_assert!(!balances.pending.is_negative());
        }
    }

    /// Replaying the accepted log reproduces the final triple exactly.
    #[test]
    fn prop_replay_reproduces_state(ops in ops_strategy(40)) {
        let mut log = Vec::new();
        let mut balances = AccountBalances::ZERO;
        for op in ops {
            balances = apply_if_valid(balances, op, &mut log);
        }

        let replayed = AccountBalances::replay(log.iter().copied()).unwrap();
        prop_assert_eq!(replayed, balances);
    }

    /// The account total equals the sum of total-affecting amounts:
    /// holds and releases shuffle buckets without changing the total.
    #[test]
    fn prop_total_equals_sum_of_total_affecting(ops in ops_strategy(40)) {
        let mut log = Vec::new();
        let mut balances = AccountBalances::ZERO;
        for op in ops {
            balances = apply_if_valid(balances, op, &mut log);
        }

        let sum: i64 = log
            .iter()
            .filter(|(kind, _)| kind.affects_total())
            .map(|(_, amount)| amount.into_inner())
            .sum();

        prop_assert_eq!(balances.total().unwrap(), MinorUnits::new(sum));
    }

    /// A hold followed by its release is the identity on the triple.
    #[test]
    fn prop_hold_release_round_trip(
        seed in 1i64..1_000_000,
        held in 1i64..1_000_000,
    ) {
        prop_assume!(held <= seed);

        let start = AccountBalances::new(seed, 0, 0);
        let after_hold = start
            .apply(MovementKind::ReserveHold, MinorUnits::new(held))
            .unwrap();
        let after_release = after_hold
            .apply(MovementKind::ReserveRelease, MinorUnits::new(-held))
            .unwrap();

        prop_assert_eq!(after_release, start);
    }
}
