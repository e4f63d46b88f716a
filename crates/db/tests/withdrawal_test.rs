//! Integration tests for the withdrawal workflow.
//!
//! Exercises the full lifecycle: create reserves the gross amount,
//! approve leaves balances untouched, mark-done realizes the debit and
//! fee, deny round-trips the reservation.

#![allow(clippy::uninlined_format_args)]

mod common;

use common::{admin, connect_or_skip, harness, seed_available, FakeReceivables};
use saldo_core::ledger::{AccountBalances, LedgerError, MovementKind};
use saldo_core::withdrawal::{WithdrawalError, WithdrawalStatus};
use saldo_db::entities::sea_orm_active_enums;
use saldo_shared::types::{AccountId, MinorUnits, PageRequest, PixKeyId};

#[tokio::test]
async fn test_create_reserves_gross_amount() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(
            account_id,
            MinorUnits::new(7_000),
            PixKeyId::new(),
            "rent".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(
        withdrawal.status,
        sea_orm_active_enums::WithdrawalStatus::Pending
    );
    assert_eq!(withdrawal.requested_amount, 7_000);
    assert_eq!(withdrawal.fee_amount, 50);
    assert_eq!(withdrawal.net_amount, 6_950);

    let balances = h.ledger.balance(account_id).await.unwrap();
    assert_eq!(balances, AccountBalances::new(3_000, 7_000, 0));
}

#[tokio::test]
async fn test_create_rejects_unverified_pix_key() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), false, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let err = h
        .withdrawals
        .create(
            account_id,
            MinorUnits::new(1_000),
            PixKeyId::new(),
            String::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, WithdrawalError::PixKeyNotVerified { .. }));

    // No reservation happened.
    let balances = h.ledger.balance(account_id).await.unwrap();
    assert_eq!(balances, AccountBalances::new(10_000, 0, 0));
}

#[tokio::test]
async fn test_create_rejects_insufficient_funds() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 500).await;

    let err = h
        .withdrawals
        .create(
            account_id,
            MinorUnits::new(5_000),
            PixKeyId::new(),
            String::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WithdrawalError::Ledger(LedgerError::InsufficientFunds { .. })
    ));
}

#[tokio::test]
async fn test_full_lifecycle_to_done() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(
            account_id,
            MinorUnits::new(7_000),
            PixKeyId::new(),
            "payout".to_string(),
        )
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    // Approve: status only, balances untouched.
    let approved = h.withdrawals.approve(withdrawal_id, &admin()).await.unwrap();
    assert_eq!(
        approved.status,
        sea_orm_active_enums::WithdrawalStatus::Approved
    );
    assert_eq!(
        h.ledger.balance(account_id).await.unwrap(),
        AccountBalances::new(3_000, 7_000, 0)
    );

    // Mark done: reservation realized, fee debited.
    let done = h
        .withdrawals
        .mark_done(withdrawal_id, "E2E0123456789".to_string(), &admin())
        .await
        .unwrap();
    assert_eq!(done.status, sea_orm_active_enums::WithdrawalStatus::Done);
    assert_eq!(done.end_to_end_id.as_deref(), Some("E2E0123456789"));
    assert!(done.paid_at.is_some());

    let balances = h.ledger.balance(account_id).await.unwrap();
    assert_eq!(balances, AccountBalances::new(2_950, 0, 0));

    // Exactly the reserve hold, the gross debit, and the fee debit
    // reference this withdrawal.
    let movements = h
        .ledger
        .movements_for_reference(withdrawal.id)
        .await
        .unwrap();
    let kinds: Vec<_> = movements.iter().map(|m| m.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::ReserveHold,
            MovementKind::WithdrawalDebit,
            MovementKind::FeeDebit,
        ]
    );
    assert_eq!(
        movements.iter().map(|m| m.amount).collect::<Vec<_>>(),
        vec![
            MinorUnits::new(7_000),
            MinorUnits::new(-7_000),
            MinorUnits::new(-50)
        ]
    );

    // Balance dropped by exactly requested + fee relative to pre-create.
    h.ledger.reconcile(account_id).await.unwrap();
}

#[tokio::test]
async fn test_mark_done_manual_has_no_end_to_end_id() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    h.withdrawals.approve(withdrawal_id, &admin()).await.unwrap();
    let done = h
        .withdrawals
        .mark_done_manual(withdrawal_id, &admin())
        .await
        .unwrap();

    assert_eq!(
        done.status,
        sea_orm_active_enums::WithdrawalStatus::DoneManual
    );
    assert_eq!(done.end_to_end_id, None);
}

#[tokio::test]
async fn test_deny_round_trips_reservation() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    let denied = h
        .withdrawals
        .deny(withdrawal_id, "suspicious destination".to_string(), &admin())
        .await
        .unwrap();

    assert_eq!(
        denied.status,
        sea_orm_active_enums::WithdrawalStatus::Cancelled
    );
    assert_eq!(
        denied.reason_for_denial.as_deref(),
        Some("suspicious destination")
    );

    // available is back to exactly the pre-create value.
    let balances = h.ledger.balance(account_id).await.unwrap();
    assert_eq!(balances, AccountBalances::new(10_000, 0, 0));
    h.ledger.reconcile(account_id).await.unwrap();
}

#[tokio::test]
async fn test_deny_without_reason_mutates_nothing() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    let err = h
        .withdrawals
        .deny(withdrawal_id, "   ".to_string(), &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, WithdrawalError::DenialReasonRequired));

    // Still pending, still reserved.
    let unchanged = h.withdrawals.get(withdrawal_id).await.unwrap();
    assert_eq!(
        unchanged.status,
        sea_orm_active_enums::WithdrawalStatus::Pending
    );
    assert_eq!(
        h.ledger.balance(account_id).await.unwrap(),
        AccountBalances::new(9_000, 1_000, 0)
    );
}

#[tokio::test]
async fn test_deny_after_approve() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    h.withdrawals.approve(withdrawal_id, &admin()).await.unwrap();
    let denied = h
        .withdrawals
        .deny(withdrawal_id, "rail rejected the key".to_string(), &admin())
        .await
        .unwrap();

    assert_eq!(
        denied.status,
        sea_orm_active_enums::WithdrawalStatus::Cancelled
    );
    assert_eq!(
        h.ledger.balance(account_id).await.unwrap(),
        AccountBalances::new(10_000, 0, 0)
    );
}

#[tokio::test]
async fn test_mark_done_from_pending_is_invalid() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    let err = h
        .withdrawals
        .mark_done(withdrawal_id, "E2E1".to_string(), &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, WithdrawalError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_non_admin_cannot_administer() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);

    let merchant = common::merchant(account_id);
    let err = h
        .withdrawals
        .approve(withdrawal_id, &merchant)
        .await
        .unwrap_err();
    assert!(matches!(err, WithdrawalError::NotAuthorized { .. }));
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let first = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    h.withdrawals
        .create(account_id, MinorUnits::new(2_000), PixKeyId::new(), String::new())
        .await
        .unwrap();

    h.withdrawals
        .approve(
            saldo_shared::types::WithdrawalId::from_uuid(first.id),
            &admin(),
        )
        .await
        .unwrap();

    let (pending, pending_total) = h
        .withdrawals
        .list(
            Some(account_id),
            Some(WithdrawalStatus::Pending),
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending_total, 1);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].requested_amount, 2_000);

    let (all, all_total) = h
        .withdrawals
        .list(Some(account_id), None, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all_total, 2);
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_lifecycle_events_are_emitted() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let h = harness(db.clone(), true, FakeReceivables::granting());
    let account_id = AccountId::new();
    seed_available(&db, account_id, 10_000).await;

    let withdrawal = h
        .withdrawals
        .create(account_id, MinorUnits::new(1_000), PixKeyId::new(), String::new())
        .await
        .unwrap();
    let withdrawal_id = saldo_shared::types::WithdrawalId::from_uuid(withdrawal.id);
    h.withdrawals.approve(withdrawal_id, &admin()).await.unwrap();

    let events = h.sink.events();
    let statuses: Vec<_> = events
        .iter()
        .filter(|e| e.entity_id == withdrawal.id)
        .map(|e| (e.old_status.clone(), e.new_status.clone()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("none".to_string(), "pending".to_string()),
            ("pending".to_string(), "approved".to_string()),
        ]
    );

    // Gate-mediated transition was mirrored into the audit trail.
    let audited = h.audit.records();
    assert!(audited
        .iter()
        .any(|(_, e)| e.entity_id == withdrawal.id && e.new_status == "approved"));
}
