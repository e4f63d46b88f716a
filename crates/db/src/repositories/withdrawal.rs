//! Withdrawal repository: the withdrawal workflow against the database.
//!
//! Creation reserves the gross amount and persists the request in one
//! database transaction; admin transitions run through the approval gate
//! (row lock, status re-read, commit-or-rollback) and emit lifecycle
//! events after commit.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};

use saldo_core::collaborators::{
    CollaboratorError, EntityType, NotificationSink, PixKeyVerifier, TransitionEvent,
};
use saldo_core::fee::FeeCalculator;
use saldo_core::gate::Actor;
use saldo_core::ledger::MovementKind;
use saldo_core::withdrawal::{WithdrawalAction, WithdrawalError, WithdrawalService, WithdrawalStatus};
use saldo_shared::types::{AccountId, MinorUnits, PageRequest, PixKeyId, WithdrawalId};

use crate::entities::{sea_orm_active_enums, withdrawals};
use crate::repositories::gate::ApprovalGate;
use crate::repositories::ledger::{LedgerRepository, LedgerStoreError};
use crate::retry::with_read_retry;

/// Withdrawal repository.
#[derive(Clone)]
pub struct WithdrawalRepository {
    db: DatabaseConnection,
    calculator: FeeCalculator,
    pix_keys: Arc<dyn PixKeyVerifier>,
    notifier: Arc<dyn NotificationSink>,
    gate: ApprovalGate,
}

impl WithdrawalRepository {
    /// Creates a new withdrawal repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        calculator: FeeCalculator,
        pix_keys: Arc<dyn PixKeyVerifier>,
        notifier: Arc<dyn NotificationSink>,
        gate: ApprovalGate,
    ) -> Self {
        Self {
            db,
            calculator,
            pix_keys,
            notifier,
            gate,
        }
    }

    /// Creates a withdrawal request.
    ///
    /// Validates the amount and the PIX key, computes the fee, then
    /// reserves the gross amount and persists the `pending` row in a
    /// single database transaction: the reservation can never outlive a
    /// failed insert.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` / `Fee` for invalid amounts
    /// - `PixKeyNotVerified` when the key is unverified or foreign
    /// - `Ledger(InsufficientFunds)` when available balance is short
    /// - `Unavailable` when the PIX key service is unreachable
    pub async fn create(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
        pix_key_id: PixKeyId,
        description: String,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        WithdrawalService::validate_create(amount)?;
        let breakdown = self.calculator.withdrawal(amount)?;

        let verified = self
            .pix_keys
            .is_verified(account_id, pix_key_id)
            .await
            .map_err(collaborator_err)?;
        if !verified {
            return Err(WithdrawalError::PixKeyNotVerified { pix_key_id });
        }

        let withdrawal_id = WithdrawalId::new();
        let now = Utc::now().into();

        let txn = self.db.begin().await.map_err(db_err)?;

        LedgerRepository::reserve_in(&txn, account_id, amount, withdrawal_id.into_inner())
            .await
            .map_err(store_err)?;

        let model = withdrawals::ActiveModel {
            id: Set(withdrawal_id.into_inner()),
            account_id: Set(account_id.into_inner()),
            requested_amount: Set(amount.into_inner()),
            fee_amount: Set(breakdown.fee_amount.into_inner()),
            net_amount: Set(breakdown.net_amount.into_inner()),
            status: Set(sea_orm_active_enums::WithdrawalStatus::Pending),
            pix_key_id: Set(pix_key_id.into_inner()),
            description: Set(description),
            reason_for_denial: Set(None),
            end_to_end_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            paid_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            withdrawal_id = %withdrawal_id,
            account_id = %account_id,
            amount = %amount,
            "withdrawal created"
        );

        self.notify(TransitionEvent::new(
            EntityType::Withdrawal,
            withdrawal_id.into_inner(),
            "none",
            WithdrawalStatus::Pending.as_str(),
        ))
        .await;

        Ok(model)
    }

    /// Approves a pending withdrawal. Admin-only; no balance movement —
    /// approval authorizes a later payout attempt and funds stay reserved.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` for non-admin actors
    /// - `NotFound` for unknown ids
    /// - `InvalidTransition` when the request is not pending (including a
    ///   concurrent approval that committed first)
    pub async fn approve(
        &self,
        withdrawal_id: WithdrawalId,
        actor: &Actor,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        ApprovalGate::authorize_withdrawal_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let withdrawal = ApprovalGate::lock_withdrawal(&txn, withdrawal_id).await?;

        let current = status_from_db(&withdrawal.status);
        let action = WithdrawalService::approve(current, actor.id)?;

        let mut active: withdrawals::ActiveModel = withdrawal.into();
        active.status = Set(status_to_db(action.new_status()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(withdrawal_id = %withdrawal_id, actor = %actor.id, "withdrawal approved");

        self.emit(actor, transition_event(withdrawal_id, current, action.new_status()))
            .await;

        Ok(updated)
    }

    /// Denies a pending or approved withdrawal and returns the reserved
    /// funds to available balance.
    ///
    /// A missing reason fails before any balance mutation.
    ///
    /// # Errors
    ///
    /// - `DenialReasonRequired` for an empty reason
    /// - `InvalidTransition` from terminal states
    pub async fn deny(
        &self,
        withdrawal_id: WithdrawalId,
        reason: String,
        actor: &Actor,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        ApprovalGate::authorize_withdrawal_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let withdrawal = ApprovalGate::lock_withdrawal(&txn, withdrawal_id).await?;

        let current = status_from_db(&withdrawal.status);
        let action = WithdrawalService::deny(current, reason, actor.id)?;

        let account_id = AccountId::from_uuid(withdrawal.account_id);
        let reserved = MinorUnits::new(withdrawal.requested_amount);
        LedgerRepository::release_in(&txn, account_id, reserved, withdrawal_id.into_inner())
            .await
            .map_err(store_err)?;

        let denial_reason = match &action {
            WithdrawalAction::Deny { reason, .. } => reason.clone(),
            _ => String::new(),
        };

        let mut active: withdrawals::ActiveModel = withdrawal.into();
        active.status = Set(status_to_db(action.new_status()));
        active.reason_for_denial = Set(Some(denial_reason));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(withdrawal_id = %withdrawal_id, actor = %actor.id, "withdrawal denied");

        self.emit(actor, transition_event(withdrawal_id, current, action.new_status()))
            .await;

        Ok(updated)
    }

    /// Records a rail-confirmed payout for an approved withdrawal.
    ///
    /// Realizes the reservation as a gross `withdrawal_debit` plus a
    /// `fee_debit` against available balance, and stamps `paid_at`.
    ///
    /// # Errors
    ///
    /// - `EndToEndIdRequired` for an empty rail id
    /// - `InvalidTransition` when the request is not approved
    /// - `Ledger(InsufficientFunds)` when available cannot cover the fee;
    ///   the reservation stays intact and the request remains approved
    pub async fn mark_done(
        &self,
        withdrawal_id: WithdrawalId,
        end_to_end_id: String,
        actor: &Actor,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        self.finish(withdrawal_id, Some(end_to_end_id), actor).await
    }

    /// Records a manually settled payout for an approved withdrawal.
    ///
    /// # Errors
    ///
    /// Same as [`Self::mark_done`], minus the end-to-end id requirement.
    pub async fn mark_done_manual(
        &self,
        withdrawal_id: WithdrawalId,
        actor: &Actor,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        self.finish(withdrawal_id, None, actor).await
    }

    async fn finish(
        &self,
        withdrawal_id: WithdrawalId,
        end_to_end_id: Option<String>,
        actor: &Actor,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        ApprovalGate::authorize_withdrawal_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let withdrawal = ApprovalGate::lock_withdrawal(&txn, withdrawal_id).await?;

        let current = status_from_db(&withdrawal.status);
        let action = match end_to_end_id {
            Some(e2e) => WithdrawalService::mark_done(current, e2e, actor.id)?,
            None => WithdrawalService::mark_done_manual(current, actor.id)?,
        };

        let account_id = AccountId::from_uuid(withdrawal.account_id);
        let gross = MinorUnits::new(withdrawal.requested_amount);
        let fee = MinorUnits::new(withdrawal.fee_amount);

        LedgerRepository::commit_in(
            &txn,
            account_id,
            gross,
            MovementKind::WithdrawalDebit,
            withdrawal_id.into_inner(),
        )
        .await
        .map_err(store_err)?;

        if fee.is_positive() {
            LedgerRepository::commit_in(
                &txn,
                account_id,
                fee,
                MovementKind::FeeDebit,
                withdrawal_id.into_inner(),
            )
            .await
            .map_err(store_err)?;
        }

        let (new_status, rail_id, paid_at) = match &action {
            WithdrawalAction::MarkDone {
                new_status,
                end_to_end_id,
                paid_at,
                ..
            } => (*new_status, end_to_end_id.clone(), *paid_at),
            _ => unreachable!("mark_done yields a MarkDone action"),
        };

        let mut active: withdrawals::ActiveModel = withdrawal.into();
        active.status = Set(status_to_db(new_status));
        active.end_to_end_id = Set(rail_id);
        active.paid_at = Set(Some(paid_at.into()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            withdrawal_id = %withdrawal_id,
            actor = %actor.id,
            status = %new_status,
            "withdrawal paid"
        );

        self.emit(actor, transition_event(withdrawal_id, current, new_status))
            .await;

        Ok(updated)
    }

    /// Fetches one withdrawal.
    ///
    /// # Errors
    ///
    /// `WithdrawalError::NotFound` for unknown ids.
    pub async fn get(
        &self,
        withdrawal_id: WithdrawalId,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        with_read_retry("withdrawals.get", || {
            withdrawals::Entity::find_by_id(withdrawal_id.into_inner()).one(&self.db)
        })
        .await
        .map_err(db_err)?
        .ok_or(WithdrawalError::NotFound(withdrawal_id))
    }

    /// Lists withdrawals, optionally filtered by account and status,
    /// newest first. Returns the page and the total match count.
    pub async fn list(
        &self,
        account_id: Option<AccountId>,
        status: Option<WithdrawalStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<withdrawals::Model>, u64), WithdrawalError> {
        let mut query = withdrawals::Entity::find();
        if let Some(account_id) = account_id {
            query = query.filter(withdrawals::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(status) = status {
            query = query.filter(withdrawals::Column::Status.eq(status_to_db(status)));
        }

        let total = with_read_retry("withdrawals.count", || query.clone().count(&self.db))
            .await
            .map_err(db_err)?;

        let rows = with_read_retry("withdrawals.list", || {
            query
                .clone()
                .order_by_desc(withdrawals::Column::CreatedAt)
                .limit(page.limit())
                .offset(page.offset())
                .all(&self.db)
        })
        .await
        .map_err(db_err)?;

        Ok((rows, total))
    }

    async fn emit(&self, actor: &Actor, event: TransitionEvent) {
        self.gate.mirror(actor.id, &event).await;
        self.notify(event).await;
    }

    async fn notify(&self, event: TransitionEvent) {
        if let Err(e) = self.notifier.notify(event.clone()).await {
            warn!(
                entity_id = %event.entity_id,
                new_status = %event.new_status,
                error = %e,
                "failed to deliver lifecycle event"
            );
        }
    }
}

fn transition_event(
    withdrawal_id: WithdrawalId,
    from: WithdrawalStatus,
    to: WithdrawalStatus,
) -> TransitionEvent {
    TransitionEvent::new(
        EntityType::Withdrawal,
        withdrawal_id.into_inner(),
        from.as_str(),
        to.as_str(),
    )
}

fn db_err(e: sea_orm::DbErr) -> WithdrawalError {
    WithdrawalError::Database(e.to_string())
}

fn store_err(e: LedgerStoreError) -> WithdrawalError {
    match e {
        LedgerStoreError::Ledger(inner) => WithdrawalError::Ledger(inner),
        LedgerStoreError::Database(msg) => WithdrawalError::Database(msg),
    }
}

fn collaborator_err(e: CollaboratorError) -> WithdrawalError {
    WithdrawalError::Unavailable(e.to_string())
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts the database status to the core status.
pub(crate) fn status_from_db(status: &sea_orm_active_enums::WithdrawalStatus) -> WithdrawalStatus {
    match status {
        sea_orm_active_enums::WithdrawalStatus::Pending => WithdrawalStatus::Pending,
        sea_orm_active_enums::WithdrawalStatus::Approved => WithdrawalStatus::Approved,
        sea_orm_active_enums::WithdrawalStatus::Done => WithdrawalStatus::Done,
        sea_orm_active_enums::WithdrawalStatus::DoneManual => WithdrawalStatus::DoneManual,
        sea_orm_active_enums::WithdrawalStatus::Cancelled => WithdrawalStatus::Cancelled,
    }
}

/// Converts the core status to the database status.
pub(crate) fn status_to_db(status: WithdrawalStatus) -> sea_orm_active_enums::WithdrawalStatus {
    match status {
        WithdrawalStatus::Pending => sea_orm_active_enums::WithdrawalStatus::Pending,
        WithdrawalStatus::Approved => sea_orm_active_enums::WithdrawalStatus::Approved,
        WithdrawalStatus::Done => sea_orm_active_enums::WithdrawalStatus::Done,
        WithdrawalStatus::DoneManual => sea_orm_active_enums::WithdrawalStatus::DoneManual,
        WithdrawalStatus::Cancelled => sea_orm_active_enums::WithdrawalStatus::Cancelled,
    }
}
