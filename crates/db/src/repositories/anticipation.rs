//! Anticipation repository: the anticipation workflow against the
//! database.
//!
//! Creation locks receivables with the external receivables ledger before
//! persisting the request; because the lock lives outside our database,
//! the pair runs as a saga and a failed insert issues a compensating lock
//! release. Approval is the single transition that credits available
//! balance.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};

use saldo_core::anticipation::{
    AnticipationAction, AnticipationError, AnticipationService, AnticipationStatus,
};
use saldo_core::collaborators::{
    CollaboratorError, EntityType, NotificationSink, ReceivablesLedger, TransitionEvent,
};
use saldo_core::fee::FeeCalculator;
use saldo_core::gate::Actor;
use saldo_core::ledger::MovementKind;
use saldo_shared::types::{AccountId, AnticipationId, MinorUnits, PageRequest, ReceivableLockId};

use crate::entities::{anticipations, sea_orm_active_enums};
use crate::repositories::gate::ApprovalGate;
use crate::repositories::ledger::{LedgerRepository, LedgerStoreError};
use crate::retry::with_read_retry;

/// Anticipation repository.
#[derive(Clone)]
pub struct AnticipationRepository {
    db: DatabaseConnection,
    calculator: FeeCalculator,
    receivables: Arc<dyn ReceivablesLedger>,
    notifier: Arc<dyn NotificationSink>,
    gate: ApprovalGate,
}

impl AnticipationRepository {
    /// Creates a new anticipation repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        calculator: FeeCalculator,
        receivables: Arc<dyn ReceivablesLedger>,
        notifier: Arc<dyn NotificationSink>,
        gate: ApprovalGate,
    ) -> Self {
        Self {
            db,
            calculator,
            receivables,
            notifier,
            gate,
        }
    }

    /// Creates an anticipation request.
    ///
    /// Locks `amount` of the account's receivables, computes the
    /// percentage fee, and persists the `pending` row. Available balance
    /// is untouched: anticipation acts on future receivables, not current
    /// funds. If the insert fails after the external lock was taken, the
    /// lock is released as a compensating action.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` / `Fee` for invalid amounts
    /// - `InsufficientReceivables` when the account lacks anticipatable
    ///   receivables
    /// - `Unavailable` when the receivables ledger is unreachable
    pub async fn create(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
    ) -> Result<anticipations::Model, AnticipationError> {
        AnticipationService::validate_create(amount)?;
        let breakdown = self.calculator.anticipation(amount)?;

        let lock_id = self
            .receivables
            .lock_for_anticipation(account_id, amount)
            .await
            .map_err(|e| receivables_err(e, amount))?;

        let anticipation_id = AnticipationId::new();
        let now = Utc::now().into();

        let model = match self
            .persist_pending(anticipation_id, account_id, amount, &breakdown, lock_id, now)
            .await
        {
            Ok(model) => model,
            Err(e) => {
                // Compensating action: the lock must not outlive a request
                // that was never persisted.
                self.compensate_lock(account_id, lock_id).await;
                return Err(e);
            }
        };

        info!(
            anticipation_id = %anticipation_id,
            account_id = %account_id,
            amount = %amount,
            "anticipation created"
        );

        self.notify(TransitionEvent::new(
            EntityType::Anticipation,
            anticipation_id.into_inner(),
            "none",
            AnticipationStatus::Pending.as_str(),
        ))
        .await;

        Ok(model)
    }

    /// Ensures the account row exists and inserts the pending request in
    /// one database transaction.
    async fn persist_pending(
        &self,
        anticipation_id: AnticipationId,
        account_id: AccountId,
        amount: MinorUnits,
        breakdown: &saldo_core::fee::FeeBreakdown,
        lock_id: ReceivableLockId,
        now: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> Result<anticipations::Model, AnticipationError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        LedgerRepository::ensure_account(&txn, account_id)
            .await
            .map_err(store_err)?;

        let model = anticipations::ActiveModel {
            id: Set(anticipation_id.into_inner()),
            account_id: Set(account_id.into_inner()),
            requested_amount: Set(amount.into_inner()),
            fee_amount: Set(breakdown.fee_amount.into_inner()),
            net_amount: Set(breakdown.net_amount.into_inner()),
            status: Set(sea_orm_active_enums::AnticipationStatus::Pending),
            refused_reason: Set(None),
            receivable_lock_id: Set(Some(lock_id.into_inner())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(model)
    }

    async fn compensate_lock(&self, account_id: AccountId, lock_id: ReceivableLockId) {
        if let Err(e) = self.receivables.release_lock(lock_id).await {
            warn!(
                account_id = %account_id,
                lock_id = %lock_id,
                error = %e,
                "failed to release receivables lock after persist failure"
            );
        }
    }

    /// Approves a pending anticipation and credits the net amount to
    /// available balance.
    ///
    /// This is the single transition that credits immediately: approval
    /// means the platform has advanced the funds. Approving a non-pending
    /// anticipation fails with `InvalidTransition` — it never silently
    /// succeeds or credits twice.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` for non-admin actors
    /// - `NotFound` for unknown ids
    /// - `InvalidTransition` when the request is not pending
    pub async fn approve(
        &self,
        anticipation_id: AnticipationId,
        actor: &Actor,
    ) -> Result<anticipations::Model, AnticipationError> {
        ApprovalGate::authorize_anticipation_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let anticipation = ApprovalGate::lock_anticipation(&txn, anticipation_id).await?;

        let current = status_from_db(&anticipation.status);
        let action = AnticipationService::approve(current, actor.id)?;

        let account_id = AccountId::from_uuid(anticipation.account_id);
        let net = MinorUnits::new(anticipation.net_amount);
        LedgerRepository::commit_in(
            &txn,
            account_id,
            net,
            MovementKind::AnticipationCredit,
            anticipation_id.into_inner(),
        )
        .await
        .map_err(store_err)?;

        let mut active: anticipations::ActiveModel = anticipation.into();
        active.status = Set(status_to_db(action.new_status()));
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        info!(
            anticipation_id = %anticipation_id,
            actor = %actor.id,
            net = %net,
            "anticipation approved and credited"
        );

        self.emit(actor, transition_event(anticipation_id, current, action.new_status()))
            .await;

        Ok(updated)
    }

    /// Refuses a pending anticipation and releases the receivables lock.
    ///
    /// A missing reason fails before any state change.
    ///
    /// # Errors
    ///
    /// - `RefusalReasonRequired` for an empty reason
    /// - `InvalidTransition` when the request is not pending
    pub async fn deny(
        &self,
        anticipation_id: AnticipationId,
        reason: String,
        actor: &Actor,
    ) -> Result<anticipations::Model, AnticipationError> {
        ApprovalGate::authorize_anticipation_admin(actor)?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let anticipation = ApprovalGate::lock_anticipation(&txn, anticipation_id).await?;

        let current = status_from_db(&anticipation.status);
        let action = AnticipationService::deny(current, reason, actor.id)?;

        let refused_reason = match &action {
            AnticipationAction::Deny { reason, .. } => reason.clone(),
            AnticipationAction::Approve { .. } => String::new(),
        };
        let lock_id = anticipation.receivable_lock_id.map(ReceivableLockId::from_uuid);

        let mut active: anticipations::ActiveModel = anticipation.into();
        active.status = Set(status_to_db(action.new_status()));
        active.refused_reason = Set(Some(refused_reason));
        active.receivable_lock_id = Set(None);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        // The lock lives in the external receivables ledger; release it
        // after our commit. A failure here leaks the lock until the
        // reconciliation sweep retries, so it is loudly logged.
        if let Some(lock_id) = lock_id {
            if let Err(e) = self.receivables.release_lock(lock_id).await {
                warn!(
                    anticipation_id = %anticipation_id,
                    lock_id = %lock_id,
                    error = %e,
                    "failed to release receivables lock after refusal"
                );
            }
        }

        info!(anticipation_id = %anticipation_id, actor = %actor.id, "anticipation refused");

        self.emit(actor, transition_event(anticipation_id, current, action.new_status()))
            .await;

        Ok(updated)
    }

    /// Fetches one anticipation.
    ///
    /// # Errors
    ///
    /// `AnticipationError::NotFound` for unknown ids.
    pub async fn get(
        &self,
        anticipation_id: AnticipationId,
    ) -> Result<anticipations::Model, AnticipationError> {
        with_read_retry("anticipations.get", || {
            anticipations::Entity::find_by_id(anticipation_id.into_inner()).one(&self.db)
        })
        .await
        .map_err(db_err)?
        .ok_or(AnticipationError::NotFound(anticipation_id))
    }

    /// Lists anticipations, optionally filtered by account and status,
    /// newest first. Returns the page and the total match count.
    pub async fn list(
        &self,
        account_id: Option<AccountId>,
        status: Option<AnticipationStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<anticipations::Model>, u64), AnticipationError> {
        let mut query = anticipations::Entity::find();
        if let Some(account_id) = account_id {
            query = query.filter(anticipations::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(status) = status {
            query = query.filter(anticipations::Column::Status.eq(status_to_db(status)));
        }

        let total = with_read_retry("anticipations.count", || query.clone().count(&self.db))
            .await
            .map_err(db_err)?;

        let rows = with_read_retry("anticipations.list", || {
            query
                .clone()
                .order_by_desc(anticipations::Column::CreatedAt)
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
    anticipation_id: AnticipationId,
    from: AnticipationStatus,
    to: AnticipationStatus,
) -> TransitionEvent {
    TransitionEvent::new(
        EntityType::Anticipation,
        anticipation_id.into_inner(),
        from.as_str(),
        to.as_str(),
    )
}

fn db_err(e: sea_orm::DbErr) -> AnticipationError {
    AnticipationError::Database(e.to_string())
}

fn store_err(e: LedgerStoreError) -> AnticipationError {
    match e {
        LedgerStoreError::Ledger(inner) => AnticipationError::Ledger(inner),
        LedgerStoreError::Database(msg) => AnticipationError::Database(msg),
    }
}

fn receivables_err(e: CollaboratorError, requested: MinorUnits) -> AnticipationError {
    match e {
        CollaboratorError::InsufficientReceivables => {
            AnticipationError::InsufficientReceivables { requested }
        }
        CollaboratorError::Unavailable(msg) => AnticipationError::Unavailable(msg),
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts the database status to the core status.
pub(crate) fn status_from_db(
    status: &sea_orm_active_enums::AnticipationStatus,
) -> AnticipationStatus {
    match status {
        sea_orm_active_enums::AnticipationStatus::Pending => AnticipationStatus::Pending,
        sea_orm_active_enums::AnticipationStatus::Approved => AnticipationStatus::Approved,
        sea_orm_active_enums::AnticipationStatus::Refused => AnticipationStatus::Refused,
    }
}

/// Converts the core status to the database status.
pub(crate) fn status_to_db(
    status: AnticipationStatus,
) -> sea_orm_active_enums::AnticipationStatus {
    match status {
        AnticipationStatus::Pending => sea_orm_active_enums::AnticipationStatus::Pending,
        AnticipationStatus::Approved => sea_orm_active_enums::AnticipationStatus::Approved,
        AnticipationStatus::Refused => sea_orm_active_enums::AnticipationStatus::Refused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_roundtrip() {
        for status in [
            AnticipationStatus::Pending,
            AnticipationStatus::Approved,
            AnticipationStatus::Refused,
        ] {
            assert_eq!(status_from_db(&status_to_db(status)), status);
        }
    }
}
