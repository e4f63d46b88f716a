//! Approval gate: at-most-once admin transitions per entity.
//!
//! Every state-changing admin action follows the same discipline:
//!
//! 1. the actor's role is checked for the admin capability;
//! 2. a database transaction is opened and the request row is acquired
//!    with `SELECT ... FOR UPDATE`;
//! 3. the state machine in `saldo-core` validates against the status read
//!    under that lock, so of two concurrent callers exactly one commits
//!    and the other gets `InvalidTransition`;
//! 4. the transaction commits only on success — every other exit path
//!    (validation failure, error, unwinding) drops the transaction guard,
//!    which rolls back and releases the lock;
//! 5. the committed transition is mirrored into the audit log, keyed by
//!    actor. Audit is best-effort: a failure is a warning, never a failure
//!    of the transition itself.
//!
//! Lock granularity is the single request row, so transitions on
//! different withdrawals or anticipations never contend.

use sea_orm::{DatabaseTransaction, EntityTrait, QuerySelect};
use std::sync::Arc;
use tracing::warn;

use saldo_core::anticipation::AnticipationError;
use saldo_core::collaborators::{AuditLog, TransitionEvent};
use saldo_core::gate::Actor;
use saldo_core::withdrawal::WithdrawalError;
use saldo_shared::types::{ActorId, AnticipationId, WithdrawalId};

use crate::entities::{anticipations, withdrawals};

/// The approval gate.
#[derive(Clone)]
pub struct ApprovalGate {
    audit: Arc<dyn AuditLog>,
}

impl ApprovalGate {
    /// Creates a gate mirroring transitions into the given audit log.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { audit }
    }

    /// Checks the admin capability for withdrawal transitions.
    ///
    /// # Errors
    ///
    /// Returns `WithdrawalError::NotAuthorized` for non-admin actors.
    pub fn authorize_withdrawal_admin(actor: &Actor) -> Result<(), WithdrawalError> {
        actor
            .require_admin()
            .map_err(|_| WithdrawalError::NotAuthorized {
                role: actor.role.as_str().to_string(),
            })
    }

    /// Checks the admin capability for anticipation transitions.
    ///
    /// # Errors
    ///
    /// Returns `AnticipationError::NotAuthorized` for non-admin actors.
    pub fn authorize_anticipation_admin(actor: &Actor) -> Result<(), AnticipationError> {
        actor
            .require_admin()
            .map_err(|_| AnticipationError::NotAuthorized {
                role: actor.role.as_str().to_string(),
            })
    }

    /// Acquires the withdrawal row with an exclusive lock.
    ///
    /// The caller re-validates the status it reads from the returned row;
    /// a concurrent transition that committed first is seen here, not
    /// after the update.
    ///
    /// # Errors
    ///
    /// `WithdrawalError::NotFound` if the row does not exist.
    pub async fn lock_withdrawal(
        txn: &DatabaseTransaction,
        withdrawal_id: WithdrawalId,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        withdrawals::Entity::find_by_id(withdrawal_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| WithdrawalError::Database(e.to_string()))?
            .ok_or(WithdrawalError::NotFound(withdrawal_id))
    }

    /// Acquires the anticipation row with an exclusive lock.
    ///
    /// # Errors
    ///
    /// `AnticipationError::NotFound` if the row does not exist.
    pub async fn lock_anticipation(
        txn: &DatabaseTransaction,
        anticipation_id: AnticipationId,
    ) -> Result<anticipations::Model, AnticipationError> {
        anticipations::Entity::find_by_id(anticipation_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(|e| AnticipationError::Database(e.to_string()))?
            .ok_or(AnticipationError::NotFound(anticipation_id))
    }

    /// Mirrors a committed transition into the audit trail.
    ///
    /// Best-effort: a failed audit write is surfaced as a warning metric,
    /// never as a failure of the underlying transition.
    pub async fn mirror(&self, actor: ActorId, event: &TransitionEvent) {
        if let Err(e) = self.audit.record(actor, event).await {
            warn!(
                monotonic_counter.audit_mirror_failures = 1,
                actor = %actor,
                entity_type = %event.entity_type,
                entity_id = %event.entity_id,
                error = %e,
                "failed to mirror transition into audit log"
            );
        }
    }
}
