//! Traits for the external systems the engine talks to.
//!
//! These are the seams of the engine: PIX key verification, the
//! receivables ledger, the notification sink, and the audit trail all live
//! in other services. The engine consumes them through these traits and
//! the binaries wire in concrete implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use saldo_shared::types::{AccountId, ActorId, MinorUnits, PixKeyId, ReceivableLockId};

/// Entity kinds that emit lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A withdrawal request.
    Withdrawal,
    /// An anticipation request.
    Anticipation,
}

impl EntityType {
    /// Returns the string representation of the entity type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Withdrawal => "withdrawal",
            Self::Anticipation => "anticipation",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle event emitted on every committed transition.
///
/// Delivery is fire-and-forget and at-least-once; consumers dedupe on
/// `(entity_id, new_status)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Kind of entity that transitioned.
    pub entity_type: EntityType,
    /// The entity's id.
    pub entity_id: Uuid,
    /// Status before the transition.
    pub old_status: String,
    /// Status after the transition.
    pub new_status: String,
    /// When the transition committed.
    pub timestamp: DateTime<Utc>,
}

impl TransitionEvent {
    /// Builds an event for a committed transition.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        entity_id: Uuid,
        old_status: &str,
        new_status: &str,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            old_status: old_status.to_string(),
            new_status: new_status.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Errors from collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The account lacks enough anticipatable receivables for the lock.
    #[error("insufficient anticipatable receivables")]
    InsufficientReceivables,

    /// The collaborator could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// PIX key verification service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PixKeyVerifier: Send + Sync {
    /// Returns true if the key is verified and belongs to the account.
    async fn is_verified(
        &self,
        account_id: AccountId,
        pix_key_id: PixKeyId,
    ) -> Result<bool, CollaboratorError>;
}

/// Receivables ledger owning the anticipatable balance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceivablesLedger: Send + Sync {
    /// Locks `amount` of the account's receivables for anticipation.
    ///
    /// # Errors
    ///
    /// `CollaboratorError::InsufficientReceivables` when the account does
    /// not have `amount` of anticipatable receivables.
    async fn lock_for_anticipation(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
    ) -> Result<ReceivableLockId, CollaboratorError>;

    /// Releases a previously taken lock (refusal or compensating action).
    async fn release_lock(&self, lock_id: ReceivableLockId) -> Result<(), CollaboratorError>;
}

/// Sink for lifecycle events driving alerts and webhooks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one event. Failures are logged by the caller, never
    /// propagated into the transition.
    async fn notify(&self, event: TransitionEvent) -> Result<(), CollaboratorError>;
}

/// Audit trail for gate-mediated transitions, keyed by actor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Records one transition. Best-effort: a failure surfaces as a
    /// warning, never as a failure of the underlying transition.
    async fn record(&self, actor: ActorId, event: &TransitionEvent)
    -> Result<(), CollaboratorError>;
}
