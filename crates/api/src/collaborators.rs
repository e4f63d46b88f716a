//! Default collaborator implementations for wiring the server.
//!
//! The engine only knows the traits in `saldo-core::collaborators`;
//! deployments wire real service clients here. The tracing-backed sinks
//! are production defaults (events land in structured logs); the PIX and
//! receivables implementations below are development stand-ins for the
//! external services and must be replaced before taking real traffic.

use async_trait::async_trait;
use tracing::{info, warn};

use saldo_core::collaborators::{
    AuditLog, CollaboratorError, NotificationSink, PixKeyVerifier, ReceivablesLedger,
    TransitionEvent,
};
use saldo_shared::types::{AccountId, ActorId, MinorUnits, PixKeyId, ReceivableLockId};

/// Notification sink that writes events to the structured log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn notify(&self, event: TransitionEvent) -> Result<(), CollaboratorError> {
        info!(
            target: "saldo::events",
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            old_status = %event.old_status,
            new_status = %event.new_status,
            "lifecycle event"
        );
        Ok(())
    }
}

/// Notification sink that POSTs events to a webhook endpoint as JSON.
///
/// Delivery is at-least-once from the engine's perspective; the consumer
/// dedupes on `(entity_id, new_status)`.
#[derive(Debug, Clone)]
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotificationSink {
    /// Creates a sink posting to the given endpoint.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn notify(&self, event: TransitionEvent) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(&self.url)
            .json(&event)
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CollaboratorError::Unavailable(format!(
                "webhook returned {}",
                response.status()
            )))
        }
    }
}

/// Audit log that mirrors transitions into the structured log under a
/// dedicated target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(
        &self,
        actor: ActorId,
        event: &TransitionEvent,
    ) -> Result<(), CollaboratorError> {
        info!(
            target: "saldo::audit",
            actor = %actor,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            old_status = %event.old_status,
            new_status = %event.new_status,
            "gate transition"
        );
        Ok(())
    }
}

/// Development stand-in for the PIX key verification service.
///
/// Accepts every key and says so loudly. Replace with the real verifier
/// client before taking real traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevPixKeyVerifier;

#[async_trait]
impl PixKeyVerifier for DevPixKeyVerifier {
    async fn is_verified(
        &self,
        account_id: AccountId,
        pix_key_id: PixKeyId,
    ) -> Result<bool, CollaboratorError> {
        warn!(
            account_id = %account_id,
            pix_key_id = %pix_key_id,
            "DevPixKeyVerifier accepting key without verification"
        );
        Ok(true)
    }
}

/// Development stand-in for the receivables ledger.
///
/// Grants every lock. Replace with the real receivables client before
/// taking real traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevReceivablesLedger;

#[async_trait]
impl ReceivablesLedger for DevReceivablesLedger {
    async fn lock_for_anticipation(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
    ) -> Result<ReceivableLockId, CollaboratorError> {
        let lock_id = ReceivableLockId::new();
        warn!(
            account_id = %account_id,
            amount = %amount,
            lock_id = %lock_id,
            "DevReceivablesLedger granting lock without a receivables check"
        );
        Ok(lock_id)
    }

    async fn release_lock(&self, lock_id: ReceivableLockId) -> Result<(), CollaboratorError> {
        info!(lock_id = %lock_id, "DevReceivablesLedger released lock");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saldo_core::collaborators::EntityType;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingNotificationSink;
        let event =
            TransitionEvent::new(EntityType::Withdrawal, Uuid::new_v4(), "pending", "approved");
        assert!(sink.notify(event).await.is_ok());
    }

    #[tokio::test]
    async fn test_dev_receivables_round_trip() {
        let ledger = DevReceivablesLedger;
        let lock = ledger
            .lock_for_anticipation(AccountId::new(), MinorUnits::new(1_000))
            .await
            .unwrap();
        assert!(ledger.release_lock(lock).await.is_ok());
    }
}
