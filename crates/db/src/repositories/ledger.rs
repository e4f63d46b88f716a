//! Ledger repository: the single write path for account balances.
//!
//! Every mutation locks the account row with `SELECT ... FOR UPDATE`
//! inside a database transaction, computes the next balance triple through
//! the pure arithmetic in `saldo-core`, and persists the movement and the
//! updated balances together. The row lock is the single-writer-per-account
//! serialization point: two concurrent reservations on one account queue
//! behind it and cannot race past the availability check.
//!
//! Accounts are created implicitly on first movement and never deleted.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use saldo_core::ledger::{AccountBalances, LedgerError, Movement, MovementKind};
use saldo_shared::types::{AccountId, MinorUnits, MovementId};

use crate::entities::{accounts, movements, sea_orm_active_enums};
use crate::retry::with_read_retry;

/// Errors from ledger store operations.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    /// Balance arithmetic rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// The ledger store.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // In-transaction operations
    //
    // The workflow repositories call these on their own transaction so the
    // balance change and the request-row change commit or roll back
    // together.
    // ========================================================================

    /// Creates the account row with zero balances if it does not exist.
    ///
    /// A concurrent creator may win the insert; the conflict is ignored.
    pub(crate) async fn ensure_account(
        txn: &DatabaseTransaction,
        account_id: AccountId,
    ) -> Result<(), LedgerStoreError> {
        let now = Utc::now().into();
        let fresh = accounts::ActiveModel {
            id: Set(account_id.into_inner()),
            available_balance: Set(0),
            reserved_balance: Set(0),
            pending_balance: Set(0),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        accounts::Entity::insert(fresh)
            .on_conflict(
                OnConflict::column(accounts::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Locks the account row, creating it if this is its first movement.
    pub(crate) async fn lock_account(
        txn: &DatabaseTransaction,
        account_id: AccountId,
    ) -> Result<accounts::Model, LedgerStoreError> {
        if let Some(account) = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_err)?
        {
            return Ok(account);
        }

        Self::ensure_account(txn, account_id).await?;

        accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| db_err_msg("account row missing after implicit creation"))
    }

    /// Appends one movement and adjusts the balances, atomically with the
    /// caller's transaction.
    ///
    /// `magnitude` is positive; the kind determines the stored sign.
    ///
    /// # Errors
    ///
    /// Propagates `LedgerError` from the balance arithmetic; fatal and
    /// invalid-state errors are logged with full context before returning.
    pub(crate) async fn apply_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        kind: MovementKind,
        magnitude: MinorUnits,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        let account = Self::lock_account(txn, account_id).await?;
        let balances = AccountBalances::new(
            account.available_balance,
            account.reserved_balance,
            account.pending_balance,
        );

        let amount = kind.signed_amount(magnitude);
        let next = balances.apply(kind, amount).inspect_err(|e| {
            if matches!(e, LedgerError::Corruption(_) | LedgerError::InvalidState(_)) {
                error!(
                    account_id = %account_id,
                    reference_id = %reference_id,
                    kind = %kind,
                    amount = %amount,
                    error = %e,
                    "ledger operation violated bookkeeping"
                );
            }
        })?;

        let version = account.version;
        let now = Utc::now().into();

        movements::ActiveModel {
            id: Set(MovementId::new().into_inner()),
            account_id: Set(account_id.into_inner()),
            amount: Set(amount.into_inner()),
            kind: Set(kind_to_db(kind)),
            reference_id: Set(reference_id),
            created_at: Set(now),
        }
        .insert(txn)
        .await
        .map_err(db_err)?;

        let mut active: accounts::ActiveModel = account.into();
        active.available_balance = Set(next.available.into_inner());
        active.reserved_balance = Set(next.reserved.into_inner());
        active.pending_balance = Set(next.pending.into_inner());
        active.version = Set(version + 1);
        active.updated_at = Set(now);
        active.update(txn).await.map_err(db_err)?;

        Ok(next)
    }

    /// Moves `amount` from available to reserved within the caller's
    /// transaction.
    pub(crate) async fn reserve_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        amount: MinorUnits,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        Self::apply_in(txn, account_id, MovementKind::ReserveHold, amount, reference_id).await
    }

    /// Moves `amount` from reserved back to available within the caller's
    /// transaction.
    pub(crate) async fn release_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        amount: MinorUnits,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        Self::apply_in(
            txn,
            account_id,
            MovementKind::ReserveRelease,
            amount,
            reference_id,
        )
        .await
    }

    /// Commits a movement of the given kind within the caller's
    /// transaction.
    pub(crate) async fn commit_in(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        amount: MinorUnits,
        kind: MovementKind,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        Self::apply_in(txn, account_id, kind, amount, reference_id).await
    }

    // ========================================================================
    // Standalone operations
    // ========================================================================

    /// Moves `amount` from available to reserved.
    ///
    /// # Errors
    ///
    /// `LedgerError::InsufficientFunds` when available balance cannot
    /// cover the amount.
    pub async fn reserve(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let balances = Self::reserve_in(&txn, account_id, amount, reference_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(balances)
    }

    /// Moves `amount` from reserved back to available.
    ///
    /// # Errors
    ///
    /// `LedgerError::InvalidState` when the reservation does not cover the
    /// amount.
    pub async fn release(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let balances = Self::release_in(&txn, account_id, amount, reference_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(balances)
    }

    /// Appends a movement of the given kind and adjusts balances.
    pub async fn commit(
        &self,
        account_id: AccountId,
        amount: MinorUnits,
        kind: MovementKind,
        reference_id: Uuid,
    ) -> Result<AccountBalances, LedgerStoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let balances = Self::commit_in(&txn, account_id, amount, kind, reference_id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(balances)
    }

    /// Read-committed snapshot of the account's balance triple.
    ///
    /// Accounts exist implicitly: an account with no movements reads as
    /// all-zero.
    pub async fn balance(&self, account_id: AccountId) -> Result<AccountBalances, LedgerStoreError> {
        let account = with_read_retry("ledger.balance", || {
            accounts::Entity::find_by_id(account_id.into_inner()).one(&self.db)
        })
        .await
        .map_err(db_err)?;

        Ok(account.map_or(AccountBalances::ZERO, |a| {
            AccountBalances::new(a.available_balance, a.reserved_balance, a.pending_balance)
        }))
    }

    /// All movements for an account, in commit order.
    pub async fn movements(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Movement>, LedgerStoreError> {
        let rows = with_read_retry("ledger.movements", || {
            movements::Entity::find()
                .filter(movements::Column::AccountId.eq(account_id.into_inner()))
                .order_by_asc(movements::Column::Id)
                .all(&self.db)
        })
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(movement_from_db).collect())
    }

    /// All movements referencing one withdrawal or anticipation.
    pub async fn movements_for_reference(
        &self,
        reference_id: Uuid,
    ) -> Result<Vec<Movement>, LedgerStoreError> {
        let rows = with_read_retry("ledger.movements_for_reference", || {
            movements::Entity::find()
                .filter(movements::Column::ReferenceId.eq(reference_id))
                .order_by_asc(movements::Column::Id)
                .all(&self.db)
        })
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(movement_from_db).collect())
    }

    /// Replays the account's movement log and verifies it reproduces the
    /// stored balance triple.
    ///
    /// This is the check the periodic reconciliation job runs per account.
    ///
    /// # Errors
    ///
    /// `LedgerError::Corruption` on any divergence; the error is logged
    /// with full context and the caller must halt processing for the
    /// account and alert.
    pub async fn reconcile(
        &self,
        account_id: AccountId,
    ) -> Result<AccountBalances, LedgerStoreError> {
        let stored = self.balance(account_id).await?;
        let log = self.movements(account_id).await?;

        let replayed =
            AccountBalances::replay(log.iter().map(|m| (m.kind, m.amount))).map_err(|e| {
                corruption(
                    account_id,
                    format!("movement log does not replay cleanly: {e}"),
                )
            })?;

        if replayed != stored {
            return Err(corruption(
                account_id,
                format!("stored balances {stored:?} diverge from replayed {replayed:?}"),
            ));
        }

        Ok(stored)
    }

    /// Paginated count of movements for an account.
    pub async fn movement_count(&self, account_id: AccountId) -> Result<u64, LedgerStoreError> {
        with_read_retry("ledger.movement_count", || {
            movements::Entity::find()
                .filter(movements::Column::AccountId.eq(account_id.into_inner()))
                .count(&self.db)
        })
        .await
        .map_err(db_err)
    }
}

fn corruption(account_id: AccountId, detail: String) -> LedgerStoreError {
    let err = LedgerError::Corruption(detail);
    error!(account_id = %account_id, error = %err, "reconciliation failed; halt this account");
    LedgerStoreError::Ledger(err)
}

fn db_err(e: sea_orm::DbErr) -> LedgerStoreError {
    LedgerStoreError::Database(e.to_string())
}

fn db_err_msg(msg: &str) -> LedgerStoreError {
    LedgerStoreError::Database(msg.to_string())
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Maps a movement row into the domain movement.
fn movement_from_db(model: movements::Model) -> Movement {
    Movement {
        id: MovementId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        amount: MinorUnits::new(model.amount),
        kind: kind_from_db(&model.kind),
        reference_id: model.reference_id,
        created_at: model.created_at.into(),
    }
}

/// Converts a core movement kind to the database enum.
pub fn kind_to_db(kind: MovementKind) -> sea_orm_active_enums::MovementKind {
    match kind {
        MovementKind::WithdrawalDebit => sea_orm_active_enums::MovementKind::WithdrawalDebit,
        MovementKind::WithdrawalReversal => sea_orm_active_enums::MovementKind::WithdrawalReversal,
        MovementKind::AnticipationCredit => sea_orm_active_enums::MovementKind::AnticipationCredit,
        MovementKind::FeeDebit => sea_orm_active_enums::MovementKind::FeeDebit,
        MovementKind::ReserveHold => sea_orm_active_enums::MovementKind::ReserveHold,
        MovementKind::ReserveRelease => sea_orm_active_enums::MovementKind::ReserveRelease,
    }
}

/// Converts a database movement kind to the core enum.
pub fn kind_from_db(kind: &sea_orm_active_enums::MovementKind) -> MovementKind {
    match kind {
        sea_orm_active_enums::MovementKind::WithdrawalDebit => MovementKind::WithdrawalDebit,
        sea_orm_active_enums::MovementKind::WithdrawalReversal => MovementKind::WithdrawalReversal,
        sea_orm_active_enums::MovementKind::AnticipationCredit => MovementKind::AnticipationCredit,
        sea_orm_active_enums::MovementKind::FeeDebit => MovementKind::FeeDebit,
        sea_orm_active_enums::MovementKind::ReserveHold => MovementKind::ReserveHold,
        sea_orm_active_enums::MovementKind::ReserveRelease => MovementKind::ReserveRelease,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_conversion_roundtrip() {
        for kind in [
            MovementKind::WithdrawalDebit,
            MovementKind::WithdrawalReversal,
            MovementKind::AnticipationCredit,
            MovementKind::FeeDebit,
            MovementKind::ReserveHold,
            MovementKind::ReserveRelease,
        ] {
            assert_eq!(kind_from_db(&kind_to_db(kind)), kind);
        }
    }
}
