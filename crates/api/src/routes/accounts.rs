//! Account balance and reconciliation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::routes::withdrawals::require_account;
use crate::{AppState, middleware::AuthUser};
use saldo_core::ledger::{AccountBalances, LedgerError};
use saldo_db::repositories::LedgerStoreError;
use saldo_shared::types::AccountId;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{id}/balance", get(get_balance))
        .route("/accounts/{id}/reconcile", post(reconcile_account))
}

/// Response for an account's balances.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: Uuid,
    /// Spendable balance in minor units.
    pub available_balance: i64,
    /// Balance held for pending withdrawals, in minor units.
    pub reserved_balance: i64,
    /// Announced but unsettled balance, in minor units.
    pub pending_balance: i64,
}

impl BalanceResponse {
    fn new(account_id: Uuid, balances: AccountBalances) -> Self {
        Self {
            account_id,
            available_balance: balances.available.into_inner(),
            reserved_balance: balances.reserved.into_inner(),
            pending_balance: balances.pending.into_inner(),
        }
    }
}

/// GET `/accounts/{id}/balance` - Read the balance triple.
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = require_account(&actor, id) {
        return response;
    }

    match state.ledger.balance(AccountId::from_uuid(id)).await {
        Ok(balances) => (StatusCode::OK, Json(BalanceResponse::new(id, balances))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

/// POST `/accounts/{id}/reconcile` - Replay the movement log and verify
/// it matches the stored balances. Admin-only; this is the endpoint the
/// periodic reconciliation job drives.
async fn reconcile_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if actor.require_admin().is_err() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "admin_required",
                "message": "Admin role required for reconciliation"
            })),
        )
            .into_response();
    }

    match state.ledger.reconcile(AccountId::from_uuid(id)).await {
        Ok(balances) => (StatusCode::OK, Json(BalanceResponse::new(id, balances))).into_response(),
        Err(e) => ledger_error_response(&e),
    }
}

fn ledger_error_response(e: &LedgerStoreError) -> Response {
    let (status, code) = match e {
        LedgerStoreError::Ledger(inner) => (
            StatusCode::from_u16(inner.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            inner.error_code(),
        ),
        LedgerStoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
    };

    let message = if status.is_server_error() {
        error!(error = %e, "ledger operation failed");
        "operation failed, try again".to_string()
    } else {
        e.to_string()
    };

    (
        status,
        Json(json!({
            "error": code,
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_response_mapping() {
        let id = Uuid::new_v4();
        let response = BalanceResponse::new(id, AccountBalances::new(3_000, 7_000, 0));
        assert_eq!(response.account_id, id);
        assert_eq!(response.available_balance, 3_000);
        assert_eq!(response.reserved_balance, 7_000);
        assert_eq!(response.pending_balance, 0);
    }

    #[test]
    fn test_corruption_maps_to_server_error() {
        let err = LedgerStoreError::Ledger(LedgerError::Corruption("drift".into()));
        let response = ledger_error_response(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
