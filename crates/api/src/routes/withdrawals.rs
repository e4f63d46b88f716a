//! Withdrawal routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use saldo_core::gate::Actor;
use saldo_core::withdrawal::{WithdrawalError, WithdrawalStatus};
use saldo_db::entities::{sea_orm_active_enums, withdrawals};
use saldo_shared::types::{AccountId, MinorUnits, PageRequest, PageResponse, PixKeyId, WithdrawalId};

/// Creates the withdrawal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/withdrawals", post(create_withdrawal))
        .route("/withdrawals", get(list_withdrawals))
        .route("/withdrawals/{id}", get(get_withdrawal))
        .route("/withdrawals/{id}/approve", post(approve_withdrawal))
        .route("/withdrawals/{id}/deny", post(deny_withdrawal))
        .route("/withdrawals/{id}/paid", post(mark_withdrawal_paid))
        .route(
            "/withdrawals/{id}/paid-manual",
            post(mark_withdrawal_paid_manual),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a withdrawal.
#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    /// Target account; defaults to the actor's own account.
    pub account_id: Option<Uuid>,
    /// Gross amount in minor currency units.
    pub amount: i64,
    /// The PIX key to pay out to.
    pub pix_key_id: Uuid,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Request body for denying a withdrawal.
#[derive(Debug, Deserialize)]
pub struct DenyWithdrawalRequest {
    /// Mandatory denial reason.
    pub reason: String,
}

/// Request body for marking a withdrawal paid through the rail.
#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    /// Rail-assigned end-to-end identifier.
    pub end_to_end_id: String,
}

/// Query parameters for listing withdrawals.
#[derive(Debug, Deserialize)]
pub struct ListWithdrawalsQuery {
    /// Filter by status name.
    pub status: Option<String>,
    /// Filter by account.
    pub account_id: Option<Uuid>,
    /// Page size.
    pub limit: Option<u64>,
    /// Page offset.
    pub offset: Option<u64>,
}

/// Response for a withdrawal.
#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    /// Withdrawal ID.
    pub id: Uuid,
    /// Account ID.
    pub account_id: Uuid,
    /// Gross requested amount in minor units.
    pub requested_amount: i64,
    /// Fee in minor units.
    pub fee_amount: i64,
    /// Net amount in minor units.
    pub net_amount: i64,
    /// Lifecycle status.
    pub status: &'static str,
    /// Target PIX key.
    pub pix_key_id: Uuid,
    /// Description.
    pub description: String,
    /// Denial reason, if denied.
    pub reason_for_denial: Option<String>,
    /// Rail end-to-end id, if paid.
    pub end_to_end_id: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
    /// Paid at timestamp, if paid.
    pub paid_at: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/withdrawals` - Request a withdrawal.
async fn create_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateWithdrawalRequest>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let account_id = match resolve_account(&actor, payload.account_id) {
        Ok(account_id) => account_id,
        Err(response) => return response,
    };

    match state
        .withdrawals
        .create(
            account_id,
            MinorUnits::new(payload.amount),
            PixKeyId::from_uuid(payload.pix_key_id),
            payload.description,
        )
        .await
    {
        Ok(model) => (StatusCode::CREATED, Json(to_response(model))).into_response(),
        Err(e) => withdrawal_error_response(&e),
    }
}

/// GET `/withdrawals` - List withdrawals with status/limit/offset filters.
async fn list_withdrawals(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListWithdrawalsQuery>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let status = match parse_status_filter(query.status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };
    let account_id = match resolve_list_scope(&actor, query.account_id) {
        Ok(account_id) => account_id,
        Err(response) => return response,
    };

    let page = PageRequest {
        limit: query.limit.unwrap_or_else(|| PageRequest::default().limit),
        offset: query.offset.unwrap_or(0),
    };

    match state.withdrawals.list(account_id, status, &page).await {
        Ok((rows, total)) => {
            let items: Vec<WithdrawalResponse> = rows.into_iter().map(to_response).collect();
            (StatusCode::OK, Json(PageResponse::new(items, &page, total))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list withdrawals");
            withdrawal_error_response(&e)
        }
    }
}

/// GET `/withdrawals/{id}` - Fetch one withdrawal.
async fn get_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state.withdrawals.get(WithdrawalId::from_uuid(id)).await {
        Ok(model) => {
            if let Err(response) = require_account(&actor, model.account_id) {
                return response;
            }
            (StatusCode::OK, Json(to_response(model))).into_response()
        }
        Err(e) => withdrawal_error_response(&e),
    }
}

/// POST `/withdrawals/{id}/approve` - Approve a pending withdrawal.
async fn approve_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .withdrawals
        .approve(WithdrawalId::from_uuid(id), &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => withdrawal_error_response(&e),
    }
}

/// POST `/withdrawals/{id}/deny` - Deny a withdrawal with a reason.
async fn deny_withdrawal(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DenyWithdrawalRequest>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .withdrawals
        .deny(WithdrawalId::from_uuid(id), payload.reason, &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => withdrawal_error_response(&e),
    }
}

/// POST `/withdrawals/{id}/paid` - Record a rail-confirmed payout.
async fn mark_withdrawal_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MarkPaidRequest>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .withdrawals
        .mark_done(WithdrawalId::from_uuid(id), payload.end_to_end_id, &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => withdrawal_error_response(&e),
    }
}

/// POST `/withdrawals/{id}/paid-manual` - Record a manual settlement.
async fn mark_withdrawal_paid_manual(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .withdrawals
        .mark_done_manual(WithdrawalId::from_uuid(id), &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => withdrawal_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn to_response(model: withdrawals::Model) -> WithdrawalResponse {
    WithdrawalResponse {
        id: model.id,
        account_id: model.account_id,
        requested_amount: model.requested_amount,
        fee_amount: model.fee_amount,
        net_amount: model.net_amount,
        status: status_str(&model.status),
        pix_key_id: model.pix_key_id,
        description: model.description,
        reason_for_denial: model.reason_for_denial,
        end_to_end_id: model.end_to_end_id,
        created_at: model.created_at.to_rfc3339(),
        updated_at: model.updated_at.to_rfc3339(),
        paid_at: model.paid_at.map(|t| t.to_rfc3339()),
    }
}

fn status_str(status: &sea_orm_active_enums::WithdrawalStatus) -> &'static str {
    match status {
        sea_orm_active_enums::WithdrawalStatus::Pending => "pending",
        sea_orm_active_enums::WithdrawalStatus::Approved => "approved",
        sea_orm_active_enums::WithdrawalStatus::Done => "done",
        sea_orm_active_enums::WithdrawalStatus::DoneManual => "done_manual",
        sea_orm_active_enums::WithdrawalStatus::Cancelled => "cancelled",
    }
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<WithdrawalStatus>, Response> {
    match status {
        None => Ok(None),
        Some(s) => WithdrawalStatus::parse(s).map(Some).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!(
                        "Unknown status '{s}'; expected pending, approved, done, done_manual, or cancelled"
                    )
                })),
            )
                .into_response()
        }),
    }
}

/// Resolves the account a create targets: the actor's own account unless
/// an explicit one was requested and the actor may touch it.
pub(crate) fn resolve_account(
    actor: &Actor,
    requested: Option<Uuid>,
) -> Result<AccountId, Response> {
    match requested {
        Some(id) => {
            let account_id = AccountId::from_uuid(id);
            require_account(actor, id)?;
            Ok(account_id)
        }
        None => actor.account_id.ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "account_required",
                    "message": "account_id is required for actors without a wallet account"
                })),
            )
                .into_response()
        }),
    }
}

/// Resolves the account scope of a list: merchants see their own account,
/// operators see everything unless they narrow the filter.
pub(crate) fn resolve_list_scope(
    actor: &Actor,
    requested: Option<Uuid>,
) -> Result<Option<AccountId>, Response> {
    match requested {
        Some(id) => {
            require_account(actor, id)?;
            Ok(Some(AccountId::from_uuid(id)))
        }
        None => {
            if actor.role.can_read_any_account() {
                Ok(None)
            } else {
                Ok(Some(resolve_account(actor, None)?))
            }
        }
    }
}

pub(crate) fn require_account(actor: &Actor, account_id: Uuid) -> Result<(), Response> {
    actor
        .require_account_access(AccountId::from_uuid(account_id))
        .map_err(|e| {
            (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": e.to_string()
                })),
            )
                .into_response()
        })
}

fn withdrawal_error_response(e: &WithdrawalError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Internal causes stay in the log; the caller gets an opaque message.
    let message = if status.is_server_error() {
        error!(error = %e, "withdrawal operation failed");
        "operation failed, try again".to_string()
    } else {
        e.to_string()
    };

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": message
        })),
    )
        .into_response()
}
