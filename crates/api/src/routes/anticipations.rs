//! Anticipation routes.

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

use crate::routes::withdrawals::{require_account, resolve_account, resolve_list_scope};
use crate::{AppState, middleware::AuthUser};
use saldo_core::anticipation::{AnticipationError, AnticipationStatus};
use saldo_db::entities::{anticipations, sea_orm_active_enums};
use saldo_shared::types::{AnticipationId, MinorUnits, PageRequest, PageResponse};

/// Creates the anticipation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/anticipations", post(create_anticipation))
        .route("/anticipations", get(list_anticipations))
        .route("/anticipations/{id}", get(get_anticipation))
        .route("/anticipations/{id}/approve", post(approve_anticipation))
        .route("/anticipations/{id}/deny", post(deny_anticipation))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an anticipation.
#[derive(Debug, Deserialize)]
pub struct CreateAnticipationRequest {
    /// Target account; defaults to the actor's own account.
    pub account_id: Option<Uuid>,
    /// Gross receivable amount to anticipate, in minor currency units.
    pub amount: i64,
}

/// Request body for refusing an anticipation.
#[derive(Debug, Deserialize)]
pub struct DenyAnticipationRequest {
    /// Mandatory refusal reason.
    pub reason: String,
}

/// Query parameters for listing anticipations.
#[derive(Debug, Deserialize)]
pub struct ListAnticipationsQuery {
    /// Filter by status name.
    pub status: Option<String>,
    /// Filter by account.
    pub account_id: Option<Uuid>,
    /// Page size.
    pub limit: Option<u64>,
    /// Page offset.
    pub offset: Option<u64>,
}

/// Response for an anticipation.
#[derive(Debug, Serialize)]
pub struct AnticipationResponse {
    /// Anticipation ID.
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
    /// Refusal reason, if refused.
    pub refused_reason: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/anticipations` - Request anticipation of receivables.
async fn create_anticipation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAnticipationRequest>,
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
        .anticipations
        .create(account_id, MinorUnits::new(payload.amount))
        .await
    {
        Ok(model) => (StatusCode::CREATED, Json(to_response(model))).into_response(),
        Err(e) => anticipation_error_response(&e),
    }
}

/// GET `/anticipations` - List anticipations with status/limit/offset filters.
async fn list_anticipations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListAnticipationsQuery>,
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

    match state.anticipations.list(account_id, status, &page).await {
        Ok((rows, total)) => {
            let items: Vec<AnticipationResponse> = rows.into_iter().map(to_response).collect();
            (StatusCode::OK, Json(PageResponse::new(items, &page, total))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list anticipations");
            anticipation_error_response(&e)
        }
    }
}

/// GET `/anticipations/{id}` - Fetch one anticipation.
async fn get_anticipation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state.anticipations.get(AnticipationId::from_uuid(id)).await {
        Ok(model) => {
            if let Err(response) = require_account(&actor, model.account_id) {
                return response;
            }
            (StatusCode::OK, Json(to_response(model))).into_response()
        }
        Err(e) => anticipation_error_response(&e),
    }
}

/// POST `/anticipations/{id}/approve` - Approve and credit the advance.
async fn approve_anticipation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .anticipations
        .approve(AnticipationId::from_uuid(id), &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => anticipation_error_response(&e),
    }
}

/// POST `/anticipations/{id}/deny` - Refuse an anticipation with a reason.
async fn deny_anticipation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DenyAnticipationRequest>,
) -> impl IntoResponse {
    let actor = match auth.actor() {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match state
        .anticipations
        .deny(AnticipationId::from_uuid(id), payload.reason, &actor)
        .await
    {
        Ok(model) => (StatusCode::OK, Json(to_response(model))).into_response(),
        Err(e) => anticipation_error_response(&e),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn to_response(model: anticipations::Model) -> AnticipationResponse {
    AnticipationResponse {
        id: model.id,
        account_id: model.account_id,
        requested_amount: model.requested_amount,
        fee_amount: model.fee_amount,
        net_amount: model.net_amount,
        status: status_str(&model.status),
        refused_reason: model.refused_reason,
        created_at: model.created_at.to_rfc3339(),
        updated_at: model.updated_at.to_rfc3339(),
    }
}

fn status_str(status: &sea_orm_active_enums::AnticipationStatus) -> &'static str {
    match status {
        sea_orm_active_enums::AnticipationStatus::Pending => "pending",
        sea_orm_active_enums::AnticipationStatus::Approved => "approved",
        sea_orm_active_enums::AnticipationStatus::Refused => "refused",
    }
}

fn parse_status_filter(status: Option<&str>) -> Result<Option<AnticipationStatus>, Response> {
    match status {
        None => Ok(None),
        Some(s) => AnticipationStatus::parse(s).map(Some).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_status",
                    "message": format!(
                        "Unknown status '{s}'; expected pending, approved, or refused"
                    )
                })),
            )
                .into_response()
        }),
    }
}

fn anticipation_error_response(e: &AnticipationError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Internal causes stay in the log; the caller gets an opaque message.
    let message = if status.is_server_error() {
        error!(error = %e, "anticipation operation failed");
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
