//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for withdrawals, anticipations, and balances
//! - Authentication middleware turning bearer tokens into actors
//! - Default collaborator implementations for wiring the server

pub mod collaborators;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use saldo_db::repositories::{AnticipationRepository, LedgerRepository, WithdrawalRepository};
use saldo_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger store.
    pub ledger: LedgerRepository,
    /// Withdrawal workflow repository.
    pub withdrawals: WithdrawalRepository,
    /// Anticipation workflow repository.
    pub anticipations: AnticipationRepository,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
