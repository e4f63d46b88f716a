//! Saldo API Server
//!
//! Main entry point for the Saldo ledger and workflow engine.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saldo_api::collaborators::{
    DevPixKeyVerifier, DevReceivablesLedger, TracingAuditLog, TracingNotificationSink,
    WebhookNotificationSink,
};
use saldo_api::{AppState, create_router};
use saldo_core::collaborators::NotificationSink;
use saldo_core::fee::{FeeCalculator, FeeSchedule};
use saldo_db::repositories::{
    AnticipationRepository, ApprovalGate, LedgerRepository, WithdrawalRepository,
};
use saldo_shared::jwt::JwtConfig;
use saldo_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saldo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = saldo_db::connect(&config.database).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Fee schedule snapshot from configuration
    let calculator = FeeCalculator::new(FeeSchedule::from(&config.fees));
    info!(
        withdrawal_flat_fee = config.fees.withdrawal_flat_fee,
        anticipation_fee_bps = config.fees.anticipation_fee_bps,
        "Fee schedule loaded"
    );

    // Collaborators: webhook sink when configured, structured log otherwise
    let notifier: Arc<dyn NotificationSink> = match &config.notifications.webhook_url {
        Some(url) => {
            info!(url = %url, "Webhook notification sink configured");
            Arc::new(WebhookNotificationSink::new(url.clone()))
        }
        None => Arc::new(TracingNotificationSink),
    };
    let gate = ApprovalGate::new(Arc::new(TracingAuditLog));

    // Create application state
    let state = AppState {
        ledger: LedgerRepository::new(db.clone()),
        withdrawals: WithdrawalRepository::new(
            db.clone(),
            calculator,
            Arc::new(DevPixKeyVerifier),
            notifier.clone(),
            gate.clone(),
        ),
        anticipations: AnticipationRepository::new(
            db,
            calculator,
            Arc::new(DevReceivablesLedger),
            notifier,
            gate,
        ),
        jwt_service: Arc::new(jwt_service),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
