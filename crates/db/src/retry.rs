//! Bounded retry for idempotent reads.
//!
//! Only reads go through here. Writes are never blindly retried: the
//! approval gate re-reads state under its lock instead, so a retried
//! write can never double-apply a transition or double-credit an account.

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 50;

/// Runs an idempotent read, retrying transient failures with bounded
/// exponential backoff.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or immediately for
/// non-transient errors.
pub async fn with_read_retry<T, F, Fut>(operation: &str, mut f: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < MAX_ATTEMPTS && is_transient(&e) => {
                attempt += 1;
                let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient read failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connection-level failures are worth a retry; everything else is not.
fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}
