//! Periodic purge of dead rows in `user_sessions`.
//!
//! Every login and signup inserts a session row; logout revokes it and the
//! sliding refresh extends it, but nothing else deletes it. This job removes
//! rows that are revoked or past their expiry.

use std::time::Duration;

use pitchcraft_db::repositories::SessionRepo;
use pitchcraft_db::DbPool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// How often the purge runs in production.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Purge every [`CLEANUP_INTERVAL`] until `cancel` fires.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    run_every(pool, CLEANUP_INTERVAL, cancel).await;
}

/// Purge immediately and then every `period` until `cancel` fires.
pub async fn run_every(pool: DbPool, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Session cleanup job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match SessionRepo::cleanup_expired(&pool).await {
                    Ok(0) => tracing::debug!("Session cleanup: nothing to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Session cleanup: purged dead sessions"),
                    Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
                }
            }
        }
    }
}
