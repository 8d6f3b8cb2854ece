use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::rate_limit::ResetRateLimiter;
use crate::reset::store::TokenStore;
use crate::state::SharedState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Background maintenance: drop expired reset tokens and stale rate-limiter
/// windows. Runs until the shutdown signal flips.
pub fn spawn(
    store: Arc<dyn TokenStore>,
    state: SharedState,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(store, state, shutdown))
}

async fn run(store: Arc<dyn TokenStore>, state: SharedState, mut shutdown: watch::Receiver<bool>) {
    tracing::debug!("Token sweeper started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match store.delete_expired_tokens(Utc::now()).await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Swept {n} expired reset tokens"),
            Err(e) => tracing::error!("Token sweep failed: {e}"),
        }

        sweep_limiter(&state.reset_limiter);

        tokio::select! {
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            _ = shutdown.changed() => {}
        }
    }

    tracing::debug!("Token sweeper stopped");
}

fn sweep_limiter(limiter: &ResetRateLimiter) {
    // Windows are an hour; anything twice that old is dead weight.
    limiter.cleanup(Duration::from_secs(2 * 60 * 60));
}
