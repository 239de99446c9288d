use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{game_store::GameStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend and keep the shared state in degraded mode
/// while it is unavailable. Live scoring mutations fail fast in degraded mode
/// so journal writes are never silently dropped.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn GameStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_game_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                supervise(&state, &store).await;

                // The store is gone for good; fall through to a fresh connect.
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the installed store until its connection is lost beyond repair.
async fn supervise(state: &SharedState, store: &Arc<dyn GameStore>) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(_) => {
                if reconnect_with_backoff(state, store).await {
                    state.update_degraded(false).await;
                    sleep(HEALTH_POLL_INTERVAL).await;
                } else {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    state.clear_game_store().await;
                    return;
                }
            }
        }
    }
}

/// Retry `try_reconnect` with exponential backoff. The first failure flips the
/// shared state into degraded mode so mutations start failing fast right away.
async fn reconnect_with_backoff(state: &SharedState, store: &Arc<dyn GameStore>) -> bool {
    let mut delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!("storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "storage reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}
