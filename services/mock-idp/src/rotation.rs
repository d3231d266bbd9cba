//! Periodic key rotation.
//!
//! Rotation is an operational action, never triggered by client requests.
//! When `KEY_ROTATION_INTERVAL` is set, `main` spawns [`run_rotation`].

use crate::keys::KeyManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Rotate `keys` every `every` until `shutdown` becomes `true`.
///
/// Key generation is CPU-bound and runs on the blocking pool. A failed
/// rotation is logged and the current key stays in service.
pub async fn run_rotation(
    keys: Arc<KeyManager>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the startup key is fresh.
    ticker.tick().await;

    info!(interval_secs = every.as_secs(), "Key rotation scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let keys = Arc::clone(&keys);
                match tokio::task::spawn_blocking(move || keys.rotate()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!(error = %e, "Scheduled key rotation failed"),
                    Err(e) => error!(error = %e, "Key rotation task panicked"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Key rotation stopped");
                    break;
                }
            }
        }
    }
}
