use std::time::Duration;

use tracing::{info, warn};

use lobby_api::auth::AppState;

/// Background task that closes ideas whose stake period has ended.
///
/// Each tick flips `is_active` off for every expired idea and leaves the
/// creator a notification. Failures are logged and retried next tick.
pub async fn run_sweep_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db_state = state.clone();
        let result = tokio::task::spawn_blocking(move || {
            db_state.db.close_expired_stakes(chrono::Utc::now())
        })
        .await;

        match result {
            Ok(Ok(closed)) => {
                for stake in &closed {
                    info!("Stake period ended for idea {} ({})", stake.id, stake.creator);
                }
                if !closed.is_empty() {
                    info!("Sweep: closed {} ideas", closed.len());
                }
            }
            Ok(Err(e)) => warn!("Sweep error: {}", e),
            Err(e) => warn!("Sweep task join error: {}", e),
        }
    }
}
