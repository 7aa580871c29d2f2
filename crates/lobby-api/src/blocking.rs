//! Helpers for running SQLite and Argon2 work off the async runtime.

use tracing::error;

use lobby_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn run<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })
}

/// Run `f` against the database on the blocking pool.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> lobby_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    Ok(run(move || f(&state.db)).await??)
}
