use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use hushpost_db::Database;
use hushpost_relay::SuggestionRelay;

use crate::error::AppError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub relay: SuggestionRelay,
    /// Upper bound on any single persistence call.
    pub db_timeout: Duration,
}

/// Run a blocking DB call off the async runtime, bounded by `db_timeout`.
///
/// On timeout the request fails; the blocking task itself runs to completion
/// in the background since SQLite calls cannot be interrupted midway.
pub async fn with_db<F, T, E>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    let db = state.clone();
    let task = tokio::task::spawn_blocking(move || f(&db.db));

    match tokio::time::timeout(state.db_timeout, task).await {
        Ok(Ok(result)) => result.map_err(Into::into),
        Ok(Err(e)) => {
            error!("spawn_blocking join error: {}", e);
            Err(AppError::Internal(anyhow::anyhow!("blocking task failed: {}", e)))
        }
        Err(_) => {
            warn!("DB call exceeded {:?}", state.db_timeout);
            Err(AppError::Timeout)
        }
    }
}
