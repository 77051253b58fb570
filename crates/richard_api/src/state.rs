//! Shared server state.

use crate::error::ApiError;
use log::warn;
use richard_core::TokenCodec;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Cloned into every request; both fields are shared handles.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(conn: Connection, codec: TokenCodec) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            codec: Arc::new(codec),
        }
    }

    pub fn codec(&self) -> Arc<TokenCodec> {
        Arc::clone(&self.codec)
    }

    /// Runs `work` against the connection on the blocking thread pool.
    ///
    /// A panic inside an earlier `work` fails only that call; the lock is
    /// recovered for later ones.
    pub async fn with_conn<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap_or_else(|poisoned| {
                warn!("event=db_lock_recovered module=api status=error");
                db.clear_poison();
                poisoned.into_inner()
            });
            // A panic mid-write can leave a transaction open.
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK;")
                    .map_err(|err| ApiError::internal("Internal server error", err))?;
            }
            work(&conn)
        })
        .await
        .map_err(|err| ApiError::internal("Internal server error", err))?
    }
}
