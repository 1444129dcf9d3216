// Storage error type shared by every session store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
