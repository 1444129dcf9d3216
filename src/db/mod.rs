// Database access layer (SQLite via sqlx).

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;
use crate::store::{
    idle_cutoff, new_session_id, now_unix, GameSession, NewSession, SessionStore,
};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // Each connection to `sqlite::memory:` is its own database, so keep a
        // single connection alive for the lifetime of the pool.
        let options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(database_url).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game_sessions (
                id TEXT PRIMARY KEY NOT NULL,
                secret TEXT NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_game_sessions_updated_at ON game_sessions (updated_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Game sessions ─────────────────────────────────────────────────

    pub async fn create_session(
        &self,
        secret: &str,
        attempts: i64,
    ) -> Result<GameSession, sqlx::Error> {
        let now = now_unix();
        let row = sqlx::query_as::<_, GameSession>(
            "INSERT INTO game_sessions (id, secret, attempts, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id, secret, attempts, created_at, updated_at",
        )
        .bind(new_session_id())
        .bind(secret)
        .bind(attempts)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    #[cfg(test)]
    async fn get_session(&self, id: &str) -> Result<Option<GameSession>, sqlx::Error> {
        let row = sqlx::query_as::<_, GameSession>(
            "SELECT id, secret, attempts, created_at, updated_at FROM game_sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Single-statement increment; SQLite serialises writers so concurrent
    /// callers never lose an update.
    pub async fn increment_attempts(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Option<GameSession>, sqlx::Error> {
        let row = sqlx::query_as::<_, GameSession>(
            "UPDATE game_sessions SET attempts = attempts + ?, updated_at = ? WHERE id = ? RETURNING id, secret, attempts, created_at, updated_at",
        )
        .bind(delta)
        .bind(now_unix())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_session(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM game_sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_sessions_idle_since(&self, cutoff: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM game_sessions WHERE updated_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_sessions(&self) -> Result<i64, sqlx::Error> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game_sessions")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn insert(&self, session: NewSession) -> Result<String, StoreError> {
        let row = self.create_session(&session.secret, session.attempts).await?;
        Ok(row.id)
    }

    async fn find_and_increment(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Option<GameSession>, StoreError> {
        Ok(self.increment_attempts(id, delta).await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.delete_session(id).await?)
    }

    async fn purge_idle(&self, max_idle: Duration) -> Result<u64, StoreError> {
        let cutoff = idle_cutoff(now_unix(), max_idle);
        Ok(self.delete_sessions_idle_since(cutoff).await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.count_sessions().await?)
    }
}
