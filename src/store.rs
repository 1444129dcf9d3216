// Session storage contract and the in-process implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// A stored game session.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GameSession {
    pub id: String,
    pub secret: String,
    pub attempts: i64,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds of the last guess (or creation).
    pub updated_at: i64,
}

/// Fields supplied by the caller when creating a session. The store assigns
/// the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub secret: String,
    pub attempts: i64,
}

impl NewSession {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            attempts: 0,
        }
    }
}

/// Persistence for game sessions.
///
/// `find_and_increment` must be a single atomic operation: concurrent calls
/// for one id each observe a distinct counter value.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session and return the id assigned to it.
    async fn insert(&self, session: NewSession) -> Result<String, StoreError>;

    /// Add `delta` to `attempts` and return the updated record, or `None`
    /// when no session has this id.
    async fn find_and_increment(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Option<GameSession>, StoreError>;

    /// Delete a session. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Delete sessions with no guess for longer than `max_idle`.
    async fn purge_idle(&self, max_idle: Duration) -> Result<u64, StoreError>;

    /// Number of live sessions.
    async fn count(&self) -> Result<i64, StoreError>;
}

pub(crate) fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Unix-seconds cutoff for sessions idle longer than `max_idle`. Saturates
/// instead of wrapping, so an enormous TTL keeps everything.
pub(crate) fn idle_cutoff(now: i64, max_idle: Duration) -> i64 {
    let idle = i64::try_from(max_idle.as_secs()).unwrap_or(i64::MAX);
    now.saturating_sub(idle)
}

pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Thread-safe in-memory session store, used by the CLI and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, GameSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, GameSession>>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Read a session without touching its counter.
    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    #[cfg(test)]
    fn backdate(&self, id: &str, secs: i64) {
        if let Some(s) = self.inner.lock().unwrap().get_mut(id) {
            s.updated_at -= secs;
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: NewSession) -> Result<String, StoreError> {
        let id = new_session_id();
        let now = now_unix();
        self.lock()?.insert(
            id.clone(),
            GameSession {
                id: id.clone(),
                secret: session.secret,
                attempts: session.attempts,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn find_and_increment(
        &self,
        id: &str,
        delta: i64,
    ) -> Result<Option<GameSession>, StoreError> {
        let mut map = self.lock()?;
        Ok(map.get_mut(id).map(|s| {
            s.attempts += delta;
            s.updated_at = now_unix();
            s.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(id).is_some())
    }

    async fn purge_idle(&self, max_idle: Duration) -> Result<u64, StoreError> {
        let cutoff = idle_cutoff(now_unix(), max_idle);
        let mut map = self.lock()?;
        let before = map.len();
        map.retain(|_, s| s.updated_at >= cutoff);
        Ok((before - map.len()) as u64)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.lock()?.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store.insert(NewSession::new("1234")).await.unwrap();
        let b = store.insert(NewSession::new("1234")).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count().await.unwrap(), 2);

        let s = store.get(&a).unwrap().unwrap();
        assert_eq!(s.secret, "1234");
        assert_eq!(s.attempts, 0);
    }

    #[tokio::test]
    async fn test_find_and_increment() {
        let store = MemoryStore::new();
        let id = store.insert(NewSession::new("0007")).await.unwrap();

        let s = store.find_and_increment(&id, 1).await.unwrap().unwrap();
        assert_eq!(s.attempts, 1);
        let s = store.find_and_increment(&id, 1).await.unwrap().unwrap();
        assert_eq!(s.attempts, 2);
        assert_eq!(s.secret, "0007");

        assert!(store.find_and_increment("nope", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let id = store.insert(NewSession::new("1111")).await.unwrap();
        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(store.find_and_increment(&id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_idle() {
        let store = MemoryStore::new();
        let old = store.insert(NewSession::new("1111")).await.unwrap();
        let fresh = store.insert(NewSession::new("2222")).await.unwrap();
        store.backdate(&old, 600);

        let purged = store.purge_idle(Duration::from_secs(300)).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.get(&old).unwrap().is_none());
        assert!(store.get(&fresh).unwrap().is_some());
    }

    #[test]
    fn test_idle_cutoff_saturates() {
        assert_eq!(idle_cutoff(1_000, Duration::from_secs(300)), 700);
        assert_eq!(idle_cutoff(1_000, Duration::from_secs(u64::MAX)), 1_000 - i64::MAX);
        assert_eq!(idle_cutoff(i64::MIN + 5, Duration::from_secs(10)), i64::MIN);
    }

    #[tokio::test]
    async fn test_purge_idle_with_huge_ttl_keeps_sessions() {
        let store = MemoryStore::new();
        let id = store.insert(NewSession::new("3333")).await.unwrap();
        store.backdate(&id, 600);

        for secs in [u64::MAX, i64::MAX as u64 + 2] {
            let purged = store.purge_idle(Duration::from_secs(secs)).await.unwrap();
            assert_eq!(purged, 0);
        }
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_distinct() {
        let store = MemoryStore::new();
        let id = store.insert(NewSession::new("5555")).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    store.find_and_increment(&id, 1).await.unwrap().unwrap().attempts
                })
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<i64>>());
    }
}
