//! In-memory analysis sessions with idle expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use prospecto_analysis::AnalysisSession;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<AnalysisSession>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    ttl: TimeDelta,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(AnalysisSession::new()));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        tracing::info!(session_id = %id, "session created");
        (id, session)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than the TTL. Sessions locked by an
    /// in-flight action are kept for the next sweep.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(guard) => {
                let keep = now - guard.updated_at() <= self.ttl;
                if !keep {
                    tracing::info!(session_id = %id, "session expired");
                }
                keep
            }
            Err(_) => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_get_remove() {
        let store = SessionStore::new(60);
        let (id, _) = store.create().await;
        assert!(store.get(id).await.is_some());
        assert!(store.remove(id).await);
        assert!(store.get(id).await.is_none());
        assert!(!store.remove(id).await);
    }

    #[tokio::test]
    async fn sweep_drops_only_idle_sessions() {
        let store = SessionStore::new(60);
        let (id, _) = store.create().await;

        assert_eq!(store.sweep_expired(Utc::now()).await, 0);
        let later = Utc::now() + TimeDelta::seconds(61);
        assert_eq!(store.sweep_expired(later).await, 1);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn sweep_skips_locked_sessions() {
        let store = SessionStore::new(0);
        let (_, session) = store.create().await;
        let _guard = session.lock().await;
        let later = Utc::now() + TimeDelta::seconds(5);
        assert_eq!(store.sweep_expired(later).await, 0);
        assert_eq!(store.count().await, 1);
    }
}
