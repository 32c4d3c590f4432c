//! In-memory registry of live sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::machine::ConversionSession;
use super::types::SessionStatus;
use crate::metrics;

/// A session shared between request handlers and the executor.
pub type SharedSession = Arc<Mutex<ConversionSession>>;

struct Entry {
    owner: String,
    session: SharedSession,
}

/// A session dropped by [`SessionRegistry::evict_idle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredSession {
    pub id: String,
    pub owner: String,
    /// Status the session was left in
    pub status: SessionStatus,
    /// Payload bytes released with it
    pub freed_bytes: usize,
}

/// Live sessions keyed by id, each visible only to the user who created it.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new idle session owned by `owner`.
    pub async fn create(&self, owner: &str) -> (String, SharedSession) {
        let session = ConversionSession::new(owner);
        let id = session.id().to_string();
        let shared = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(
            id.clone(),
            Entry {
                owner: owner.to_string(),
                session: Arc::clone(&shared),
            },
        );
        (id, shared)
    }

    /// Looks up a session. Sessions owned by someone else are not found.
    pub async fn get(&self, id: &str, owner: &str) -> Option<SharedSession> {
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|e| e.owner == owner)
            .map(|e| Arc::clone(&e.session))
    }

    /// Drops a session. Returns false if it was not found for this owner.
    pub async fn remove(&self, id: &str, owner: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(entry) if entry.owner == owner => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Drops every session untouched for at least `ttl` and clears its payload.
    ///
    /// Sessions with a run in flight, or locked by a request right now, are
    /// left for a later sweep.
    pub async fn evict_idle(&self, ttl: Duration) -> Vec<ExpiredSession> {
        let now = Utc::now();
        let mut expired = Vec::new();

        self.sessions.write().await.retain(|id, entry| {
            let Ok(mut session) = entry.session.try_lock() else {
                return true;
            };
            if session.status().is_in_flight() || !session.is_idle_for(ttl, now) {
                return true;
            }

            expired.push(ExpiredSession {
                id: id.clone(),
                owner: entry.owner.clone(),
                status: session.status(),
                freed_bytes: session.held_bytes(),
            });
            session.reset();
            false
        });

        if !expired.is_empty() {
            metrics::SESSIONS_EXPIRED.inc_by(expired.len() as u64);
            info!(
                count = expired.len(),
                freed_bytes = expired.iter().map(|e| e.freed_bytes).sum::<usize>(),
                "Evicted idle sessions"
            );
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
