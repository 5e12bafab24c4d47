//! In-memory session store.
//!
//! Backs tests and `--no-db` runs. Same contract as the SQLite store, no
//! persistence across restarts.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::models::{Session, SessionEvent};
use crate::domain::ports::SessionStore;

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<Uuid, Session>,
    events: Vec<SessionEvent>,
}

/// Session store without persistence.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn ensure_session(&self, session_id: Uuid) -> Result<Session> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;
        let session = inner
            .sessions
            .entry(session_id)
            .or_insert_with(|| Session::with_id(session_id));
        Ok(session.clone())
    }

    async fn append_event(&self, event: SessionEvent) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| poisoned())?;
        if let Some(session) = inner.sessions.get_mut(&event.session_id) {
            session.updated_at = Utc::now();
        }
        inner.events.push(event);
        Ok(())
    }

    async fn history(
        &self,
        session_id: Uuid,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionEvent>> {
        let inner = self.inner.lock().map_err(|_| poisoned())?;
        let matching: Vec<SessionEvent> = inner
            .events
            .iter()
            .filter(|e| e.session_id == session_id && e.agent_id == agent_id)
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn list_sessions(&self, limit: usize) -> Result<Vec<Session>> {
        let inner = self.inner.lock().map_err(|_| poisoned())?;
        let mut sessions: Vec<Session> = inner.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn session_events(&self, session_id: Uuid) -> Result<Vec<SessionEvent>> {
        let inner = self.inner.lock().map_err(|_| poisoned())?;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("session store mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_is_scoped_and_bounded() {
        let store = MemorySessionStore::new();
        let session = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.ensure_session(session).await.unwrap();

        for i in 0..5 {
            store
                .append_event(SessionEvent::new(session, "discovery", format!("task {i}"), "success", ""))
                .await
                .unwrap();
        }
        store
            .append_event(SessionEvent::new(session, "analysis", "other agent", "success", ""))
            .await
            .unwrap();
        store
            .append_event(SessionEvent::new(other, "discovery", "other session", "success", ""))
            .await
            .unwrap();

        let history = store.history(session, "discovery", 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].task, "task 2");
        assert_eq!(history[2].task, "task 4");
    }

    #[tokio::test]
    async fn test_ensure_session_is_idempotent() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();
        let first = store.ensure_session(id).await.unwrap();
        let second = store.ensure_session(id).await.unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.list_sessions(10).await.unwrap().len(), 1);
    }
}
