//! Session store port (trait) for dependency injection.
//!
//! The engine treats conversation persistence as an opaque key-value store
//! keyed by `(agent_id, session_id)`. Infrastructure adapters implement
//! this trait; services depend on the trait, not concrete implementations.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{Session, SessionEvent};

/// Persistence contract for agent conversation history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session if it does not already exist.
    async fn ensure_session(&self, session_id: Uuid) -> Result<Session>;

    /// Append one task/result event for an agent within a session.
    async fn append_event(&self, event: SessionEvent) -> Result<()>;

    /// The newest `limit` events for `(agent_id, session_id)`, oldest first.
    async fn history(
        &self,
        session_id: Uuid,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionEvent>>;

    /// All known sessions, newest first.
    async fn list_sessions(&self, limit: usize) -> Result<Vec<Session>>;

    /// All events of a session across agents, oldest first.
    async fn session_events(&self, session_id: Uuid) -> Result<Vec<SessionEvent>>;
}
