//! Session domain model.
//!
//! A session groups the conversation history of every agent across one or
//! more pipeline runs. History survives process restarts through the
//! session store; the engine treats the store as an opaque key-value store
//! keyed by `(agent_id, session_id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// One task/result pair recorded for an agent within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: Uuid,
    pub agent_id: String,
    /// First line of the task instruction.
    pub task: String,
    /// Result status as a string (`success`, `failure`, `partial`).
    pub status: String,
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(
        session_id: Uuid,
        agent_id: impl Into<String>,
        task: impl Into<String>,
        status: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            session_id,
            agent_id: agent_id.into(),
            task: task.into(),
            status: status.into(),
            summary: summary.into(),
            recorded_at: Utc::now(),
        }
    }
}
