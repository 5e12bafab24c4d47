//! SQLite implementation of the session store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::{Session, SessionEvent};
use crate::domain::ports::SessionStore;

#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp '{s}'"))
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        Ok(Session {
            id: Uuid::parse_str(&self.id).context("invalid session UUID in database")?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    session_id: String,
    agent_id: String,
    task: String,
    status: String,
    summary: String,
    recorded_at: String,
}

impl EventRow {
    fn into_event(self) -> Result<SessionEvent> {
        Ok(SessionEvent {
            session_id: Uuid::parse_str(&self.session_id)
                .context("invalid session UUID in database")?,
            agent_id: self.agent_id,
            task: self.task,
            status: self.status,
            summary: self.summary,
            recorded_at: parse_datetime(&self.recorded_at)?,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn ensure_session(&self, session_id: Uuid) -> Result<Session> {
        let existing: Option<SessionRow> =
            sqlx::query_as("SELECT id, created_at, updated_at FROM sessions WHERE id = ?")
                .bind(session_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .context("failed to fetch session")?;

        if let Some(row) = existing {
            return row.into_session();
        }

        let session = Session::with_id(session_id);
        sqlx::query("INSERT INTO sessions (id, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(session.id.to_string())
            .bind(session.created_at.to_rfc3339())
            .bind(session.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("failed to insert session")?;
        Ok(session)
    }

    async fn append_event(&self, event: SessionEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_events (session_id, agent_id, task, status, summary, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(event.session_id.to_string())
        .bind(&event.agent_id)
        .bind(&event.task)
        .bind(&event.status)
        .bind(&event.summary)
        .bind(event.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("failed to insert session event")?;

        sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(event.session_id.to_string())
            .execute(&self.pool)
            .await
            .context("failed to touch session")?;
        Ok(())
    }

    async fn history(
        &self,
        session_id: Uuid,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionEvent>> {
        // Newest `limit` rows, then restored to chronological order.
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT session_id, agent_id, task, status, summary, recorded_at
             FROM session_events
             WHERE session_id = ? AND agent_id = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(session_id.to_string())
        .bind(agent_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch agent history")?;

        let mut events: Vec<SessionEvent> = rows
            .into_iter()
            .map(EventRow::into_event)
            .collect::<Result<_>>()?;
        events.reverse();
        Ok(events)
    }

    async fn list_sessions(&self, limit: usize) -> Result<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, created_at, updated_at FROM sessions ORDER BY created_at DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("failed to list sessions")?;

        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn session_events(&self, session_id: Uuid) -> Result<Vec<SessionEvent>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT session_id, agent_id, task, status, summary, recorded_at
             FROM session_events
             WHERE session_id = ?
             ORDER BY id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch session events")?;

        rows.into_iter().map(EventRow::into_event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn store() -> SqliteSessionStore {
        SqliteSessionStore::new(create_migrated_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_ensure_session_round_trip() {
        let store = store().await;
        let id = Uuid::new_v4();

        let created = store.ensure_session(id).await.unwrap();
        assert_eq!(created.id, id);

        let again = store.ensure_session(id).await.unwrap();
        assert_eq!(again.created_at, created.created_at);
        assert_eq!(store.list_sessions(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_window_is_newest_first_limited() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.ensure_session(id).await.unwrap();

        for i in 0..5 {
            store
                .append_event(SessionEvent::new(id, "analysis", format!("task {i}"), "success", ""))
                .await
                .unwrap();
        }

        let history = store.history(id, "analysis", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].task, "task 3");
        assert_eq!(history[1].task, "task 4");

        assert!(store.history(id, "discovery", 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_events_span_agents() {
        let store = store().await;
        let id = Uuid::new_v4();
        store.ensure_session(id).await.unwrap();

        store
            .append_event(SessionEvent::new(id, "discovery", "list", "success", ""))
            .await
            .unwrap();
        store
            .append_event(SessionEvent::new(id, "analysis", "load", "partial", ""))
            .await
            .unwrap();

        let events = store.session_events(id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].agent_id, "discovery");
        assert_eq!(events[1].status, "partial");
    }
}
