//! Implementation of the `datamill session` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::adapters::sqlite::{create_pool, Migrator, SqliteSessionStore};
use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::ports::SessionStore;

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List persisted sessions
    List {
        /// Maximum number of sessions to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the event history of one session
    Show {
        /// Session id
        id: Uuid,
    },
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct SessionSummary {
    id: Uuid,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, serde::Serialize)]
struct SessionListOutput {
    sessions: Vec<SessionSummary>,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "created", "updated"]);
        for session in &self.sessions {
            table.add_row(vec![
                session.id.to_string(),
                session.created_at.clone(),
                session.updated_at.clone(),
            ]);
        }
        render_list("session", &table, self.sessions.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
struct EventSummary {
    agent: String,
    task: String,
    status: String,
    summary: String,
    recorded_at: String,
}

#[derive(Debug, serde::Serialize)]
struct SessionShowOutput {
    id: Uuid,
    events: Vec<EventSummary>,
}

impl CommandOutput for SessionShowOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["agent", "task", "status", "summary"]);
        for event in &self.events {
            table.add_row(vec![
                event.agent.clone(),
                truncate(&event.task, 40),
                event.status.clone(),
                truncate(&event.summary, 60),
            ]);
        }
        format!(
            "Session {}\n{}",
            self.id,
            render_list("event", &table, self.events.len())
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SessionArgs, json: bool, config_path: Option<&str>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let pool = create_pool(&config.database)
        .await
        .context("cannot open session database")?;
    Migrator::new(pool.clone())
        .run()
        .await
        .context("cannot migrate session database")?;
    let store = SqliteSessionStore::new(pool);

    match args.command {
        SessionCommands::List { limit } => {
            let sessions = store
                .list_sessions(limit)
                .await?
                .into_iter()
                .map(|s| SessionSummary {
                    id: s.id,
                    created_at: s.created_at.to_rfc3339(),
                    updated_at: s.updated_at.to_rfc3339(),
                })
                .collect();
            output(&SessionListOutput { sessions }, json);
        }
        SessionCommands::Show { id } => {
            let events = store
                .session_events(id)
                .await?
                .into_iter()
                .map(|e| EventSummary {
                    agent: e.agent_id,
                    task: e.task,
                    status: e.status,
                    summary: e.summary,
                    recorded_at: e.recorded_at.to_rfc3339(),
                })
                .collect();
            output(&SessionShowOutput { id, events }, json);
        }
    }
    Ok(())
}
