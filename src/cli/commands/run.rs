//! Implementation of the `datamill run` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::adapters::sqlite::{create_pool, Migrator, SqliteSessionStore};
use crate::adapters::MemorySessionStore;
use crate::application::{build_orchestrator, standard_context, standard_plan};
use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::SessionStore;
use crate::infrastructure::logging;
use crate::services::FinalSummary;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the data directory from config
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<String>,

    /// Continue an existing session instead of starting a new one
    #[arg(long, value_name = "UUID")]
    pub session: Option<Uuid>,

    /// Skip the session database (history is not persisted)
    #[arg(long)]
    pub no_db: bool,
}

#[derive(Debug, serde::Serialize)]
struct RunOutput {
    summary: FinalSummary,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Pipeline run {} completed", self.summary.session_id)];
        for outcome in &self.summary.outcomes {
            lines.push(format!(
                "  [{}] {} ({}, {} attempt(s)): {}",
                outcome.ordinal,
                outcome.name,
                outcome.status.as_str(),
                outcome.attempts,
                outcome.summary
            ));
        }

        let mut table = list_table(&["name", "kind", "phase", "v", "location"]);
        for artifact in &self.summary.artifacts {
            table.add_row(vec![
                artifact.name.clone(),
                artifact.kind.as_str().to_string(),
                artifact.producing_phase.to_string(),
                artifact.version.to_string(),
                artifact.location.clone(),
            ]);
        }
        format!(
            "{}\n\n{}",
            lines.join("\n"),
            render_list("artifact", &table, self.summary.artifacts.len())
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.summary).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, json: bool, config_path: Option<&str>) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let _log_guard = logging::init(&config.logging);
    let session_id = args.session.unwrap_or_else(Uuid::new_v4);

    tracing::info!(
        session_id = %session_id,
        data_dir = %config.data_dir,
        "Starting pipeline run"
    );

    let summary = if args.no_db {
        run_with_store(&config, Arc::new(MemorySessionStore::new()), session_id).await?
    } else {
        let pool = create_pool(&config.database)
            .await
            .context("cannot open session database")?;
        Migrator::new(pool.clone())
            .run()
            .await
            .context("cannot migrate session database")?;
        run_with_store(&config, Arc::new(SqliteSessionStore::new(pool)), session_id).await?
    };

    output(&RunOutput { summary }, json);
    Ok(())
}

async fn run_with_store<S: SessionStore>(
    config: &Config,
    store: Arc<S>,
    session_id: Uuid,
) -> Result<FinalSummary> {
    let mut orchestrator = build_orchestrator(config, store);
    let plan = standard_plan();
    let ctx = standard_context(config, session_id);

    orchestrator
        .execute(&plan, &ctx)
        .await
        .context("pipeline run failed")
}
