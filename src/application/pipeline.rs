//! Standard pipeline assembly.
//!
//! Builds the canonical five-agent roster, the built-in capability set, and
//! an orchestrator wired to a session store — the runnable form of the
//! standard phase plan.

use std::sync::Arc;

use uuid::Uuid;

use crate::adapters::capabilities::standard_capabilities;
use crate::domain::models::{AgentSpec, Config, PhasePlan};
use crate::domain::ports::SessionStore;
use crate::services::{AgentRunner, Orchestrator, RunContext};

/// The five standard agent roles with their permitted capability sets.
///
/// The permitted sets encode the hard role separation: discovery never
/// loads frames, statistics never renders charts, report only composes and
/// writes files.
pub fn standard_agents(config: &Config) -> Vec<AgentSpec> {
    let tune = |spec: AgentSpec| {
        spec.with_iteration_cap(config.agent.iteration_cap)
            .with_history_limit(config.agent.history_limit)
    };

    vec![
        tune(AgentSpec::new(
            "discovery",
            "Data source discovery and validation",
            vec!["csv.list".to_string()],
        )),
        tune(AgentSpec::new(
            "analysis",
            "Data loading and analysis",
            vec![
                "csv.load".to_string(),
                "table.describe".to_string(),
                "table.value_counts".to_string(),
            ],
        )),
        tune(AgentSpec::new(
            "statistics",
            "Statistical analysis",
            vec![
                "table.describe".to_string(),
                "table.correlate".to_string(),
                "table.value_counts".to_string(),
            ],
        )),
        tune(AgentSpec::new(
            "visualization",
            "Chart rendering",
            vec!["chart.render".to_string(), "table.describe".to_string()],
        )),
        tune(AgentSpec::new(
            "report",
            "Report composition",
            vec!["report.compose".to_string(), "file.write".to_string()],
        )),
    ]
}

/// Build an orchestrator for the standard pipeline over the given store.
pub fn build_orchestrator<S: SessionStore>(config: &Config, store: Arc<S>) -> Orchestrator<S> {
    let (capabilities, _tabular) = standard_capabilities(std::path::Path::new(&config.base_dir));
    let agents = standard_agents(config)
        .into_iter()
        .map(AgentRunner::new)
        .collect();
    Orchestrator::new(agents, Arc::new(capabilities), store)
}

/// Run context for the standard plan: session id plus the directory roots
/// the templates reference.
pub fn standard_context(config: &Config, session_id: Uuid) -> RunContext {
    RunContext::new(session_id)
        .with_param("data_dir", config.data_dir.as_str())
        .with_param("plots_dir", config.plots_dir.as_str())
        .with_param("reports_dir", config.reports_dir.as_str())
}

/// The standard plan; a thin alias kept next to the roster it depends on.
pub fn standard_plan() -> PhasePlan {
    PhasePlan::standard()
}
