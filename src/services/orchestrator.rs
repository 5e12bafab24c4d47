//! Sequential phase orchestrator.
//!
//! Executes a validated phase plan in ordinal order: materialize the task
//! from the template and the artifact registry, run the phase's agent,
//! register the produced artifacts, and enforce the completion invariant —
//! every artifact the phase declares must be present with that phase's
//! ordinal as producing phase. A phase that fails or stays incomplete is
//! retried once with the same template; a second miss halts the run, and no
//! later phase executes. Already-registered artifacts remain for inspection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::errors::OrchestrationError;
use crate::domain::models::{
    Artifact, ArtifactKind, PhasePlan, ResultStatus, TaskResult,
};
use crate::domain::ports::SessionStore;
use crate::services::agent_runner::AgentRunner;
use crate::services::artifact_registry::ArtifactRegistry;
use crate::services::capability_registry::CapabilityRegistry;
use crate::services::materializer::materialize_task;

/// Maximum retries per phase (initial attempt + one retry).
pub const MAX_PHASE_RETRIES: usize = 1;

/// Initial context for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub session_id: Uuid,
    /// Named parameters available to task templates as `${param:KEY}`.
    pub params: BTreeMap<String, Value>,
}

impl RunContext {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one completed phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseOutcome {
    pub ordinal: usize,
    pub name: String,
    pub agent: String,
    pub status: ResultStatus,
    pub summary: String,
    /// Attempts consumed (1 = no retry).
    pub attempts: usize,
}

/// Listing entry for one artifact in the final summary.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub kind: ArtifactKind,
    pub location: String,
    pub producing_phase: usize,
    pub version: u32,
}

impl ArtifactRecord {
    fn from_artifact(artifact: &Artifact) -> Self {
        Self {
            name: artifact.name.clone(),
            kind: artifact.kind,
            location: artifact.location.as_reference(),
            producing_phase: artifact.producing_phase,
            version: artifact.version,
        }
    }
}

/// Aggregated result of a completed run: every phase's summary plus the
/// full artifact listing.
#[derive(Debug, Clone, Serialize)]
pub struct FinalSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<PhaseOutcome>,
    pub artifacts: Vec<ArtifactRecord>,
}

impl FinalSummary {
    /// Human-readable rendering: concatenated phase summaries followed by
    /// the artifact listing.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("Pipeline run {} completed", self.session_id),
            String::new(),
        ];
        for outcome in &self.outcomes {
            lines.push(format!(
                "[{}] {} ({}, {} attempt(s)): {}",
                outcome.ordinal,
                outcome.name,
                outcome.status.as_str(),
                outcome.attempts,
                outcome.summary
            ));
        }
        lines.push(String::new());
        lines.push(format!("Artifacts ({}):", self.artifacts.len()));
        for artifact in &self.artifacts {
            lines.push(format!(
                "  {} [{} v{}, phase {}] {}",
                artifact.name,
                artifact.kind.as_str(),
                artifact.version,
                artifact.producing_phase,
                artifact.location
            ));
        }
        lines.join("\n")
    }
}

/// Sequential executor of a phase plan, owner of retry and failure policy.
pub struct Orchestrator<S: SessionStore> {
    agents: HashMap<String, AgentRunner>,
    capabilities: Arc<CapabilityRegistry>,
    store: Arc<S>,
}

impl<S: SessionStore> Orchestrator<S> {
    pub fn new(
        agents: Vec<AgentRunner>,
        capabilities: Arc<CapabilityRegistry>,
        store: Arc<S>,
    ) -> Self {
        let agents = agents
            .into_iter()
            .map(|a| (a.spec().id.clone(), a))
            .collect();
        Self {
            agents,
            capabilities,
            store,
        }
    }

    /// Execute the plan. Returns the final summary, or the first fatal
    /// orchestration error — plan validation failures before any phase
    /// starts, phase failures after the single retry is spent.
    pub async fn execute(
        &mut self,
        plan: &PhasePlan,
        ctx: &RunContext,
    ) -> Result<FinalSummary, OrchestrationError> {
        plan.validate()?;
        self.check_agents(plan)?;

        if let Err(err) = self.store.ensure_session(ctx.session_id).await {
            warn!(session_id = %ctx.session_id, error = %err, "Failed to ensure session, history will not persist");
        }

        let started_at = Utc::now();
        let mut registry = ArtifactRegistry::new();
        let mut outcomes = Vec::with_capacity(plan.len());

        for (ordinal, phase) in plan.phases.iter().enumerate() {
            info!(phase = %phase.name, ordinal, agent = %phase.agent, "Phase starting");

            let mut attempts = 0usize;
            let mut last_result: Option<TaskResult> = None;
            let mut last_reason = String::new();

            while attempts <= MAX_PHASE_RETRIES {
                attempts += 1;
                match self
                    .attempt_phase(phase, ordinal, &mut registry, ctx)
                    .await
                {
                    Ok(result) => {
                        last_result = Some(result);
                        break;
                    }
                    Err(reason) => {
                        warn!(
                            phase = %phase.name,
                            ordinal,
                            attempt = attempts,
                            reason = %reason,
                            "Phase attempt failed"
                        );
                        last_reason = reason;
                    }
                }
            }

            match last_result {
                Some(result) => {
                    info!(
                        phase = %phase.name,
                        ordinal,
                        status = result.status.as_str(),
                        attempts,
                        "Phase complete"
                    );
                    outcomes.push(PhaseOutcome {
                        ordinal,
                        name: phase.name.clone(),
                        agent: phase.agent.clone(),
                        status: result.status,
                        summary: result.summary,
                        attempts,
                    });
                }
                None => {
                    let furthest =
                        ordinal.checked_sub(1).map_or_else(|| "none".to_string(), |p| p.to_string());
                    error!(
                        phase = %phase.name,
                        ordinal,
                        furthest_completed = %furthest,
                        "Phase failed after retry, halting run"
                    );
                    return Err(OrchestrationError::PhaseFailed {
                        ordinal,
                        name: phase.name.clone(),
                        reason: last_reason,
                    });
                }
            }
        }

        Ok(FinalSummary {
            session_id: ctx.session_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            artifacts: registry.list().into_iter().map(ArtifactRecord::from_artifact).collect(),
        })
    }

    /// One attempt at a phase: materialize, run, register, check the
    /// completion invariant. Any miss is reported as a reason string and
    /// counts against the retry budget.
    async fn attempt_phase(
        &mut self,
        phase: &crate::domain::models::Phase,
        ordinal: usize,
        registry: &mut ArtifactRegistry,
        ctx: &RunContext,
    ) -> Result<TaskResult, String> {
        let task = materialize_task(phase, ordinal, registry, &ctx.params)
            .map_err(|e| format!("task materialization failed: {e}"))?;

        let agent = self
            .agents
            .get_mut(&phase.agent)
            .ok_or_else(|| format!("agent '{}' not found", phase.agent))?;

        let result = agent
            .run(&task, &self.capabilities, self.store.as_ref(), ctx.session_id)
            .await;

        if result.status == ResultStatus::Failure {
            return Err(format!("agent reported failure: {}", result.summary));
        }

        // Artifacts from successful and partial results are registered;
        // a failed attempt leaves earlier registrations intact.
        for artifact in &result.artifacts {
            registry
                .register(artifact.clone())
                .map_err(|e| e.to_string())?;
        }

        // Completion invariant: every declared output present with this
        // phase's ordinal as producing phase.
        for binding in phase.declared_outputs() {
            match registry.lookup(&binding.name) {
                Ok(artifact) if artifact.producing_phase == ordinal => {}
                Ok(artifact) => {
                    return Err(format!(
                        "artifact '{}' produced by phase {} instead of {}",
                        binding.name, artifact.producing_phase, ordinal
                    ));
                }
                Err(_) => {
                    return Err(format!(
                        "required artifact '{}' not produced ({})",
                        binding.name, result.summary
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Every phase's agent must exist before the run starts.
    fn check_agents(&self, plan: &PhasePlan) -> Result<(), OrchestrationError> {
        for phase in &plan.phases {
            if !self.agents.contains_key(&phase.agent) {
                return Err(OrchestrationError::PlanValidation(format!(
                    "phase '{}' assigned to unknown agent '{}'",
                    phase.name, phase.agent
                )));
            }
        }
        Ok(())
    }
}
