//! Agent execution loop.
//!
//! An agent runs a task by stepping through its scripted capability calls,
//! one invocation per iteration: `Idle -> Selecting -> Invoking -> Selecting
//! -> ... -> Done | Exhausted`. The loop is bounded by the agent's iteration
//! cap; reaching the cap yields a partial result, never a hard failure. A
//! scripted call outside the agent's permitted set is rejected and folded
//! into a failure result — capability errors never cross the agent boundary.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::CapabilityError;
use crate::domain::models::{
    AgentSpec, Artifact, ArtifactBinding, ArtifactKind, ArtifactLocation, HistoryBuffer,
    HistoryEntry, ResultStatus, SessionEvent, Task, TaskResult,
};
use crate::domain::ports::{CapabilityOutput, SessionStore};
use crate::services::capability_registry::CapabilityRegistry;

/// State of one agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Selecting,
    Invoking,
    Done,
    Exhausted,
}

/// A bound role executing tasks against the capability registry.
pub struct AgentRunner {
    spec: AgentSpec,
    history: HistoryBuffer,
}

impl AgentRunner {
    pub fn new(spec: AgentSpec) -> Self {
        let history = HistoryBuffer::new(spec.history_limit);
        Self { spec, history }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Execute a task: load history, step through the script, persist the
    /// outcome. Session store failures degrade to warnings — history is
    /// ambient context, not a correctness dependency.
    pub async fn run(
        &mut self,
        task: &Task,
        capabilities: &CapabilityRegistry,
        store: &dyn SessionStore,
        session_id: Uuid,
    ) -> TaskResult {
        self.load_history(store, session_id).await;

        let mut state = RunState::Idle;
        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut invocations = 0usize;
        let mut outcome: Option<(ResultStatus, String)> = None;

        debug!(agent = %self.spec.id, task_id = %task.id, steps = task.script.len(), state = ?state, "Agent run starting");
        state = RunState::Selecting;

        for call in &task.script {
            if invocations >= self.spec.iteration_cap {
                state = RunState::Exhausted;
                outcome = Some((
                    ResultStatus::Partial,
                    format!(
                        "Iteration cap {} reached after {} of {} calls",
                        self.spec.iteration_cap,
                        invocations,
                        task.script.len()
                    ),
                ));
                break;
            }

            // Permitted-set enforcement: reject, never silently skip.
            if !self.spec.permits(&call.capability) {
                let err = CapabilityError::invalid_input(
                    call.capability.as_str(),
                    format!("capability not permitted for agent '{}'", self.spec.id),
                );
                warn!(agent = %self.spec.id, capability = %call.capability, "Rejected out-of-set capability request");
                state = RunState::Done;
                outcome = Some((ResultStatus::Failure, err.to_string()));
                break;
            }

            state = RunState::Invoking;
            invocations += 1;
            match capabilities.invoke(&call.capability, call.input.clone()).await {
                Ok(output) => {
                    if let Some(binding) = &call.register_as {
                        match build_artifact(binding, &output, task.phase) {
                            Ok(artifact) => artifacts.push(artifact),
                            Err(reason) => {
                                state = RunState::Done;
                                outcome = Some((ResultStatus::Failure, reason));
                                break;
                            }
                        }
                    }
                    state = RunState::Selecting;
                }
                Err(err) => {
                    debug!(agent = %self.spec.id, capability = %call.capability, error = %err, "Capability invocation failed");
                    state = RunState::Done;
                    outcome = Some((ResultStatus::Failure, err.to_string()));
                    break;
                }
            }
        }

        let (status, summary) = outcome.unwrap_or_else(|| {
            state = RunState::Done;
            (
                ResultStatus::Success,
                format!(
                    "{}: completed {} capability invocation(s), produced {} artifact(s)",
                    self.spec.role,
                    invocations,
                    artifacts.len()
                ),
            )
        });

        info!(
            agent = %self.spec.id,
            task_id = %task.id,
            status = status.as_str(),
            invocations,
            artifacts = artifacts.len(),
            final_state = ?state,
            "Agent run finished"
        );

        let mut result = TaskResult::new(task.id, status, summary);
        result.artifacts = artifacts;

        self.record(store, session_id, task, &result).await;
        result
    }

    /// Load the bounded history window from the session store.
    async fn load_history(&mut self, store: &dyn SessionStore, session_id: Uuid) {
        match store
            .history(session_id, &self.spec.id, self.spec.history_limit)
            .await
        {
            Ok(events) => {
                let entries = events
                    .into_iter()
                    .map(|e| HistoryEntry {
                        task: e.task,
                        status: ResultStatus::from_str(&e.status).unwrap_or(ResultStatus::Failure),
                        summary: e.summary,
                        recorded_at: e.recorded_at,
                    })
                    .collect();
                self.history.load(entries);
            }
            Err(err) => {
                warn!(agent = %self.spec.id, error = %err, "Failed to load agent history");
            }
        }
    }

    /// Record the task/result pair in the buffer and the session store.
    async fn record(
        &mut self,
        store: &dyn SessionStore,
        session_id: Uuid,
        task: &Task,
        result: &TaskResult,
    ) {
        let task_line = task.instruction.lines().next().unwrap_or_default().to_string();
        self.history.push(HistoryEntry::new(
            task_line.clone(),
            result.status,
            result.summary.clone(),
        ));

        let event = SessionEvent::new(
            session_id,
            &self.spec.id,
            task_line,
            result.status.as_str(),
            &result.summary,
        );
        if let Err(err) = store.append_event(event).await {
            warn!(agent = %self.spec.id, error = %err, "Failed to persist session event");
        }
    }
}

/// Build an artifact from a capability output and its binding.
fn build_artifact(
    binding: &ArtifactBinding,
    output: &CapabilityOutput,
    phase: usize,
) -> Result<Artifact, String> {
    let location = match binding.kind {
        ArtifactKind::MetadataRecord => ArtifactLocation::Inline {
            payload: output.payload.clone(),
        },
        ArtifactKind::DataframeHandle => {
            let name = output.location.clone().ok_or_else(|| {
                format!("capability returned no handle for artifact '{}'", binding.name)
            })?;
            ArtifactLocation::Handle { name }
        }
        ArtifactKind::ImageFile | ArtifactKind::ReportFile => {
            let path = output.location.clone().ok_or_else(|| {
                format!("capability returned no path for artifact '{}'", binding.name)
            })?;
            ArtifactLocation::File {
                path: PathBuf::from(path),
            }
        }
    };
    Ok(Artifact::new(&binding.name, binding.kind, location, phase))
}

/// Convenience for tests and summaries: payload of the first inline artifact
/// with the given name.
#[allow(dead_code)]
pub(crate) fn inline_payload<'a>(artifacts: &'a [Artifact], name: &str) -> Option<&'a Value> {
    artifacts
        .iter()
        .find(|a| a.name == name)
        .and_then(|a| a.location.inline_payload())
}
