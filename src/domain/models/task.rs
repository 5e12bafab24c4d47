//! Task and result domain models.
//!
//! A task is the unit of work handed to an agent: a free-text instruction,
//! named parameters, and an explicit ordered script of capability calls —
//! the deterministic replacement for model-chosen capability selection.
//! Tasks are immutable once issued; results are produced once per task and
//! never mutated after return.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::artifact::{Artifact, ArtifactKind};

/// Binding of a capability call's output to a logical artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBinding {
    /// Logical name the orchestrator registers the output under.
    pub name: String,
    pub kind: ArtifactKind,
}

impl ArtifactBinding {
    pub fn new(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One scripted capability invocation within a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityCall {
    /// Name of the capability to invoke.
    pub capability: String,
    /// Structured input, fully materialized (no placeholders).
    pub input: Value,
    /// When set, the call's output becomes a registered artifact.
    pub register_as: Option<ArtifactBinding>,
}

impl CapabilityCall {
    pub fn new(capability: impl Into<String>, input: Value) -> Self {
        Self {
            capability: capability.into(),
            input,
            register_as: None,
        }
    }

    /// Bind the call's output to a logical artifact name.
    pub fn registering(mut self, name: impl Into<String>, kind: ArtifactKind) -> Self {
        self.register_as = Some(ArtifactBinding::new(name, kind));
        self
    }
}

/// A unit of work issued to an agent for one phase attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    /// Ordinal of the phase this task belongs to.
    pub phase: usize,
    /// Free-text instruction (role framing, not interpreted by the engine).
    pub instruction: String,
    /// Named parameters the task was materialized with.
    pub params: BTreeMap<String, Value>,
    /// Ordered capability calls the agent executes, one per iteration.
    pub script: Vec<CapabilityCall>,
}

impl Task {
    pub fn new(phase: usize, instruction: impl Into<String>, script: Vec<CapabilityCall>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase,
            instruction: instruction.into(),
            params: BTreeMap::new(),
            script,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Outcome status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// Every scripted call completed.
    Success,
    /// A call failed or was rejected; remaining calls were not attempted.
    Failure,
    /// The iteration cap was reached before the script finished.
    Partial,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}

/// Result returned by an agent for one task.
///
/// Partial results propagate upward rather than aborting the pipeline; the
/// orchestrator judges the phase by its completion invariant, not by the
/// status alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: Uuid,
    pub status: ResultStatus,
    /// Artifacts produced, in script order.
    pub artifacts: Vec<Artifact>,
    /// Free-text summary; failure results record the error here.
    pub summary: String,
}

impl TaskResult {
    pub fn new(task_id: Uuid, status: ResultStatus, summary: impl Into<String>) -> Self {
        Self {
            task_id,
            status,
            artifacts: Vec::new(),
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_builder() {
        let call = CapabilityCall::new("csv.list", json!({"directory": "data"}))
            .registering("files", ArtifactKind::MetadataRecord);
        assert_eq!(call.capability, "csv.list");
        let binding = call.register_as.unwrap();
        assert_eq!(binding.name, "files");
        assert_eq!(binding.kind, ArtifactKind::MetadataRecord);
    }

    #[test]
    fn test_task_params() {
        let task = Task::new(0, "Discover CSV files", vec![])
            .with_param("data_dir", json!("data"));
        assert_eq!(task.params.get("data_dir"), Some(&json!("data")));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ResultStatus::Success,
            ResultStatus::Failure,
            ResultStatus::Partial,
        ] {
            assert_eq!(ResultStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ResultStatus::from_str("unknown"), None);
    }
}
