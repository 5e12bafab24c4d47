//! Retry and completion-invariant semantics.
//!
//! Exercises the orchestrator against scripted capabilities: a chart phase
//! that must produce exactly five images, a flaky capability that fails the
//! fifth render once, and an iteration cap that leaves a phase at four of
//! five artifacts.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use datamill::adapters::MemorySessionStore;
use datamill::domain::errors::{CapabilityError, OrchestrationError};
use datamill::domain::models::phase::CallTemplate;
use datamill::domain::models::{
    AgentSpec, ArtifactKind, CapabilitySpec, FieldKind, InputSchema, Phase, PhasePlan,
    SchemaField, SideEffect,
};
use datamill::domain::ports::{Capability, CapabilityOutput};
use datamill::services::{AgentRunner, CapabilityRegistry, Orchestrator, RunContext};

/// Chart-like capability writing a file per call, failing on chosen
/// invocation numbers (1-based, counted across the whole run).
struct ScriptedRender {
    spec: CapabilitySpec,
    dir: PathBuf,
    calls: Arc<AtomicUsize>,
    fail_on: HashSet<usize>,
}

impl ScriptedRender {
    fn new(dir: PathBuf, fail_on: HashSet<usize>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                spec: CapabilitySpec::new(
                    "test.render",
                    "scripted chart renderer",
                    SideEffect::FilesystemWrite,
                    InputSchema::new(vec![SchemaField::required("name", FieldKind::String)]),
                ),
                dir,
                calls: calls.clone(),
                fail_on,
            },
            calls,
        )
    }
}

#[async_trait]
impl Capability for ScriptedRender {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.contains(&call) {
            return Err(CapabilityError::execution_failed(
                "test.render",
                format!("render failed on call {call}"),
            ));
        }
        let name = input["name"].as_str().unwrap_or("chart");
        let path = self.dir.join(format!("{name}.svg"));
        std::fs::write(&path, "<svg/>")
            .map_err(|e| CapabilityError::execution_failed("test.render", e.to_string()))?;
        let location = path.to_string_lossy().to_string();
        Ok(CapabilityOutput::at(json!({"path": location}), location))
    }
}

const CHARTS: [&str; 5] = ["first", "second", "third", "fourth", "fifth"];

fn chart_phase() -> Phase {
    let calls = CHARTS
        .iter()
        .map(|name| {
            CallTemplate::new("test.render", json!({"name": *name}))
                .registering(format!("{name}_chart"), ArtifactKind::ImageFile)
        })
        .collect();
    Phase::new("visualization", "viz", "Render the five charts", calls)
}

fn summary_phase() -> Phase {
    Phase::new(
        "report",
        "viz",
        "Render the wrap-up chart",
        vec![CallTemplate::new("test.render", json!({"name": "summary"}))
            .registering("summary_chart", ArtifactKind::ImageFile)],
    )
}

fn setup(
    fail_on: HashSet<usize>,
    iteration_cap: usize,
) -> (Orchestrator<MemorySessionStore>, Arc<AtomicUsize>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let (render, calls) = ScriptedRender::new(dir.path().to_path_buf(), fail_on);
    let capabilities = Arc::new(CapabilityRegistry::new().with(Arc::new(render)));
    let agent = AgentRunner::new(
        AgentSpec::new("viz", "Chart agent", vec!["test.render".to_string()])
            .with_iteration_cap(iteration_cap),
    );
    let orchestrator = Orchestrator::new(
        vec![agent],
        capabilities,
        Arc::new(MemorySessionStore::new()),
    );
    (orchestrator, calls, dir)
}

#[tokio::test]
async fn test_flaky_fifth_chart_recovers_on_retry() {
    // Call 5 (the fifth chart of the first attempt) fails once.
    let (mut orchestrator, calls, _dir) = setup(HashSet::from([5]), 20);
    let plan = PhasePlan::new(vec![chart_phase()]);
    let ctx = RunContext::new(Uuid::new_v4());

    let summary = orchestrator.execute(&plan, &ctx).await.unwrap();

    assert_eq!(summary.outcomes[0].attempts, 2);
    let images: Vec<_> = summary
        .artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::ImageFile)
        .collect();
    assert_eq!(images.len(), 5);
    // First attempt failed, so nothing was registered from it: every chart
    // carries version 1 from the retry.
    for image in &images {
        assert_eq!(image.version, 1);
    }
    // 5 calls first attempt (4 ok + 1 fail) + 5 on retry.
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_four_of_five_charts_is_incomplete_and_retries() {
    // Iteration cap 4: the agent returns a partial result with four charts;
    // the completion invariant keeps the phase incomplete and triggers the
    // retry, which hits the same cap and fails the run.
    let (mut orchestrator, calls, _dir) = setup(HashSet::new(), 4);
    let plan = PhasePlan::new(vec![chart_phase(), summary_phase()]);
    let ctx = RunContext::new(Uuid::new_v4());

    let err = orchestrator.execute(&plan, &ctx).await.unwrap_err();
    match err {
        OrchestrationError::PhaseFailed { ordinal, name, reason } => {
            assert_eq!(ordinal, 0);
            assert_eq!(name, "visualization");
            assert!(reason.contains("fifth_chart"), "reason: {reason}");
        }
        other => panic!("expected PhaseFailed, got {other:?}"),
    }
    // Two attempts of four invocations each; the summary phase never ran.
    assert_eq!(calls.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn test_persistent_failure_attempts_exactly_twice() {
    // Every invocation fails: the phase is attempted twice, never a third
    // time.
    let (mut orchestrator, calls, _dir) = setup(HashSet::from_iter(1..=100), 20);
    let plan = PhasePlan::new(vec![chart_phase()]);
    let ctx = RunContext::new(Uuid::new_v4());

    let err = orchestrator.execute(&plan, &ctx).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::PhaseFailed { ordinal: 0, .. }));
    // One failing call per attempt, two attempts.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_partial_result_still_completes_when_outputs_are_present() {
    // Cap exactly 5 with a sixth, unregistered bookkeeping call in the
    // script: the agent stops at the cap with a partial result, but every
    // declared chart is registered, so the phase counts as complete.
    let mut calls_template: Vec<CallTemplate> = CHARTS
        .iter()
        .map(|name| {
            CallTemplate::new("test.render", json!({"name": *name}))
                .registering(format!("{name}_chart"), ArtifactKind::ImageFile)
        })
        .collect();
    calls_template.push(CallTemplate::new("test.render", json!({"name": "extra"})));
    let phase = Phase::new("visualization", "viz", "Render the five charts", calls_template);

    let (mut orchestrator, calls, _dir) = setup(HashSet::new(), 5);
    let plan = PhasePlan::new(vec![phase]);
    let ctx = RunContext::new(Uuid::new_v4());

    let summary = orchestrator.execute(&plan, &ctx).await.unwrap();
    assert_eq!(summary.outcomes[0].status, datamill::domain::models::ResultStatus::Partial);
    assert_eq!(summary.outcomes[0].attempts, 1);
    assert_eq!(summary.artifacts.len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}
