//! Service layer: the orchestration engine.

pub mod agent_runner;
pub mod artifact_registry;
pub mod capability_registry;
pub mod materializer;
pub mod orchestrator;

pub use agent_runner::AgentRunner;
pub use artifact_registry::ArtifactRegistry;
pub use capability_registry::CapabilityRegistry;
pub use orchestrator::{
    ArtifactRecord, FinalSummary, Orchestrator, PhaseOutcome, RunContext, MAX_PHASE_RETRIES,
};
