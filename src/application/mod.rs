//! Application layer: pipeline assembly.

pub mod pipeline;

pub use pipeline::{build_orchestrator, standard_agents, standard_context, standard_plan};
