//! Datamill - Deterministic Data-Analysis Pipeline Engine
//!
//! Datamill runs a fixed five-phase pipeline over a directory of CSV files
//! — discovery, analysis, statistics, visualization, report — producing
//! chart images and a markdown report. Each phase is executed by a bound
//! agent restricted to a permitted capability set; the orchestrator
//! enforces phase ordering, per-phase completion invariants, and a single
//! retry per phase.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, ports, and error taxonomy
//! - **Service Layer** (`services`): the orchestration engine
//! - **Application Layer** (`application`): standard pipeline assembly
//! - **Adapters** (`adapters`): built-in capabilities and storage
//! - **Infrastructure Layer** (`infrastructure`): config and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use datamill::adapters::MemorySessionStore;
//! use datamill::application::{build_orchestrator, standard_context, standard_plan};
//! use datamill::domain::models::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut orchestrator = build_orchestrator(&config, Arc::new(MemorySessionStore::new()));
//!     let ctx = standard_context(&config, uuid::Uuid::new_v4());
//!     let summary = orchestrator.execute(&standard_plan(), &ctx).await?;
//!     println!("{}", summary.to_text());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{CapabilityError, OrchestrationError, RegistryError};
pub use domain::models::{
    AgentSpec, Artifact, ArtifactKind, ArtifactLocation, CapabilitySpec, Config, Phase, PhasePlan,
    ResultStatus, Task, TaskResult,
};
pub use domain::ports::{Capability, CapabilityOutput, SessionStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentRunner, ArtifactRegistry, CapabilityRegistry, FinalSummary, Orchestrator, RunContext,
};
