pub mod agent;
pub mod artifact;
pub mod capability;
pub mod config;
pub mod phase;
pub mod session;
pub mod task;
pub mod template;

pub use agent::{AgentSpec, HistoryBuffer, HistoryEntry};
pub use artifact::{Artifact, ArtifactKind, ArtifactLocation};
pub use capability::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
pub use config::{AgentConfig, Config, DatabaseConfig, LoggingConfig};
pub use phase::{CallTemplate, Phase, PhasePlan};
pub use session::{Session, SessionEvent};
pub use task::{ArtifactBinding, CapabilityCall, ResultStatus, Task, TaskResult};
