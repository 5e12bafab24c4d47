//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - Capability: a named invokable operation with structured input/output
//! - SessionStore: persistence for agent conversation history
//!
//! These traits define the contracts that allow the engine to be independent
//! of specific capability and storage implementations.

pub mod capability;
pub mod session_store;

pub use capability::{Capability, CapabilityOutput};
pub use session_store::SessionStore;
