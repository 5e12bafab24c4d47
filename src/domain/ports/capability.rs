//! Capability port (trait) for dependency injection.
//!
//! A capability is a single named invokable operation with structured
//! input/output. Adapters implement this trait; the capability registry
//! validates input against the declared schema before dispatch, so
//! implementations may assume required fields are present and well-typed.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::CapabilityError;
use crate::domain::models::CapabilitySpec;

/// Structured output of a capability invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityOutput {
    /// Structured payload returned to the caller.
    pub payload: Value,
    /// Location reference for artifact registration: the written file path
    /// for filesystem-writing capabilities, the handle name for capabilities
    /// that persist a named handle. `None` for inline/metadata outputs.
    pub location: Option<String>,
}

impl CapabilityOutput {
    /// An output whose payload is carried inline (metadata records).
    pub fn inline(payload: Value) -> Self {
        Self {
            payload,
            location: None,
        }
    }

    /// An output backed by a physical location (file path or handle name).
    pub fn at(payload: Value, location: impl Into<String>) -> Self {
        Self {
            payload,
            location: Some(location.into()),
        }
    }
}

/// A named invokable operation.
///
/// Implementations are stateless across invocations except for explicitly
/// named persisted artifacts (e.g. a dataframe handle that subsequent calls
/// reference by name). A capability declared `Pure` must not touch the
/// filesystem.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Static descriptor: name, input contract, side-effect class.
    fn spec(&self) -> &CapabilitySpec;

    /// Invoke the capability with validated input.
    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError>;
}
