//! Capability registry: name-keyed dispatch with input validation.
//!
//! Capabilities are registered once at startup and never mutated.
//! `invoke` resolves the name, validates the input against the declared
//! schema, and dispatches — the three `CapabilityError` kinds map onto the
//! three failure points.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::errors::CapabilityError;
use crate::domain::models::CapabilitySpec;
use crate::domain::ports::{Capability, CapabilityOutput};

/// Name-keyed set of capabilities.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its spec name. Later registrations of
    /// the same name replace earlier ones.
    pub fn with(mut self, capability: Arc<dyn Capability>) -> Self {
        let name = capability.spec().name.clone();
        if self
            .capabilities
            .insert(name.clone(), capability)
            .is_some()
        {
            tracing::warn!(capability = %name, "Capability re-registered, replacing earlier entry");
        }
        self
    }

    /// Spec of a registered capability.
    pub fn spec(&self, name: &str) -> Option<&CapabilitySpec> {
        self.capabilities.get(name).map(|c| c.spec())
    }

    /// Registered capability names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invoke a capability by name with schema validation.
    pub async fn invoke(
        &self,
        name: &str,
        input: Value,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let capability = self
            .capabilities
            .get(name)
            .ok_or_else(|| CapabilityError::NotFound(name.to_string()))?;

        capability
            .spec()
            .input_schema
            .check(&input)
            .map_err(|reason| CapabilityError::invalid_input(name, reason))?;

        capability.invoke(input).await
    }
}
