//! Domain errors for the datamill pipeline engine.

use thiserror::Error;

/// Errors raised by capability invocation.
///
/// Capability errors never cross the agent boundary: the owning agent folds
/// them into a failure result with the error recorded in the summary text.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Unknown capability: {0}")]
    NotFound(String),

    #[error("Invalid input for capability '{capability}': {reason}")]
    InvalidInput { capability: String, reason: String },

    #[error("Capability '{capability}' failed: {reason}")]
    ExecutionFailed { capability: String, reason: String },
}

impl CapabilityError {
    pub fn invalid_input(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    pub fn execution_failed(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            capability: capability.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the artifact registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(
        "Artifact '{name}' already registered by phase {existing_phase}, rejected write from phase {attempted_phase}"
    )]
    DuplicateKey {
        name: String,
        existing_phase: usize,
        attempted_phase: usize,
    },

    #[error("Artifact not found: {0}")]
    NotFound(String),
}

/// Errors raised by the orchestrator.
///
/// These are fatal to the run: a phase that exhausts its single retry halts
/// the pipeline, and a plan that fails validation never starts it.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Phase {ordinal} ({name}) failed after retry: {reason}")]
    PhaseFailed {
        ordinal: usize,
        name: String,
        reason: String,
    },

    #[error("Plan validation failed: {0}")]
    PlanValidation(String),
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_display() {
        let err = CapabilityError::NotFound("table.pivot".to_string());
        assert_eq!(err.to_string(), "Unknown capability: table.pivot");

        let err = CapabilityError::invalid_input("csv.load", "missing field 'path'");
        assert!(err.to_string().contains("csv.load"));
        assert!(err.to_string().contains("missing field 'path'"));
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::DuplicateKey {
            name: "frame".to_string(),
            existing_phase: 1,
            attempted_phase: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("'frame'"));
        assert!(msg.contains("phase 1"));
        assert!(msg.contains("phase 3"));
    }

    #[test]
    fn test_orchestration_error_identifies_phase() {
        let err = OrchestrationError::PhaseFailed {
            ordinal: 3,
            name: "visualization".to_string(),
            reason: "4 of 5 charts produced".to_string(),
        };
        assert!(err.to_string().contains("visualization"));
        assert!(err.to_string().contains("Phase 3"));
    }
}
