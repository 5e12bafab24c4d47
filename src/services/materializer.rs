//! Task materialization.
//!
//! Turns a phase's task template into a concrete [`Task`] by substituting
//! placeholders from the artifact registry and the run parameters. Plan
//! validation has already ruled out references to artifacts of non-earlier
//! phases; failures here are runtime data issues (e.g. a JSON pointer into
//! an empty file listing) and fail the phase attempt rather than the plan.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::models::template::{ArtifactRef, PlaceholderResolver};
use crate::domain::models::{template, CapabilityCall, Phase, Task};
use crate::services::artifact_registry::ArtifactRegistry;

/// Resolver backed by the artifact registry and the run parameters.
struct RegistryResolver<'a> {
    registry: &'a ArtifactRegistry,
    params: &'a BTreeMap<String, Value>,
}

impl PlaceholderResolver for RegistryResolver<'_> {
    fn artifact(&self, reference: &ArtifactRef) -> Result<Value, String> {
        let artifact = self
            .registry
            .lookup(&reference.name)
            .map_err(|e| e.to_string())?;

        match &reference.pointer {
            Some(pointer) => {
                let payload = artifact.location.inline_payload().ok_or_else(|| {
                    format!(
                        "artifact '{}' has no inline payload to resolve '{}' against",
                        reference.name, pointer
                    )
                })?;
                payload.pointer(pointer).cloned().ok_or_else(|| {
                    format!(
                        "pointer '{}' not found in artifact '{}'",
                        pointer, reference.name
                    )
                })
            }
            // Without a pointer: inline artifacts resolve to their payload,
            // file and handle artifacts to their location reference.
            None => match artifact.location.inline_payload() {
                Some(payload) => Ok(payload.clone()),
                None => Ok(Value::String(artifact.location.as_reference())),
            },
        }
    }

    fn param(&self, key: &str) -> Result<Value, String> {
        self.params
            .get(key)
            .cloned()
            .ok_or_else(|| format!("unknown run parameter '{key}'"))
    }
}

/// Materialize the task for one phase attempt.
pub fn materialize_task(
    phase: &Phase,
    ordinal: usize,
    registry: &ArtifactRegistry,
    params: &BTreeMap<String, Value>,
) -> Result<Task, String> {
    let resolver = RegistryResolver { registry, params };

    let mut script = Vec::with_capacity(phase.calls.len());
    for call in &phase.calls {
        let input = template::substitute(&call.input, &resolver)?;
        let mut materialized = CapabilityCall::new(&call.capability, input);
        materialized.register_as = call.register_as.clone();
        script.push(materialized);
    }

    let mut task = Task::new(ordinal, &phase.instruction, script);
    task.params = params.clone();
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::phase::CallTemplate;
    use crate::domain::models::{Artifact, ArtifactKind, ArtifactLocation};
    use serde_json::json;

    fn params() -> BTreeMap<String, Value> {
        let mut params = BTreeMap::new();
        params.insert("data_dir".to_string(), json!("data"));
        params
    }

    #[test]
    fn test_materializes_artifact_pointer() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register(Artifact::new(
                "files",
                ArtifactKind::MetadataRecord,
                ArtifactLocation::Inline {
                    payload: json!({"files": [{"name": "cars.csv", "path": "data/cars.csv"}]}),
                },
                0,
            ))
            .unwrap();

        let phase = Phase::new(
            "analysis",
            "analysis",
            "Load the CSV",
            vec![CallTemplate::new(
                "csv.load",
                json!({"path": "${artifact:files#/files/0/path}", "handle": "frame"}),
            )
            .registering("frame", ArtifactKind::DataframeHandle)],
        );

        let task = materialize_task(&phase, 1, &registry, &params()).unwrap();
        assert_eq!(task.phase, 1);
        assert_eq!(task.script.len(), 1);
        assert_eq!(task.script[0].input["path"], json!("data/cars.csv"));
        assert!(task.script[0].register_as.is_some());
    }

    #[test]
    fn test_pointer_into_empty_listing_fails() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register(Artifact::new(
                "files",
                ArtifactKind::MetadataRecord,
                ArtifactLocation::Inline {
                    payload: json!({"files": []}),
                },
                0,
            ))
            .unwrap();

        let phase = Phase::new(
            "analysis",
            "analysis",
            "Load the CSV",
            vec![CallTemplate::new(
                "csv.load",
                json!({"path": "${artifact:files#/files/0/path}", "handle": "frame"}),
            )],
        );

        let err = materialize_task(&phase, 1, &registry, &params()).unwrap_err();
        assert!(err.contains("/files/0/path"));
    }

    #[test]
    fn test_inline_artifact_resolves_to_payload() {
        let mut registry = ArtifactRegistry::new();
        registry
            .register(Artifact::new(
                "column_stats",
                ArtifactKind::MetadataRecord,
                ArtifactLocation::Inline {
                    payload: json!({"rows": 8}),
                },
                2,
            ))
            .unwrap();

        let phase = Phase::new(
            "report",
            "report",
            "Compose the report",
            vec![CallTemplate::new(
                "report.compose",
                json!({"statistics": "${artifact:column_stats}"}),
            )],
        );

        let task = materialize_task(&phase, 4, &registry, &params()).unwrap();
        assert_eq!(task.script[0].input["statistics"], json!({"rows": 8}));
    }

    #[test]
    fn test_param_substitution() {
        let registry = ArtifactRegistry::new();
        let phase = Phase::new(
            "discovery",
            "discovery",
            "List CSVs",
            vec![CallTemplate::new(
                "csv.list",
                json!({"directory": "${param:data_dir}"}),
            )],
        );

        let task = materialize_task(&phase, 0, &registry, &params()).unwrap();
        assert_eq!(task.script[0].input["directory"], json!("data"));
    }

    #[test]
    fn test_missing_param_fails() {
        let registry = ArtifactRegistry::new();
        let phase = Phase::new(
            "discovery",
            "discovery",
            "List CSVs",
            vec![CallTemplate::new(
                "csv.list",
                json!({"directory": "${param:input_dir}"}),
            )],
        );

        let err = materialize_task(&phase, 0, &registry, &params()).unwrap_err();
        assert!(err.contains("input_dir"));
    }
}
