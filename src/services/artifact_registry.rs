//! Process-wide record of produced outputs.
//!
//! Artifacts are keyed by logical name. A name is owned by the phase that
//! first registers it: the same phase may re-register the name (the retry
//! path), which appends a new version; any other phase attempting the same
//! name is rejected with a duplicate-key error. Lookup returns the latest
//! version. The registry is mutated only by the orchestrator, on a phase's
//! behalf, after that phase returns — sequential access, no locking.

use std::collections::HashMap;

use crate::domain::errors::RegistryError;
use crate::domain::models::{Artifact, ArtifactKind};

/// Append-only, versioned artifact store for one pipeline run.
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    versions: HashMap<String, Vec<Artifact>>,
    /// Registration order of logical names, for stable listings.
    order: Vec<String>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact under its logical name, returning the assigned
    /// version.
    ///
    /// The version counter is assigned by the registry: 1 for a new name,
    /// latest + 1 when the producing phase re-registers the name.
    pub fn register(&mut self, mut artifact: Artifact) -> Result<u32, RegistryError> {
        let name = artifact.name.clone();
        match self.versions.get_mut(&name) {
            Some(existing) => {
                if let Some(latest) = existing.last() {
                    if latest.producing_phase != artifact.producing_phase {
                        return Err(RegistryError::DuplicateKey {
                            name,
                            existing_phase: latest.producing_phase,
                            attempted_phase: artifact.producing_phase,
                        });
                    }
                    artifact.version = latest.version + 1;
                }
                let version = artifact.version;
                existing.push(artifact);
                Ok(version)
            }
            None => {
                artifact.version = 1;
                self.order.push(name.clone());
                self.versions.entry(name).or_default().push(artifact);
                Ok(1)
            }
        }
    }

    /// The latest version of the named artifact.
    pub fn lookup(&self, name: &str) -> Result<&Artifact, RegistryError> {
        self.versions
            .get(name)
            .and_then(|v| v.last())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.versions.contains_key(name)
    }

    /// Latest version of every artifact, in registration order.
    pub fn list(&self) -> Vec<&Artifact> {
        self.order
            .iter()
            .filter_map(|name| self.versions.get(name).and_then(|v| v.last()))
            .collect()
    }

    /// Count of artifacts of `kind` whose latest version was produced by
    /// `phase`.
    pub fn count_for_phase(&self, phase: usize, kind: ArtifactKind) -> usize {
        self.list()
            .into_iter()
            .filter(|a| a.producing_phase == phase && a.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ArtifactLocation;

    fn artifact(name: &str, phase: usize) -> Artifact {
        Artifact::new(
            name,
            ArtifactKind::MetadataRecord,
            ArtifactLocation::Inline {
                payload: serde_json::json!({}),
            },
            phase,
        )
    }

    #[test]
    fn test_register_then_lookup_returns_same_artifact() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("files", 0)).unwrap();

        let found = registry.lookup("files").unwrap();
        assert_eq!(found.name, "files");
        assert_eq!(found.producing_phase, 0);
        assert_eq!(found.version, 1);
    }

    #[test]
    fn test_lookup_missing_name_fails() {
        let registry = ArtifactRegistry::new();
        assert!(matches!(
            registry.lookup("frame"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_key_from_different_phase_is_rejected() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("frame", 1)).unwrap();

        let err = registry.register(artifact("frame", 2)).unwrap_err();
        match err {
            RegistryError::DuplicateKey {
                name,
                existing_phase,
                attempted_phase,
            } => {
                assert_eq!(name, "frame");
                assert_eq!(existing_phase, 1);
                assert_eq!(attempted_phase, 2);
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn test_same_phase_reregistration_creates_new_version() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("frame", 1)).unwrap();
        let version = registry.register(artifact("frame", 1)).unwrap();
        assert_eq!(version, 2);

        // Lookup returns the latest version; the listing stays one entry.
        assert_eq!(registry.lookup("frame").unwrap().version, 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("files", 0)).unwrap();
        registry.register(artifact("frame", 1)).unwrap();
        registry.register(artifact("overview", 1)).unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["files", "frame", "overview"]);
    }

    #[test]
    fn test_count_for_phase_filters_by_kind_and_phase() {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact("files", 0)).unwrap();
        for name in ["a", "b", "c"] {
            registry
                .register(Artifact::new(
                    name,
                    ArtifactKind::ImageFile,
                    ArtifactLocation::File {
                        path: format!("plots/{name}.svg").into(),
                    },
                    3,
                ))
                .unwrap();
        }

        assert_eq!(registry.count_for_phase(3, ArtifactKind::ImageFile), 3);
        assert_eq!(registry.count_for_phase(3, ArtifactKind::MetadataRecord), 0);
        assert_eq!(registry.count_for_phase(0, ArtifactKind::MetadataRecord), 1);
    }
}
