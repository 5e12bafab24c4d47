//! Property-based tests for the artifact registry invariants.

use proptest::prelude::*;

use datamill::domain::errors::RegistryError;
use datamill::domain::models::{Artifact, ArtifactKind, ArtifactLocation};
use datamill::services::ArtifactRegistry;

fn artifact(name: &str, phase: usize) -> Artifact {
    Artifact::new(
        name,
        ArtifactKind::MetadataRecord,
        ArtifactLocation::Inline {
            payload: serde_json::json!({"phase": phase}),
        },
        phase,
    )
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    /// register followed by lookup returns the registered artifact.
    #[test]
    fn prop_register_then_lookup(name in name_strategy(), phase in 0usize..5) {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact(&name, phase)).unwrap();

        let found = registry.lookup(&name).unwrap();
        prop_assert_eq!(&found.name, &name);
        prop_assert_eq!(found.producing_phase, phase);
    }

    /// Registering the same name from a different phase always fails with
    /// a duplicate-key error; from the same phase it always versions up.
    #[test]
    fn prop_ownership_is_per_phase(
        name in name_strategy(),
        owner in 0usize..5,
        writes in proptest::collection::vec(0usize..5, 1..10),
    ) {
        let mut registry = ArtifactRegistry::new();
        registry.register(artifact(&name, owner)).unwrap();

        let mut expected_version = 1u32;
        for phase in writes {
            let result = registry.register(artifact(&name, phase));
            if phase == owner {
                expected_version += 1;
                prop_assert_eq!(result.unwrap(), expected_version);
            } else {
                let is_duplicate = matches!(result, Err(RegistryError::DuplicateKey { .. }));
                prop_assert!(is_duplicate);
            }
        }

        // Lookup still returns the owner's latest version.
        let found = registry.lookup(&name).unwrap();
        prop_assert_eq!(found.producing_phase, owner);
        prop_assert_eq!(found.version, expected_version);
    }

    /// The listing has one entry per distinct name regardless of version
    /// churn, and lookup of an unregistered name always fails.
    #[test]
    fn prop_listing_is_one_entry_per_name(
        names in proptest::collection::vec(name_strategy(), 1..10),
    ) {
        let mut registry = ArtifactRegistry::new();
        for name in &names {
            // Same phase for every name: re-registration is versioning.
            let _ = registry.register(artifact(name, 0));
        }

        let mut distinct: Vec<&String> = names.iter().collect();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(registry.list().len(), distinct.len());

        prop_assert!(matches!(
            registry.lookup("never-registered"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
