//! End-to-end integration tests for the standard five-phase pipeline.
//!
//! These run the real built-in capabilities against a temp workspace: CSV
//! discovery, frame loading, statistics, five SVG charts, and the markdown
//! report.

mod common;

use std::path::Path;
use std::sync::Arc;

use datamill::adapters::MemorySessionStore;
use datamill::application::{build_orchestrator, standard_context, standard_plan};
use datamill::domain::errors::OrchestrationError;
use datamill::domain::models::{ArtifactKind, ResultStatus};
use datamill::domain::ports::SessionStore;
use uuid::Uuid;

use common::Fixture;

#[tokio::test]
async fn test_standard_pipeline_end_to_end() {
    let fixture = Fixture::new();
    let store = Arc::new(MemorySessionStore::new());
    let mut orchestrator = build_orchestrator(&fixture.config, store.clone());
    let session_id = Uuid::new_v4();
    let ctx = standard_context(&fixture.config, session_id);

    let summary = orchestrator
        .execute(&standard_plan(), &ctx)
        .await
        .expect("pipeline should complete");

    // Every phase completed on the first attempt.
    assert_eq!(summary.outcomes.len(), 5);
    for outcome in &summary.outcomes {
        assert_eq!(outcome.status, ResultStatus::Success, "phase {}", outcome.name);
        assert_eq!(outcome.attempts, 1, "phase {}", outcome.name);
    }

    // Discovery produced the files metadata record with producing phase 0.
    let files = summary.artifacts.iter().find(|a| a.name == "files").unwrap();
    assert_eq!(files.kind, ArtifactKind::MetadataRecord);
    assert_eq!(files.producing_phase, 0);
    assert_eq!(files.version, 1);

    // Exactly five image artifacts, all on disk, all from the viz phase.
    let images: Vec<_> = summary
        .artifacts
        .iter()
        .filter(|a| a.kind == ArtifactKind::ImageFile)
        .collect();
    assert_eq!(images.len(), 5);
    for image in &images {
        assert_eq!(image.producing_phase, 3);
        assert!(Path::new(&image.location).exists(), "missing {}", image.location);
        let content = std::fs::read_to_string(&image.location).unwrap();
        assert!(content.starts_with("<svg"));
    }

    // The report exists, references the charts, and carries the stats table.
    let report = summary.artifacts.iter().find(|a| a.name == "report").unwrap();
    assert_eq!(report.kind, ArtifactKind::ReportFile);
    let markdown = std::fs::read_to_string(&report.location).unwrap();
    assert!(markdown.contains("# Data Analysis Report"));
    assert!(markdown.contains("cars.csv"));
    assert!(markdown.contains("## Statistical Insights"));
    assert!(markdown.contains("distribution.svg"));
    assert!(markdown.contains("8 rows across 6 columns"));

    // Outputs landed under the configured roots.
    assert!(fixture.path().join("plots/distribution.svg").exists());
    assert!(fixture.path().join("reports/analysis_report.md").exists());

    // One history event per agent was recorded in the session.
    for agent in ["discovery", "analysis", "statistics", "visualization", "report"] {
        let events = store.history(session_id, agent, 10).await.unwrap();
        assert_eq!(events.len(), 1, "agent {agent}");
        assert_eq!(events[0].status, "success");
    }
}

#[tokio::test]
async fn test_missing_data_dir_fails_discovery_and_halts() {
    let fixture = Fixture::new();
    let mut config = fixture.config.clone();
    config.data_dir = fixture.path().join("nowhere").to_string_lossy().to_string();

    let store = Arc::new(MemorySessionStore::new());
    let mut orchestrator = build_orchestrator(&config, store.clone());
    let session_id = Uuid::new_v4();
    let ctx = standard_context(&config, session_id);

    let err = orchestrator
        .execute(&standard_plan(), &ctx)
        .await
        .expect_err("discovery should fail");

    match err {
        OrchestrationError::PhaseFailed { ordinal, name, .. } => {
            assert_eq!(ordinal, 0);
            assert_eq!(name, "discovery");
        }
        other => panic!("expected PhaseFailed, got {other:?}"),
    }

    // Discovery was attempted twice (initial + one retry), analysis never.
    let discovery_events = store.history(session_id, "discovery", 10).await.unwrap();
    assert_eq!(discovery_events.len(), 2);
    assert!(store.history(session_id, "analysis", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_data_dir_completes_discovery_but_fails_analysis() {
    let fixture = Fixture::empty_data_dir();
    let store = Arc::new(MemorySessionStore::new());
    let mut orchestrator = build_orchestrator(&fixture.config, store.clone());
    let session_id = Uuid::new_v4();
    let ctx = standard_context(&fixture.config, session_id);

    let err = orchestrator
        .execute(&standard_plan(), &ctx)
        .await
        .expect_err("analysis should fail without any CSV");

    match err {
        OrchestrationError::PhaseFailed { ordinal, name, .. } => {
            assert_eq!(ordinal, 1);
            assert_eq!(name, "analysis");
        }
        other => panic!("expected PhaseFailed, got {other:?}"),
    }

    // Discovery succeeded once; later phases never ran.
    assert_eq!(store.history(session_id, "discovery", 10).await.unwrap().len(), 1);
    assert!(store.history(session_id, "statistics", 10).await.unwrap().is_empty());
    assert!(store.history(session_id, "visualization", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_in_same_session_accumulates_history() {
    let fixture = Fixture::new();
    let store = Arc::new(MemorySessionStore::new());
    let session_id = Uuid::new_v4();

    for _ in 0..2 {
        let mut orchestrator = build_orchestrator(&fixture.config, store.clone());
        let ctx = standard_context(&fixture.config, session_id);
        orchestrator
            .execute(&standard_plan(), &ctx)
            .await
            .expect("pipeline should complete");
    }

    let events = store.history(session_id, "discovery", 10).await.unwrap();
    assert_eq!(events.len(), 2);
}
