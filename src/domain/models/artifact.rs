//! Artifact domain model.
//!
//! An artifact is a named, versioned output produced by exactly one phase:
//! a dataframe handle, a chart image, a report file, or an inline metadata
//! record. Artifacts are registered once per version and never mutated; a
//! rewrite by the producing phase creates a new version.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of artifact produced by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A named in-process tabular handle.
    DataframeHandle,
    /// A rendered chart image on disk.
    ImageFile,
    /// A generated report document on disk.
    ReportFile,
    /// Structured data carried inline in the registry.
    MetadataRecord,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataframeHandle => "dataframe_handle",
            Self::ImageFile => "image_file",
            Self::ReportFile => "report_file",
            Self::MetadataRecord => "metadata_record",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dataframe_handle" => Some(Self::DataframeHandle),
            "image_file" => Some(Self::ImageFile),
            "report_file" => Some(Self::ReportFile),
            "metadata_record" => Some(Self::MetadataRecord),
            _ => None,
        }
    }
}

/// Physical location of an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactLocation {
    /// A file on disk.
    File { path: PathBuf },
    /// A named in-process handle (dataframes).
    Handle { name: String },
    /// Payload carried inline in the registry (metadata records).
    Inline { payload: Value },
}

impl ArtifactLocation {
    /// Render the location as a reference string for template substitution
    /// and summaries: the path for files, the handle name for handles.
    pub fn as_reference(&self) -> String {
        match self {
            Self::File { path } => path.display().to_string(),
            Self::Handle { name } => name.clone(),
            Self::Inline { .. } => "(inline)".to_string(),
        }
    }

    /// Inline payload, if this location carries one.
    pub fn inline_payload(&self) -> Option<&Value> {
        match self {
            Self::Inline { payload } => Some(payload),
            _ => None,
        }
    }
}

/// A named, versioned output produced by exactly one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Logical name, unique within the run (e.g. `frame`, `scatter_chart`).
    pub name: String,
    pub kind: ArtifactKind,
    pub location: ArtifactLocation,
    /// Ordinal of the phase that produced this artifact.
    pub producing_phase: usize,
    /// Version counter, starting at 1. Bumped by the registry when the
    /// producing phase re-registers the same name (retry path).
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        kind: ArtifactKind,
        location: ArtifactLocation,
        producing_phase: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            producing_phase,
            version: 1,
            created_at: Utc::now(),
        }
    }
}
