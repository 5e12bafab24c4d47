//! CSV access capabilities: discovery listing and frame loading.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::frame::{Frame, TabularStore};
use crate::domain::errors::CapabilityError;
use crate::domain::models::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
use crate::domain::ports::{Capability, CapabilityOutput};

/// `csv.list`: list CSV files in a directory with size and modification time.
pub struct CsvListCapability {
    spec: CapabilitySpec,
}

impl CsvListCapability {
    pub fn new() -> Self {
        Self {
            spec: CapabilitySpec::new(
                "csv.list",
                "List CSV files in a directory with size and modification time",
                SideEffect::Pure,
                InputSchema::new(vec![SchemaField::required("directory", FieldKind::String)]),
            ),
        }
    }
}

impl Default for CsvListCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for CsvListCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let directory = input["directory"].as_str().unwrap_or_default().to_string();

        let files = tokio::task::spawn_blocking(move || list_csv_files(&directory))
            .await
            .map_err(|e| CapabilityError::execution_failed("csv.list", e.to_string()))?
            .map_err(|e| CapabilityError::execution_failed("csv.list", e))?;

        let payload = json!({
            "directory": input["directory"],
            "count": files.len(),
            "files": files,
        });
        Ok(CapabilityOutput::inline(payload))
    }
}

fn list_csv_files(directory: &str) -> Result<Vec<Value>, String> {
    let dir = Path::new(directory);
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("cannot read directory '{directory}': {e}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !path.is_file() || !is_csv {
            continue;
        }

        let metadata = entry.metadata().map_err(|e| e.to_string())?;
        let modified = metadata
            .modified()
            .ok()
            .map(DateTime::<Utc>::from)
            .map(|t| t.to_rfc3339());

        files.push(json!({
            "name": path.file_name().map(|n| n.to_string_lossy().to_string()),
            "path": path.to_string_lossy(),
            "size_bytes": metadata.len(),
            "modified": modified,
        }));
    }

    // Deterministic order regardless of directory iteration order.
    files.sort_by(|a, b| {
        a["name"]
            .as_str()
            .unwrap_or_default()
            .cmp(b["name"].as_str().unwrap_or_default())
    });
    Ok(files)
}

/// `csv.load`: parse a CSV file into a named frame in the tabular store.
pub struct CsvLoadCapability {
    spec: CapabilitySpec,
    store: Arc<TabularStore>,
}

impl CsvLoadCapability {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "csv.load",
                "Parse a CSV file into a named dataframe handle",
                SideEffect::Pure,
                InputSchema::new(vec![
                    SchemaField::required("path", FieldKind::String),
                    SchemaField::required("handle", FieldKind::String),
                ]),
            ),
            store,
        }
    }
}

#[async_trait]
impl Capability for CsvLoadCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let path = input["path"].as_str().unwrap_or_default();
        let handle = input["handle"].as_str().unwrap_or_default();
        if handle.is_empty() {
            return Err(CapabilityError::invalid_input(
                "csv.load",
                "handle must be non-empty",
            ));
        }

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            CapabilityError::execution_failed("csv.load", format!("cannot read '{path}': {e}"))
        })?;
        let frame = Frame::parse_csv(&text)
            .map_err(|e| CapabilityError::execution_failed("csv.load", e))?;

        let columns: Vec<Value> = frame
            .columns
            .iter()
            .map(|c| json!({"name": c.name, "kind": c.kind_str(), "nulls": c.null_count()}))
            .collect();
        let payload = json!({
            "handle": handle,
            "path": path,
            "rows": frame.rows,
            "columns": columns,
        });

        self.store.insert(handle, frame);
        Ok(CapabilityOutput::at(payload, handle))
    }
}
