//! Confined file-write capability.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::paths;
use crate::domain::errors::CapabilityError;
use crate::domain::models::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
use crate::domain::ports::{Capability, CapabilityOutput};

/// `file.write`: persist text content under the configured base directory.
/// A path escaping the base directory is rejected as invalid input.
pub struct FileWriteCapability {
    spec: CapabilitySpec,
    base_dir: PathBuf,
}

impl FileWriteCapability {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "file.write",
                "Write text content to a path under the base directory",
                SideEffect::FilesystemWrite,
                InputSchema::new(vec![
                    SchemaField::required("path", FieldKind::String),
                    SchemaField::required("content", FieldKind::String),
                ]),
            ),
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl Capability for FileWriteCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let relative = input["path"].as_str().unwrap_or_default();
        let content = input["content"].as_str().unwrap_or_default();

        let path = paths::confine(&self.base_dir, relative)
            .map_err(|e| CapabilityError::invalid_input("file.write", e))?;
        paths::ensure_parent(&path)
            .map_err(|e| CapabilityError::execution_failed("file.write", e))?;
        tokio::fs::write(&path, content).await.map_err(|e| {
            CapabilityError::execution_failed(
                "file.write",
                format!("cannot write '{}': {e}", path.display()),
            )
        })?;

        let written = path.to_string_lossy().to_string();
        Ok(CapabilityOutput::at(
            json!({"path": written, "bytes": content.len()}),
            written.clone(),
        ))
    }
}
