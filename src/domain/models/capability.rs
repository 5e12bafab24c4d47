//! Capability descriptors.
//!
//! A capability is a single named invokable operation with structured
//! input/output. Capabilities are registered once at startup and never
//! mutated; identity is the name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Side-effect class of a capability.
///
/// A pure capability must not touch the filesystem; persistence of named
/// dataframe handles does not count as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// No observable effect outside the returned payload (and named handles).
    Pure,
    /// Writes files under a configured root.
    FilesystemWrite,
}

impl SideEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::FilesystemWrite => "filesystem_write",
        }
    }
}

/// Expected primitive shape of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Object,
    Array,
}

impl FieldKind {
    /// Whether a JSON value matches this field kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// One declared input field of a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl SchemaField {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// Declared input contract of a capability: required keys and type tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSchema {
    pub fields: Vec<SchemaField>,
}

impl InputSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self { fields }
    }

    /// Validate an input object against the schema.
    ///
    /// Returns the first mismatch as a human-readable reason.
    pub fn check(&self, input: &Value) -> Result<(), String> {
        let Some(map) = input.as_object() else {
            return Err("input must be a JSON object".to_string());
        };
        for field in &self.fields {
            match map.get(&field.name) {
                Some(value) => {
                    if !value.is_null() && !field.kind.matches(value) {
                        return Err(format!(
                            "field '{}' must be a {}",
                            field.name,
                            field.kind.as_str()
                        ));
                    }
                }
                None if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Static description of a capability: name, input contract, side-effect class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySpec {
    /// Unique name, e.g. `csv.load`. Identity of the capability.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Declared side-effect class.
    pub side_effect: SideEffect,
    /// Input contract, enforced by the capability registry before dispatch.
    pub input_schema: InputSchema,
}

impl CapabilitySpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        side_effect: SideEffect,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            side_effect,
            input_schema,
        }
    }
}
