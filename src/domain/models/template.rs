//! Task template placeholders.
//!
//! Phase task templates carry placeholder strings that are substituted at
//! materialization time:
//!
//! - `${artifact:NAME}` — the latest version of an artifact: the file path
//!   or handle name for located artifacts, the payload itself for inline
//!   metadata records.
//! - `${artifact:NAME#/json/pointer}` — a value extracted from an inline
//!   artifact payload by JSON pointer.
//! - `${param:KEY}` — a value from the run's initial context.
//!
//! A placeholder that spans an entire string is replaced by the resolved
//! value verbatim (which may be non-string); embedded placeholders are
//! stringified in place.

use serde_json::Value;

/// A parsed `${artifact:...}` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Logical artifact name.
    pub name: String,
    /// Optional JSON pointer into an inline payload.
    pub pointer: Option<String>,
}

/// Resolver callbacks supplied by the materializer.
pub trait PlaceholderResolver {
    /// Resolve an artifact reference to a value.
    fn artifact(&self, reference: &ArtifactRef) -> Result<Value, String>;
    /// Resolve a run parameter to a value.
    fn param(&self, key: &str) -> Result<Value, String>;
}

/// Collect every `${artifact:...}` reference in a template value.
pub fn scan_artifact_refs(value: &Value, out: &mut Vec<ArtifactRef>) {
    match value {
        Value::String(s) => {
            for (kind, body) in placeholders(s) {
                if kind == "artifact" {
                    out.push(parse_artifact_body(body));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                scan_artifact_refs(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                scan_artifact_refs(item, out);
            }
        }
        _ => {}
    }
}

/// Substitute every placeholder in a template value.
pub fn substitute(value: &Value, resolver: &dyn PlaceholderResolver) -> Result<Value, String> {
    match value {
        Value::String(s) => substitute_string(s, resolver),
        Value::Array(items) => {
            let resolved: Result<Vec<_>, _> =
                items.iter().map(|v| substitute(v, resolver)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), substitute(v, resolver)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, resolver: &dyn PlaceholderResolver) -> Result<Value, String> {
    // Whole-string placeholder: preserve the resolved value's type.
    if let Some((kind, body)) = whole_placeholder(s) {
        return resolve(kind, body, resolver);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(format!("unterminated placeholder in '{s}'"));
        };
        let inner = &after[..end];
        let (kind, body) = split_placeholder(inner)
            .ok_or_else(|| format!("malformed placeholder '${{{inner}}}'"))?;
        let value = resolve(kind, body, resolver)?;
        match value {
            Value::String(v) => result.push_str(&v),
            other => result.push_str(&other.to_string()),
        }
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(Value::String(result))
}

fn resolve(kind: &str, body: &str, resolver: &dyn PlaceholderResolver) -> Result<Value, String> {
    match kind {
        "artifact" => resolver.artifact(&parse_artifact_body(body)),
        "param" => resolver.param(body),
        other => Err(format!("unknown placeholder kind '{other}'")),
    }
}

fn parse_artifact_body(body: &str) -> ArtifactRef {
    match body.split_once('#') {
        Some((name, pointer)) => ArtifactRef {
            name: name.to_string(),
            pointer: Some(pointer.to_string()),
        },
        None => ArtifactRef {
            name: body.to_string(),
            pointer: None,
        },
    }
}

/// Returns `(kind, body)` when the entire string is a single placeholder.
fn whole_placeholder(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    split_placeholder(inner)
}

fn split_placeholder(inner: &str) -> Option<(&str, &str)> {
    let (kind, body) = inner.split_once(':')?;
    if kind.is_empty() || body.is_empty() {
        return None;
    }
    Some((kind, body))
}

/// Iterate `(kind, body)` pairs for every placeholder in a string.
fn placeholders(s: &str) -> Vec<(&str, &str)> {
    let mut found = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        if let Some(pair) = split_placeholder(&after[..end]) {
            found.push(pair);
        }
        rest = &after[end + 1..];
    }
    found
}
