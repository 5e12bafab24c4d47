//! Report composition capability.
//!
//! Renders the markdown analysis report: executive summary, data overview,
//! key findings, visualizations, and statistical insights, written to a
//! path confined under the base directory.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::paths;
use crate::domain::errors::CapabilityError;
use crate::domain::models::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
use crate::domain::ports::{Capability, CapabilityOutput};

/// `report.compose`: render and persist the markdown report.
pub struct ReportComposeCapability {
    spec: CapabilitySpec,
    base_dir: PathBuf,
}

impl ReportComposeCapability {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "report.compose",
                "Compose the markdown analysis report from statistics and charts",
                SideEffect::FilesystemWrite,
                InputSchema::new(vec![
                    SchemaField::required("title", FieldKind::String),
                    SchemaField::required("output_path", FieldKind::String),
                    SchemaField::optional("dataset", FieldKind::String),
                    SchemaField::optional("overview", FieldKind::Object),
                    SchemaField::optional("statistics", FieldKind::Object),
                    SchemaField::optional("correlations", FieldKind::Object),
                    SchemaField::optional("charts", FieldKind::Array),
                ]),
            ),
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl Capability for ReportComposeCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let markdown = compose(&input);

        let relative = input["output_path"].as_str().unwrap_or_default();
        let path = paths::confine(&self.base_dir, relative)
            .map_err(|e| CapabilityError::invalid_input("report.compose", e))?;
        paths::ensure_parent(&path)
            .map_err(|e| CapabilityError::execution_failed("report.compose", e))?;
        tokio::fs::write(&path, &markdown).await.map_err(|e| {
            CapabilityError::execution_failed(
                "report.compose",
                format!("cannot write '{}': {e}", path.display()),
            )
        })?;

        let written = path.to_string_lossy().to_string();
        Ok(CapabilityOutput::at(
            json!({"path": written, "bytes": markdown.len()}),
            written.clone(),
        ))
    }
}

fn compose(input: &Value) -> String {
    let title = input["title"].as_str().unwrap_or("Data Analysis Report");
    let dataset = input["dataset"].as_str().unwrap_or("(unknown dataset)");

    let mut md = String::new();
    let _ = writeln!(md, "# {title}\n");
    let _ = writeln!(md, "_Generated {} by datamill._\n", Utc::now().format("%Y-%m-%d %H:%M UTC"));

    let _ = writeln!(md, "## Executive Summary\n");
    let rows = input["overview"]["rows"].as_u64();
    let column_count = input["overview"]["columns"]
        .as_array()
        .map(Vec::len);
    match (rows, column_count) {
        (Some(rows), Some(cols)) => {
            let _ = writeln!(
                md,
                "Analysis of `{dataset}`: {rows} rows across {cols} columns. \
                 Descriptive statistics, correlations, and five charts follow.\n"
            );
        }
        _ => {
            let _ = writeln!(md, "Analysis of `{dataset}`.\n");
        }
    }

    let _ = writeln!(md, "## Data Overview\n");
    if let Some(columns) = input["overview"]["columns"].as_array() {
        let _ = writeln!(md, "| Column | Kind | Non-null | Nulls |");
        let _ = writeln!(md, "|---|---|---|---|");
        for column in columns {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                column["name"].as_str().unwrap_or("?"),
                column["kind"].as_str().unwrap_or("?"),
                column["count"].as_u64().unwrap_or(0),
                column["nulls"].as_u64().unwrap_or(0),
            );
        }
        let _ = writeln!(md);
    }

    let _ = writeln!(md, "## Statistical Insights\n");
    if let Some(columns) = input["statistics"]["columns"].as_array() {
        let numeric: Vec<&Value> = columns
            .iter()
            .filter(|c| c["kind"] == json!("numeric"))
            .collect();
        if numeric.is_empty() {
            let _ = writeln!(md, "No numeric columns found.\n");
        } else {
            let _ = writeln!(md, "| Column | Mean | Std | Median | Min | Max |");
            let _ = writeln!(md, "|---|---|---|---|---|---|");
            for column in numeric {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | {} | {} | {} |",
                    column["name"].as_str().unwrap_or("?"),
                    fmt_num(&column["mean"]),
                    fmt_num(&column["std"]),
                    fmt_num(&column["median"]),
                    fmt_num(&column["min"]),
                    fmt_num(&column["max"]),
                );
            }
            let _ = writeln!(md);
        }
    }

    if let (Some(names), Some(matrix)) = (
        input["correlations"]["columns"].as_array(),
        input["correlations"]["matrix"].as_array(),
    ) {
        if names.len() >= 2 {
            let _ = writeln!(md, "### Correlations\n");
            let header: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            let _ = writeln!(md, "| | {} |", header.join(" | "));
            let _ = writeln!(md, "|---|{}|", "---|".repeat(header.len()));
            for (name, row) in header.iter().zip(matrix) {
                let cells: Vec<String> = row
                    .as_array()
                    .map(|r| r.iter().map(fmt_num).collect())
                    .unwrap_or_default();
                let _ = writeln!(md, "| {name} | {} |", cells.join(" | "));
            }
            let _ = writeln!(md);
        }
    }

    let _ = writeln!(md, "## Visualizations\n");
    match input["charts"].as_array() {
        Some(charts) if !charts.is_empty() => {
            for chart in charts {
                let _ = writeln!(
                    md,
                    "- **{}** — `{}`",
                    chart["title"].as_str().unwrap_or("Chart"),
                    chart["path"].as_str().unwrap_or("?"),
                );
            }
            let _ = writeln!(md);
        }
        _ => {
            let _ = writeln!(md, "No charts were produced.\n");
        }
    }

    md
}

fn fmt_num(value: &Value) -> String {
    match value.as_f64() {
        Some(v) if v.abs() >= 1000.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.3}"),
        None => "—".to_string(),
    }
}
