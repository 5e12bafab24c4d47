//! Chart rendering capability.
//!
//! Renders SVG charts (histogram, bar, scatter, box plot) from a dataframe
//! handle to a file under the configured base directory. Column selection
//! defaults are deterministic: the first numeric or text column the chart
//! kind requires, or the nth via `column_index`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::frame::{Column, Frame, TabularStore};
use super::paths;
use super::stats;
use crate::domain::errors::CapabilityError;
use crate::domain::models::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
use crate::domain::ports::{Capability, CapabilityOutput};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 420.0;
const MARGIN: f64 = 50.0;

/// `chart.render`: render an SVG chart from a dataframe handle.
pub struct ChartRenderCapability {
    spec: CapabilitySpec,
    store: Arc<TabularStore>,
    base_dir: PathBuf,
}

impl ChartRenderCapability {
    pub fn new(store: Arc<TabularStore>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "chart.render",
                "Render a histogram, bar, scatter, or box chart to an SVG file",
                SideEffect::FilesystemWrite,
                InputSchema::new(vec![
                    SchemaField::required("handle", FieldKind::String),
                    SchemaField::required("kind", FieldKind::String),
                    SchemaField::required("output_path", FieldKind::String),
                    SchemaField::optional("title", FieldKind::String),
                    SchemaField::optional("x", FieldKind::String),
                    SchemaField::optional("y", FieldKind::String),
                    SchemaField::optional("column", FieldKind::String),
                    SchemaField::optional("column_index", FieldKind::Number),
                ]),
            ),
            store,
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl Capability for ChartRenderCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let handle = input["handle"].as_str().unwrap_or_default();
        let frame = self.store.get(handle).ok_or_else(|| {
            CapabilityError::execution_failed(
                "chart.render",
                format!("unknown dataframe handle '{handle}'"),
            )
        })?;

        let kind = input["kind"].as_str().unwrap_or_default();
        let title = input["title"].as_str().unwrap_or(kind).to_string();

        let svg = match kind {
            "histogram" => render_histogram(&frame, &input, &title),
            "bar" => render_bar(&frame, &input, &title),
            "scatter" => render_scatter(&frame, &input, &title),
            "box" => render_box(&frame, &input, &title),
            other => Err(format!("unsupported chart kind '{other}'")),
        }
        .map_err(|e| CapabilityError::invalid_input("chart.render", e))?;

        let relative = input["output_path"].as_str().unwrap_or_default();
        let path = paths::confine(&self.base_dir, relative)
            .map_err(|e| CapabilityError::invalid_input("chart.render", e))?;
        paths::ensure_parent(&path)
            .map_err(|e| CapabilityError::execution_failed("chart.render", e))?;
        tokio::fs::write(&path, svg).await.map_err(|e| {
            CapabilityError::execution_failed(
                "chart.render",
                format!("cannot write '{}': {e}", path.display()),
            )
        })?;

        let written = path.to_string_lossy().to_string();
        Ok(CapabilityOutput::at(
            json!({"path": written, "kind": kind, "title": title}),
            written.clone(),
        ))
    }
}

// ── Column selection ────────────────────────────────────────────────────

fn pick_numeric<'a>(frame: &'a Frame, input: &Value, key: &str, nth: usize) -> Result<&'a Column, String> {
    if let Some(name) = input[key].as_str() {
        let column = frame
            .column(name)
            .ok_or_else(|| format!("unknown column '{name}'"))?;
        if !column.is_numeric() {
            return Err(format!("column '{name}' is not numeric"));
        }
        return Ok(column);
    }
    let numeric = frame.numeric_columns();
    numeric
        .get(nth)
        .or_else(|| numeric.first())
        .copied()
        .ok_or_else(|| "frame has no numeric columns".to_string())
}

fn pick_text<'a>(frame: &'a Frame, input: &Value) -> Result<&'a Column, String> {
    if let Some(name) = input["column"].as_str() {
        return frame
            .column(name)
            .ok_or_else(|| format!("unknown column '{name}'"));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = input["column_index"].as_u64().unwrap_or(1).max(1) as usize - 1;
    let texts = frame.text_columns();
    texts
        .get(index)
        .or_else(|| texts.first())
        .copied()
        .ok_or_else(|| "frame has no text columns".to_string())
}

// ── Rendering ───────────────────────────────────────────────────────────

fn render_histogram(frame: &Frame, input: &Value, title: &str) -> Result<String, String> {
    let column = pick_numeric(frame, input, "x", 0)?;
    let values = column.numeric_values();
    let (min, max) = stats::min_max(&values).ok_or("column has no values")?;

    let bins = 10usize;
    let span = if max > min { max - min } else { 1.0 };
    let mut counts = vec![0usize; bins];
    for v in &values {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut bin = (((v - min) / span) * bins as f64) as usize;
        if bin >= bins {
            bin = bins - 1;
        }
        counts[bin] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    #[allow(clippy::cast_precision_loss)]
    let bar_w = plot_w / bins as f64;
    let mut body = String::new();
    for (i, count) in counts.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let h = plot_h * (*count as f64) / (peak as f64);
        #[allow(clippy::cast_precision_loss)]
        let x = MARGIN + i as f64 * bar_w;
        let y = HEIGHT - MARGIN - h;
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#4878a8\" stroke=\"white\"/>",
            x,
            y,
            bar_w,
            h
        ));
    }

    Ok(document(title, &column.name, "count", &body))
}

fn render_bar(frame: &Frame, input: &Value, title: &str) -> Result<String, String> {
    let column = pick_text(frame, input)?;
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for value in column.text_values() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    pairs.truncate(8);
    if pairs.is_empty() {
        return Err(format!("column '{}' has no values", column.name));
    }
    let peak = pairs.iter().map(|p| p.1).max().unwrap_or(1).max(1);

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    #[allow(clippy::cast_precision_loss)]
    let slot = plot_w / pairs.len() as f64;
    let bar_w = slot * 0.7;
    let mut body = String::new();
    for (i, (label, count)) in pairs.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let h = plot_h * (*count as f64) / (peak as f64);
        #[allow(clippy::cast_precision_loss)]
        let x = MARGIN + i as f64 * slot + (slot - bar_w) / 2.0;
        let y = HEIGHT - MARGIN - h;
        body.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#6aa05e\" stroke=\"white\"/>",
            x, y, bar_w, h
        ));
        body.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"middle\">{}</text>",
            x + bar_w / 2.0,
            HEIGHT - MARGIN + 14.0,
            escape(label)
        ));
    }

    Ok(document(title, &column.name, "count", &body))
}

fn render_scatter(frame: &Frame, input: &Value, title: &str) -> Result<String, String> {
    let x_col = pick_numeric(frame, input, "x", 0)?;
    let y_col = pick_numeric(frame, input, "y", 1)?;
    if x_col.name == y_col.name {
        return Err("scatter requires two distinct numeric columns".to_string());
    }

    let (super::frame::ColumnData::Numeric(xs), super::frame::ColumnData::Numeric(ys)) =
        (&x_col.data, &y_col.data)
    else {
        return Err("scatter columns must be numeric".to_string());
    };

    let points: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if points.is_empty() {
        return Err("no complete point pairs to plot".to_string());
    }

    let pxs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let pys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (x_min, x_max) = stats::min_max(&pxs).ok_or("no x values")?;
    let (y_min, y_max) = stats::min_max(&pys).ok_or("no y values")?;
    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
    let y_span = if y_max > y_min { y_max - y_min } else { 1.0 };

    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let mut body = String::new();
    for (x, y) in &points {
        let cx = MARGIN + plot_w * (x - x_min) / x_span;
        let cy = HEIGHT - MARGIN - plot_h * (y - y_min) / y_span;
        body.push_str(&format!(
            "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"3.5\" fill=\"#a85048\" fill-opacity=\"0.8\"/>"
        ));
    }

    Ok(document(title, &x_col.name, &y_col.name, &body))
}

fn render_box(frame: &Frame, input: &Value, title: &str) -> Result<String, String> {
    let column = pick_numeric(frame, input, "y", 1)?;
    let values = column.numeric_values();
    let (min, max) = stats::min_max(&values).ok_or("column has no values")?;
    let q1 = stats::percentile(&values, 0.25).ok_or("column has no values")?;
    let q2 = stats::median(&values).ok_or("column has no values")?;
    let q3 = stats::percentile(&values, 0.75).ok_or("column has no values")?;

    let plot_h = HEIGHT - 2.0 * MARGIN;
    let span = if max > min { max - min } else { 1.0 };
    let y_of = |v: f64| HEIGHT - MARGIN - plot_h * (v - min) / span;

    let cx = WIDTH / 2.0;
    let box_w = 120.0;
    let mut body = String::new();
    // Whiskers
    body.push_str(&format!(
        "<line x1=\"{cx}\" y1=\"{:.1}\" x2=\"{cx}\" y2=\"{:.1}\" stroke=\"#333\"/>",
        y_of(min),
        y_of(max)
    ));
    for v in [min, max] {
        body.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#333\"/>",
            cx - box_w / 4.0,
            cx + box_w / 4.0,
            y = y_of(v)
        ));
    }
    // Interquartile box and median line
    body.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{box_w}\" height=\"{:.1}\" fill=\"#c8b458\" stroke=\"#333\"/>",
        cx - box_w / 2.0,
        y_of(q3),
        (y_of(q1) - y_of(q3)).max(1.0)
    ));
    body.push_str(&format!(
        "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#333\" stroke-width=\"2\"/>",
        cx - box_w / 2.0,
        cx + box_w / 2.0,
        y = y_of(q2)
    ));

    Ok(document(title, "", &column.name, &body))
}

/// Shared SVG scaffold: background, axes, title, axis labels.
fn document(title: &str, x_label: &str, y_label: &str, body: &str) -> String {
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            "<rect width=\"{w}\" height=\"{h}\" fill=\"white\"/>",
            "<text x=\"{cx}\" y=\"24\" font-size=\"16\" text-anchor=\"middle\" font-weight=\"bold\">{title}</text>",
            "<line x1=\"{m}\" y1=\"{by}\" x2=\"{rx}\" y2=\"{by}\" stroke=\"#333\"/>",
            "<line x1=\"{m}\" y1=\"{m}\" x2=\"{m}\" y2=\"{by}\" stroke=\"#333\"/>",
            "<text x=\"{cx}\" y=\"{lx}\" font-size=\"12\" text-anchor=\"middle\">{x_label}</text>",
            "<text x=\"16\" y=\"{cy}\" font-size=\"12\" text-anchor=\"middle\" transform=\"rotate(-90 16 {cy})\">{y_label}</text>",
            "{body}",
            "</svg>"
        ),
        w = WIDTH,
        h = HEIGHT,
        m = MARGIN,
        cx = WIDTH / 2.0,
        cy = HEIGHT / 2.0,
        by = HEIGHT - MARGIN,
        rx = WIDTH - MARGIN,
        lx = HEIGHT - 12.0,
        title = escape(title),
        x_label = escape(x_label),
        y_label = escape(y_label),
        body = body
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
