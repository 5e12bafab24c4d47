//! Tabular operation capabilities: describe, correlate, value counts.
//!
//! All operations address frames by handle name in the shared tabular
//! store. Nothing here mutates a frame.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::frame::{Column, Frame, TabularStore};
use super::stats;
use crate::domain::errors::CapabilityError;
use crate::domain::models::{CapabilitySpec, FieldKind, InputSchema, SchemaField, SideEffect};
use crate::domain::ports::{Capability, CapabilityOutput};

fn resolve_frame(
    store: &TabularStore,
    capability: &str,
    input: &Value,
) -> Result<Arc<Frame>, CapabilityError> {
    let handle = input["handle"].as_str().unwrap_or_default();
    store.get(handle).ok_or_else(|| {
        CapabilityError::execution_failed(capability, format!("unknown dataframe handle '{handle}'"))
    })
}

/// `table.describe`: per-column statistics.
pub struct DescribeCapability {
    spec: CapabilitySpec,
    store: Arc<TabularStore>,
}

impl DescribeCapability {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "table.describe",
                "Per-column statistics for a dataframe handle",
                SideEffect::Pure,
                InputSchema::new(vec![SchemaField::required("handle", FieldKind::String)]),
            ),
            store,
        }
    }
}

#[async_trait]
impl Capability for DescribeCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let frame = resolve_frame(&self.store, "table.describe", &input)?;
        let columns: Vec<Value> = frame.columns.iter().map(describe_column).collect();
        Ok(CapabilityOutput::inline(json!({
            "handle": input["handle"],
            "rows": frame.rows,
            "columns": columns,
        })))
    }
}

fn describe_column(column: &Column) -> Value {
    let base = json!({
        "name": column.name,
        "kind": column.kind_str(),
        "count": column.len() - column.null_count(),
        "nulls": column.null_count(),
    });
    let mut value = base;
    if column.is_numeric() {
        let numbers = column.numeric_values();
        let (min, max) = stats::min_max(&numbers).unwrap_or((f64::NAN, f64::NAN));
        value["mean"] = stats::mean(&numbers).map_or(Value::Null, into_number);
        value["std"] = stats::std_dev(&numbers).map_or(Value::Null, into_number);
        value["median"] = stats::median(&numbers).map_or(Value::Null, into_number);
        value["min"] = if min.is_nan() { Value::Null } else { into_number(min) };
        value["max"] = if max.is_nan() { Value::Null } else { into_number(max) };
    } else {
        let texts = column.text_values();
        let distinct: std::collections::HashSet<&str> = texts.iter().copied().collect();
        value["distinct"] = json!(distinct.len());
    }
    value
}

fn into_number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// `table.correlate`: Pearson correlation matrix over numeric columns.
pub struct CorrelateCapability {
    spec: CapabilitySpec,
    store: Arc<TabularStore>,
}

impl CorrelateCapability {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "table.correlate",
                "Pearson correlation matrix over numeric columns",
                SideEffect::Pure,
                InputSchema::new(vec![SchemaField::required("handle", FieldKind::String)]),
            ),
            store,
        }
    }
}

#[async_trait]
impl Capability for CorrelateCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let frame = resolve_frame(&self.store, "table.correlate", &input)?;
        let numeric = frame.numeric_columns();
        let names: Vec<&str> = numeric.iter().map(|c| c.name.as_str()).collect();

        // Pairwise over rows where both cells are present.
        let mut matrix = Vec::with_capacity(numeric.len());
        for &a in &numeric {
            let mut row = Vec::with_capacity(numeric.len());
            for &b in &numeric {
                row.push(pairwise_pearson(a, b).map_or(Value::Null, into_number));
            }
            matrix.push(Value::Array(row));
        }

        Ok(CapabilityOutput::inline(json!({
            "handle": input["handle"],
            "columns": names,
            "matrix": matrix,
        })))
    }
}

fn pairwise_pearson(a: &Column, b: &Column) -> Option<f64> {
    let (super::frame::ColumnData::Numeric(xs), super::frame::ColumnData::Numeric(ys)) =
        (&a.data, &b.data)
    else {
        return None;
    };
    let mut px = Vec::new();
    let mut py = Vec::new();
    for (x, y) in xs.iter().zip(ys) {
        if let (Some(x), Some(y)) = (x, y) {
            px.push(*x);
            py.push(*y);
        }
    }
    if std::ptr::eq(a, b) {
        // Self-correlation is 1 whenever the column has any spread at all.
        return stats::pearson(&px, &py).map(|_| 1.0);
    }
    stats::pearson(&px, &py)
}

/// `table.value_counts`: value frequencies for a text column.
pub struct ValueCountsCapability {
    spec: CapabilitySpec,
    store: Arc<TabularStore>,
}

impl ValueCountsCapability {
    pub fn new(store: Arc<TabularStore>) -> Self {
        Self {
            spec: CapabilitySpec::new(
                "table.value_counts",
                "Value frequencies for a text column",
                SideEffect::Pure,
                InputSchema::new(vec![
                    SchemaField::required("handle", FieldKind::String),
                    SchemaField::optional("column", FieldKind::String),
                    SchemaField::optional("limit", FieldKind::Number),
                ]),
            ),
            store,
        }
    }
}

#[async_trait]
impl Capability for ValueCountsCapability {
    fn spec(&self) -> &CapabilitySpec {
        &self.spec
    }

    async fn invoke(&self, input: Value) -> Result<CapabilityOutput, CapabilityError> {
        let frame = resolve_frame(&self.store, "table.value_counts", &input)?;

        let column = match input["column"].as_str() {
            Some(name) => frame.column(name).ok_or_else(|| {
                CapabilityError::invalid_input(
                    "table.value_counts",
                    format!("unknown column '{name}'"),
                )
            })?,
            None => *frame.text_columns().first().ok_or_else(|| {
                CapabilityError::execution_failed(
                    "table.value_counts",
                    "frame has no text columns",
                )
            })?,
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let limit = input["limit"].as_u64().unwrap_or(10) as usize;
        let counts = value_counts(column, limit);

        Ok(CapabilityOutput::inline(json!({
            "handle": input["handle"],
            "column": column.name,
            "counts": counts,
        })))
    }
}

fn value_counts(column: &Column, limit: usize) -> Vec<Value> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in column.text_values() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    // Descending by count, ties by name for determinism.
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    pairs
        .into_iter()
        .take(limit)
        .map(|(value, count)| json!({"value": value, "count": count}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "name,price,km,fuel\n\
        Swift,350000,70000,Petrol\n\
        City,585000,40000,Diesel\n\
        Verna,600000,45000,Diesel\n\
        Alto,180000,95000,Petrol\n\
        i20,450000,30000,Diesel\n";

    fn store_with_frame() -> Arc<TabularStore> {
        let store = Arc::new(TabularStore::new());
        store.insert("frame", Frame::parse_csv(CSV).unwrap());
        store
    }

    #[tokio::test]
    async fn test_describe_reports_numeric_and_text_columns() {
        let cap = DescribeCapability::new(store_with_frame());
        let output = cap.invoke(json!({"handle": "frame"})).await.unwrap();

        let columns = output.payload["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 4);

        let price = columns.iter().find(|c| c["name"] == "price").unwrap();
        assert_eq!(price["kind"], "numeric");
        assert_eq!(price["min"], json!(180_000.0));
        assert_eq!(price["max"], json!(600_000.0));
        assert_eq!(price["count"], json!(5));

        let fuel = columns.iter().find(|c| c["name"] == "fuel").unwrap();
        assert_eq!(fuel["kind"], "text");
        assert_eq!(fuel["distinct"], json!(2));
    }

    #[tokio::test]
    async fn test_describe_unknown_handle_fails() {
        let cap = DescribeCapability::new(Arc::new(TabularStore::new()));
        let err = cap.invoke(json!({"handle": "missing"})).await.unwrap_err();
        assert!(matches!(err, CapabilityError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn test_correlate_matrix_shape_and_diagonal() {
        let cap = CorrelateCapability::new(store_with_frame());
        let output = cap.invoke(json!({"handle": "frame"})).await.unwrap();

        let columns = output.payload["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 2); // price, km
        let matrix = output.payload["matrix"].as_array().unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0][0], json!(1.0));
        assert_eq!(matrix[1][1], json!(1.0));
        // Price and km move in opposite directions in the fixture.
        assert!(matrix[0][1].as_f64().unwrap() < 0.0);
    }

    #[tokio::test]
    async fn test_value_counts_defaults_to_first_text_column() {
        let cap = ValueCountsCapability::new(store_with_frame());
        let output = cap
            .invoke(json!({"handle": "frame", "column": "fuel"}))
            .await
            .unwrap();

        let counts = output.payload["counts"].as_array().unwrap();
        assert_eq!(counts[0]["value"], json!("Diesel"));
        assert_eq!(counts[0]["count"], json!(3));
        assert_eq!(counts[1]["value"], json!("Petrol"));
        assert_eq!(counts[1]["count"], json!(2));
    }

    #[tokio::test]
    async fn test_value_counts_unknown_column_is_invalid_input() {
        let cap = ValueCountsCapability::new(store_with_frame());
        let err = cap
            .invoke(json!({"handle": "frame", "column": "bogus"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput { .. }));
    }
}
