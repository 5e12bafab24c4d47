//! In-process tabular frames.
//!
//! A frame is the engine's dataframe: typed columns parsed from a CSV file,
//! addressed by a handle name in the tabular store. Frames are immutable
//! once loaded; re-deriving data registers a new artifact rather than
//! mutating a frame in place.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Column payload: numeric when every non-empty cell parses as a number,
/// text otherwise. Empty cells are nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// One named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn kind_str(&self) -> &'static str {
        match self.data {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    /// Non-null numeric values; empty for text columns.
    pub fn numeric_values(&self) -> Vec<f64> {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().copied().flatten().collect(),
            ColumnData::Text(_) => Vec::new(),
        }
    }

    /// Non-null text values; empty for numeric columns.
    pub fn text_values(&self) -> Vec<&str> {
        match &self.data {
            ColumnData::Text(v) => v.iter().filter_map(|c| c.as_deref()).collect(),
            ColumnData::Numeric(_) => Vec::new(),
        }
    }
}

/// An immutable table of typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub columns: Vec<Column>,
    pub rows: usize,
}

impl Frame {
    /// Parse CSV text into a frame.
    ///
    /// The first record is the header. Quoted fields with doubled-quote
    /// escapes and CRLF line endings are handled; ragged records are an
    /// error.
    pub fn parse_csv(text: &str) -> Result<Self, String> {
        let records = parse_records(text);
        let mut records = records.into_iter();
        let header = records.next().ok_or_else(|| "empty CSV".to_string())?;
        if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
            return Err("CSV header is empty".to_string());
        }

        let width = header.len();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); width];
        let mut rows = 0usize;
        for (line, record) in records.enumerate() {
            // Trailing blank line produced by a final newline.
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() != width {
                return Err(format!(
                    "record {} has {} fields, expected {}",
                    line + 2,
                    record.len(),
                    width
                ));
            }
            for (i, value) in record.into_iter().enumerate() {
                cells[i].push(value);
            }
            rows += 1;
        }

        let columns = header
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column {
                name: name.trim().to_string(),
                data: infer_column(values),
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    pub fn text_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| !c.is_numeric()).collect()
    }
}

/// Infer column typing: numeric when every non-empty cell parses as f64 and
/// at least one cell is non-empty.
fn infer_column(values: Vec<String>) -> ColumnData {
    let mut any_value = false;
    let all_numeric = values.iter().all(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            true
        } else {
            any_value = true;
            trimmed.parse::<f64>().is_ok()
        }
    });

    if all_numeric && any_value {
        ColumnData::Numeric(
            values
                .into_iter()
                .map(|v| {
                    let trimmed = v.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        trimmed.parse::<f64>().ok()
                    }
                })
                .collect(),
        )
    } else {
        ColumnData::Text(
            values
                .into_iter()
                .map(|v| {
                    let trimmed = v.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect(),
        )
    }
}

/// Split CSV text into records of fields, honoring quotes.
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                other => field.push(other),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {}
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                other => field.push(other),
            }
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

/// Process-wide store of named frames.
///
/// Shared by the capabilities that create and read dataframe handles.
/// Access is sequential in practice (one capability invocation at a time),
/// so a plain `RwLock` suffices.
#[derive(Debug, Default)]
pub struct TabularStore {
    frames: RwLock<HashMap<String, Arc<Frame>>>,
}

impl TabularStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: impl Into<String>, frame: Frame) {
        if let Ok(mut frames) = self.frames.write() {
            frames.insert(handle.into(), Arc::new(frame));
        }
    }

    pub fn get(&self, handle: &str) -> Option<Arc<Frame>> {
        self.frames.read().ok().and_then(|f| f.get(handle).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "name,price,fuel\nSwift,350000,Petrol\nCity,585000,Diesel\nVerna,,Diesel\n";

    #[test]
    fn test_parse_basic_csv() {
        let frame = Frame::parse_csv(CSV).unwrap();
        assert_eq!(frame.rows, 3);
        assert_eq!(frame.columns.len(), 3);
        assert!(frame.column("price").unwrap().is_numeric());
        assert!(!frame.column("name").unwrap().is_numeric());
    }

    #[test]
    fn test_empty_cells_are_nulls() {
        let frame = Frame::parse_csv(CSV).unwrap();
        let price = frame.column("price").unwrap();
        assert_eq!(price.null_count(), 1);
        assert_eq!(price.numeric_values(), vec![350_000.0, 585_000.0]);
    }

    #[test]
    fn test_quoted_fields_and_escapes() {
        let csv = "label,value\n\"a, b\",1\n\"say \"\"hi\"\"\",2\n";
        let frame = Frame::parse_csv(csv).unwrap();
        let label = frame.column("label").unwrap();
        assert_eq!(label.text_values(), vec!["a, b", "say \"hi\""]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = "a,b\r\n1,2\r\n3,4\r\n";
        let frame = Frame::parse_csv(csv).unwrap();
        assert_eq!(frame.rows, 2);
        assert!(frame.column("a").unwrap().is_numeric());
    }

    #[test]
    fn test_ragged_record_is_an_error() {
        let csv = "a,b\n1,2\n3\n";
        let err = Frame::parse_csv(csv).unwrap_err();
        assert!(err.contains("record 3"));
    }

    #[test]
    fn test_empty_csv_is_an_error() {
        assert!(Frame::parse_csv("").is_err());
    }

    #[test]
    fn test_all_empty_column_is_text() {
        let csv = "a,b\n1,\n2,\n";
        let frame = Frame::parse_csv(csv).unwrap();
        // No non-empty cell in "b": treated as text, all nulls.
        let b = frame.column("b").unwrap();
        assert!(!b.is_numeric());
        assert_eq!(b.null_count(), 2);
    }

    #[test]
    fn test_store_round_trip() {
        let store = TabularStore::new();
        let frame = Frame::parse_csv(CSV).unwrap();
        store.insert("frame", frame.clone());
        let loaded = store.get("frame").unwrap();
        assert_eq!(*loaded, frame);
        assert!(store.get("missing").is_none());
    }
}
