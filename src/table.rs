//! Assembles flattened rows into an Arrow record batch.
//!
//! The output schema is not fixed up front: the column set is the union of
//! keys seen across all rows, in first-seen order, with nulls for rows that
//! lack a key. Each column becomes Float64 when every present value is a JSON
//! number, Utf8 otherwise. Two derived timestamp columns (`startTime_dt`,
//! `endTime_dt`) are appended when their string source columns exist.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::flatten::FlatRow;

/// Columns that get a derived `_dt` timestamp counterpart.
const TIMESTAMP_SOURCES: [&str; 2] = ["startTime", "endTime"];

/// Collects flattened rows and materializes them as a single record batch.
#[derive(Default)]
pub struct RowSet {
    rows: Vec<FlatRow>,
    columns: Vec<String>,
    seen: HashSet<String>,
}

impl RowSet {
    pub fn new() -> Self {
        RowSet::default()
    }

    /// Add one row, registering any columns it introduces.
    pub fn push(&mut self, row: FlatRow) {
        for key in row.keys() {
            if self.seen.insert(key.clone()) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Materialize all rows into one record batch, including the derived
    /// timestamp columns. Errors on zero rows.
    pub fn into_batch(self) -> Result<RecordBatch> {
        if self.rows.is_empty() {
            return Err(PipelineError::EmptyResult);
        }

        let mut fields = Vec::with_capacity(self.columns.len() + 2);
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len() + 2);

        for name in &self.columns {
            let (field, array) = build_column(&self.rows, name);
            fields.push(field);
            arrays.push(array);
        }

        for source in TIMESTAMP_SOURCES {
            if !self.seen.contains(source) {
                continue;
            }
            let array: TimestampMicrosecondArray = self
                .rows
                .iter()
                .map(|row| row.get(source).and_then(Value::as_str).and_then(parse_timestamp))
                .collect();
            fields.push(Field::new(
                format!("{source}_dt"),
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ));
            arrays.push(Arc::new(array));
        }

        let schema = Arc::new(Schema::new(fields));
        Ok(RecordBatch::try_new(schema, arrays)?)
    }
}

/// Build one column, inferring Float64 when every present value is a number.
fn build_column(rows: &[FlatRow], name: &str) -> (Field, ArrayRef) {
    if column_is_numeric(rows, name) {
        let array: Float64Array = rows
            .iter()
            .map(|row| row.get(name).and_then(Value::as_f64))
            .collect();
        (
            Field::new(name, DataType::Float64, true),
            Arc::new(array) as ArrayRef,
        )
    } else {
        let array: StringArray = rows
            .iter()
            .map(|row| {
                row.get(name)
                    .filter(|value| !value.is_null())
                    .map(render_text)
            })
            .collect();
        (Field::new(name, DataType::Utf8, true), Arc::new(array) as ArrayRef)
    }
}

fn column_is_numeric(rows: &[FlatRow], name: &str) -> bool {
    let mut any = false;
    for row in rows {
        match row.get(name) {
            Some(Value::Number(_)) => any = true,
            None | Some(Value::Null) => {}
            Some(_) => return false,
        }
    }
    any
}

/// Render a verbatim-copied value as column text.
fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an ISO-8601-ish timestamp into epoch microseconds.
///
/// Tries RFC 3339 first, then a naive fallback without an offset. Failures
/// yield `None`; the raw string column still carries the original text.
fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_micros());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc().timestamp_micros())
}
