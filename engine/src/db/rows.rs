//! Generic rows for structured queries
//!
//! Model-written SQL can project anything, so rows are decoded column by
//! column into display strings, keeping the order the statement defined.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// One result row as ordered `(column, value)` pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: Vec<(String, String)>,
}

impl SqlRow {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Build a row from a JSON object returned by the tool-call proxy
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                columns: map
                    .iter()
                    .map(|(k, v)| (k.clone(), json_display(v)))
                    .collect(),
            },
            other => Self {
                columns: vec![("value".to_string(), json_display(other))],
            },
        }
    }

    /// Decode every column of a Postgres row
    pub fn from_pg_row(row: &PgRow) -> Self {
        let columns = row
            .columns()
            .iter()
            .map(|col| {
                let idx = col.ordinal();
                (col.name().to_string(), decode_column(row, idx, col.type_info().name()))
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// Render as `key=value, key=value`
    pub fn render(&self) -> String {
        self.columns
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn json_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> String {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return "null".to_string(),
        Ok(_) => {}
        Err(e) => return format!("<error: {}>", e),
    }

    let decoded = match type_name {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<String, _>(idx)
        }
        "INT2" => row.try_get::<i16, _>(idx).map(|v| v.to_string()),
        "INT4" => row.try_get::<i32, _>(idx).map(|v| v.to_string()),
        "INT8" => row.try_get::<i64, _>(idx).map(|v| v.to_string()),
        "FLOAT4" => row.try_get::<f32, _>(idx).map(|v| v.to_string()),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(|v| v.to_string()),
        "NUMERIC" => row
            .try_get::<sqlx::types::Decimal, _>(idx)
            .map(|v| v.to_string()),
        "BOOL" => row.try_get::<bool, _>(idx).map(|v| v.to_string()),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(|v| v.to_string()),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .map(|v| v.to_rfc3339()),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(|v| v.to_string()),
        "JSON" | "JSONB" => row
            .try_get::<sqlx::types::JsonValue, _>(idx)
            .map(|v| v.to_string()),
        other => return format!("<{}>", other.to_lowercase()),
    };

    decoded.unwrap_or_else(|e| format!("<error: {}>", e))
}
