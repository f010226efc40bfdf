//! Driver cell values and their JSON rendering.
//!
//! Drivers decode each column into a [`Cell`]; [`cell_to_json`] turns it into a
//! JSON value. Timestamps become ISO-8601 strings, decimals become the nearest
//! `f64`, and anything without a JSON mapping becomes `null`. Conversion never fails.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

/// One decoded column value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Json(Value),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Decimal(Decimal),
    /// Column type with no JSON mapping (dates, times, binary, ...); carries the type name.
    Unsupported(String),
}

/// A result row: column name -> JSON value.
pub type Row = Map<String, Value>;

pub fn cell_to_json(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Bool(b),
        Cell::Int(n) => Value::Number(n.into()),
        Cell::UInt(n) => Value::Number(n.into()),
        Cell::Float(f) => float_to_json(f),
        Cell::Text(s) => Value::String(s),
        Cell::Json(v) => v,
        Cell::Timestamp(ts) => Value::String(iso_8601(&ts)),
        Cell::TimestampTz(ts) => Value::String(format!("{}+00:00", iso_8601(&ts.naive_utc()))),
        Cell::Decimal(d) => d.to_f64().map(float_to_json).unwrap_or(Value::Null),
        Cell::Unsupported(_) => Value::Null,
    }
}

/// `YYYY-MM-DDTHH:MM:SS`, plus a six-digit fraction when there are sub-second microseconds.
fn iso_8601(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() / 1_000 == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn float_to_json(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Collect `(column, cell)` pairs into a row.
pub fn row_from_cells<I>(cells: I) -> Row
where
    I: IntoIterator<Item = (String, Cell)>,
{
    cells
        .into_iter()
        .map(|(name, cell)| (name, cell_to_json(cell)))
        .collect()
}
