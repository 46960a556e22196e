//! JSON row encoder.
//!
//! Encodes rows as JSON objects keyed by column name, in schema order, so
//! the encoding is deterministic. Nested observables encode as the array
//! of their current rows.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;
use rill_core::{Observable, ObservableRef, Row, RowSchema, Value};

pub(crate) fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

fn value_into(value: &Value, out: &mut String) {
    match value {
        Value::Str(s) => {
            out.push('"');
            escape_into(s, out);
            out.push('"');
        }
        Value::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Observable(obs) => rows_into(obs, out),
    }
}

fn row_into(row: &Row, schema: &RowSchema, out: &mut String) {
    out.push('{');
    for (position, value) in row.values().iter().enumerate() {
        if position > 0 {
            out.push(',');
        }
        out.push('"');
        match schema.get(position) {
            Some(column) => escape_into(column.name(), out),
            None => {
                let _ = write!(out, "{}", position);
            }
        }
        out.push_str("\":");
        value_into(value, out);
    }
    out.push('}');
}

fn rows_into(obs: &ObservableRef, out: &mut String) {
    let schema = obs.borrow().row_schema();
    let rows: Vec<Row> = obs.borrow_mut().snapshot();
    out.push('[');
    for (position, row) in rows.iter().enumerate() {
        if position > 0 {
            out.push(',');
        }
        row_into(row, &schema, out);
    }
    out.push(']');
}

/// Encodes one row as a JSON object keyed by column name.
pub fn row_to_json(row: &Row, schema: &RowSchema) -> String {
    let mut out = String::new();
    row_into(row, schema, &mut out);
    out
}

/// Encodes the current rows of an observable as a JSON array.
pub fn rows_to_json(obs: &ObservableRef) -> String {
    let mut out = String::new();
    rows_into(obs, &mut out);
    out
}
