//! Patch messages.

use crate::json::escape_into;
use alloc::string::String;
use core::fmt::Write;

/// The kind of a patch message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncKind {
    Add,
    Remove,
    Update,
    /// Full snapshot sent once so clients start from a known baseline.
    Initial,
}

impl SyncKind {
    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Add => "add",
            SyncKind::Remove => "remove",
            SyncKind::Update => "update",
            SyncKind::Initial => "initial",
        }
    }
}

/// One delta to the client-visible state.
///
/// `data` is already-encoded JSON; `path` addresses the affected row by
/// primary keys and column names. The timestamp is stamped by the
/// transport, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncMessage {
    pub kind: SyncKind,
    pub data: String,
    pub path: String,
    pub timestamp: Option<i64>,
}

impl SyncMessage {
    /// Creates an unstamped message.
    pub fn new(kind: SyncKind, data: String, path: String) -> Self {
        Self {
            kind,
            data,
            path,
            timestamp: None,
        }
    }

    /// Renders the wire shape, splicing the data payload verbatim.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        out.push_str("{\"Type\":\"");
        out.push_str(self.kind.as_str());
        out.push_str("\",\"Data\":");
        out.push_str(&self.data);
        out.push_str(",\"Path\":\"");
        escape_into(&self.path, &mut out);
        out.push_str("\",\"Timestamp\":");
        match self.timestamp {
            Some(ts) => {
                let _ = write!(out, "{}", ts);
            }
            None => out.push_str("null"),
        }
        out.push('}');
        out
    }
}
