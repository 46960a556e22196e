//! rill-sync - Patch emission for the rill query engine.
//!
//! `EventEmitterTree` subscribes to a (possibly nested) observable query
//! result and flattens its add/remove/update events into `SyncMessage`
//! patches, each scoped by a slash-delimited path of primary keys and
//! column names. Row payloads are encoded as JSON objects keyed by column
//! name, with nested observables encoded as arrays.
//!
//! A transport (out of scope here) forwards the messages to clients and
//! stamps their timestamps.

#![no_std]

extern crate alloc;

pub mod emitter;
pub mod json;
pub mod message;

pub use emitter::{observe, EventEmitterTree};
pub use json::{row_to_json, rows_to_json};
pub use message::{SyncKind, SyncMessage};
