//! rill-database - Top-level facade for the rill query engine.
//!
//! `Database` owns the table catalog and wires the layers together: define
//! tables, mutate them, compile `SELECT` text into live queries, and attach
//! patch emitters for transports.
//!
//! # Example
//!
//! ```ignore
//! use rill_core::{Column, DataType, Value};
//! use rill_database::Database;
//!
//! let mut db = Database::new();
//! db.define_table("person", vec![
//!     Column::new("name", DataType::String),
//!     Column::new("age", DataType::Int),
//! ])?;
//!
//! let live = db.query("SELECT person.name FROM person WHERE person.age >= 3")?;
//! db.insert("person", vec![Value::from("shmuli"), Value::Int(22)])?;
//! assert_eq!(live.snapshot().len(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod database;

pub use database::Database;
pub use rill_query::LiveQuery;
pub use rill_sync::{SyncKind, SyncMessage};
