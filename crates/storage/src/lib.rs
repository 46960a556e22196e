//! rill-storage - Base tables for the rill query engine.
//!
//! A `Table` owns its rows, maintains secondary `ColumnIndex`es, and acts
//! as the observable source every query graph hangs off. Mutations deliver
//! to the table's indexes before any other subscriber, so operators that
//! probe an index while handling an event always see a consistent index.
//!
//! The `Catalog` is the owned registry of tables, created at startup and
//! passed explicitly to the planner.

#![no_std]

extern crate alloc;

pub mod catalog;
pub mod table;

pub use catalog::Catalog;
pub use table::Table;
