//! rill-core - Core types for the rill reactive query engine.
//!
//! This crate provides the foundational pieces shared by every layer:
//!
//! - `DataType`: the closed set of column types (String, Int, Bool, Observable)
//! - `Value`: a runtime cell value, including handles to nested reactive results
//! - `Row`: a row of values carrying its stable row id
//! - `Column` / `RowSchema`: ordered, positionally-addressed column metadata
//! - `Observable` / `Subscriber`: the event-bus interfaces every graph node
//!   implements, plus `link` to wire them together
//! - `Error`: error types for engine operations
//!
//! # Example
//!
//! ```rust
//! use rill_core::{Column, DataType, Row, RowSchema, Value};
//!
//! let schema = RowSchema::new(vec![
//!     Column::new("name", DataType::String),
//!     Column::new("age", DataType::Int),
//! ]);
//!
//! let row = Row::new(0, vec![Value::from("shmuli"), Value::from(22i64)]);
//!
//! assert_eq!(schema.position("age"), Some(1));
//! assert_eq!(row.get(1), Some(&Value::Int(22)));
//! ```

#![no_std]

extern crate alloc;

pub mod error;
pub mod observe;
pub mod row;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use observe::{link, Observable, ObservableRef, Subscriber, SubscriberRef, WeakObservable};
pub use row::{Row, RowId};
pub use schema::{Column, RowSchema};
pub use types::DataType;
pub use value::Value;
