//! rill-index - Index structures for the rill query engine.
//!
//! This crate provides:
//!
//! - `OrderedMap<V>`: an ordered int-keyed map used for index buckets and
//!   range scans
//! - `ColumnIndex`: a bucketed inverted map from a column's value to the
//!   ids of the rows holding it, maintained incrementally from its owning
//!   table's event stream
//!
//! # Example
//!
//! ```rust
//! use rill_index::OrderedMap;
//!
//! let mut map = OrderedMap::new();
//! map.insert(3, "c");
//! map.insert(1, "a");
//! map.insert(2, "b");
//!
//! let keys: Vec<i64> = map.range(1, 2).into_iter().map(|(k, _)| k).collect();
//! assert_eq!(keys, vec![1, 2]);
//! ```

#![no_std]

extern crate alloc;

pub mod column_index;
pub mod ordered;

pub use column_index::ColumnIndex;
pub use ordered::OrderedMap;
