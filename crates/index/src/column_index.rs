//! Column index.
//!
//! A bucketed inverted map over one column of a table: each distinct value
//! maps to the ordered set of row ids currently holding it. The index is a
//! subscriber of its owning table and is kept consistent inside every
//! mutation, before the table's other subscribers observe the event.

use crate::ordered::OrderedMap;
use alloc::vec::Vec;
use hashbrown::HashMap;
use rill_core::{Row, RowId, Subscriber, Value, WeakObservable};

/// An inverted map from a column's value to the row ids holding it.
///
/// Row ids within a bucket are ordered by insertion time, which for base
/// tables is ascending id order.
pub struct ColumnIndex {
    /// Position of the indexed column in the table schema.
    column: usize,
    /// Value -> ordered set of row ids.
    buckets: HashMap<Value, OrderedMap<()>>,
    upstream: Option<WeakObservable>,
}

impl ColumnIndex {
    /// Creates an index over the given column position.
    pub fn new(column: usize) -> Self {
        Self {
            column,
            buckets: HashMap::new(),
            upstream: None,
        }
    }

    /// Returns the indexed column position.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Returns the row ids holding `value`, in insertion order.
    ///
    /// An absent key yields an empty sequence.
    pub fn probe(&self, value: &Value) -> Vec<RowId> {
        match self.buckets.get(value) {
            Some(bucket) => bucket.keys().into_iter().map(|k| k as RowId).collect(),
            None => Vec::new(),
        }
    }

    /// Returns true if any row holds `value`.
    pub fn contains(&self, value: &Value) -> bool {
        self.buckets.contains_key(value)
    }

    /// Returns the number of distinct values in the index.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn insert_id(&mut self, value: Value, id: RowId) {
        self.buckets
            .entry(value)
            .or_insert_with(OrderedMap::new)
            .insert(id as i64, ());
    }

    fn remove_id(&mut self, value: &Value, id: RowId) {
        if let Some(bucket) = self.buckets.get_mut(value) {
            bucket.remove(id as i64);
            if bucket.is_empty() {
                self.buckets.remove(value);
            }
        }
    }
}

impl Subscriber for ColumnIndex {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        if let Some(value) = row.get(self.column) {
            self.insert_id(value.clone(), row.id());
        }
    }

    fn on_remove(&mut self, row: &Row) {
        if let Some(value) = row.get(self.column) {
            self.remove_id(value, row.id());
        }
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        let (old_value, new_value) = match (old.get(self.column), new.get(self.column)) {
            (Some(o), Some(n)) => (o, n),
            _ => return,
        };
        if old_value == new_value {
            return;
        }
        self.remove_id(old_value, old.id());
        self.insert_id(new_value.clone(), new.id());
    }
}
