//! Index-backed equality operator.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use rill_core::{Observable, Row, RowSchema, Subscriber, SubscriberRef, Value, WeakObservable};
use rill_index::ColumnIndex;
use rill_reactive::SubscriberList;
use rill_storage::Table;

/// Emits the rows whose indexed column equals a fixed key.
///
/// The operator subscribes to the table whose index it probes. Tables
/// update their indexes before publishing, so the probe performed while
/// handling an add already sees the new row. On the remove side the bucket
/// has already dropped the id, so membership is decided on the column
/// value instead.
pub struct IndexedEqLookup {
    schema: Rc<RowSchema>,
    index: Rc<RefCell<ColumnIndex>>,
    table: Weak<RefCell<Table>>,
    column: usize,
    key: Value,
    subs: SubscriberList,
    upstream: Option<WeakObservable>,
}

impl IndexedEqLookup {
    /// Creates a lookup over `table`'s index for `column == key`.
    pub fn new(
        schema: Rc<RowSchema>,
        index: Rc<RefCell<ColumnIndex>>,
        table: &Rc<RefCell<Table>>,
        column: usize,
        key: Value,
    ) -> Self {
        Self {
            schema,
            index,
            table: Rc::downgrade(table),
            column,
            key,
            subs: SubscriberList::new(),
            upstream: None,
        }
    }

    /// Returns the lookup key.
    #[inline]
    pub fn key(&self) -> &Value {
        &self.key
    }

    fn probed(&self, id: u64) -> bool {
        self.index.borrow().probe(&self.key).contains(&id)
    }

    fn key_matches(&self, row: &Row) -> bool {
        row.get(self.column) == Some(&self.key)
    }
}

impl Subscriber for IndexedEqLookup {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        if self.probed(row.id()) {
            self.subs.publish_add(row);
        }
    }

    fn on_remove(&mut self, row: &Row) {
        if self.key_matches(row) {
            self.subs.publish_remove(row);
        }
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        let was_hit = self.key_matches(old);
        let is_hit = self.probed(new.id());
        match (was_hit, is_hit) {
            (false, false) => {}
            (true, true) => self.subs.publish_update(old, new),
            (false, true) => self.subs.publish_add(new),
            (true, false) => self.subs.publish_remove(old),
        }
    }
}

impl Observable for IndexedEqLookup {
    fn row_schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    fn snapshot(&mut self) -> Vec<Row> {
        let table = match self.table.upgrade() {
            Some(table) => table,
            None => return Vec::new(),
        };
        let ids = self.index.borrow().probe(&self.key);
        let table = table.borrow();
        ids.into_iter()
            .filter_map(|id| table.get(id).cloned())
            .collect()
    }

    fn add_sub(&mut self, sub: SubscriberRef) {
        self.subs.add(sub);
    }

    fn remove_sub(&mut self, sub: &SubscriberRef) -> bool {
        self.subs.remove(sub)
    }
}
