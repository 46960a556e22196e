//! Database facade.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use rill_core::{Column, Result, Row, RowId, RowSchema, Value};
use rill_index::ColumnIndex;
use rill_query::{compile, LiveQuery};
use rill_storage::{Catalog, Table};
use rill_sync::{observe, EventEmitterTree, SyncMessage};

/// An in-memory reactive database: a catalog of tables plus the query
/// compiler and patch emitter wired over it.
#[derive(Default)]
pub struct Database {
    catalog: Catalog,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
        }
    }

    /// Returns the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Defines a table.
    pub fn define_table(&mut self, name: &str, columns: Vec<Column>) -> Result<Rc<RefCell<Table>>> {
        self.catalog.define(name, RowSchema::new(columns))
    }

    /// Looks up a table.
    pub fn table(&self, name: &str) -> Result<Rc<RefCell<Table>>> {
        self.catalog.get(name)
    }

    /// Creates (or returns) the index on `table.column`.
    pub fn index_on(&self, table: &str, column: &str) -> Result<Rc<RefCell<ColumnIndex>>> {
        self.catalog.get(table)?.borrow_mut().index_on(column)
    }

    /// Inserts a row.
    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<RowId> {
        self.catalog.get(table)?.borrow_mut().insert(values)
    }

    /// Removes every row of `table` whose `column` equals `value`.
    pub fn remove_where_eq(&self, table: &str, column: &str, value: &Value) -> Result<usize> {
        self.catalog
            .get(table)?
            .borrow_mut()
            .remove_where_eq(column, value)
    }

    /// Replaces every row of `table` whose `column` equals `value`.
    pub fn update_where_eq(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        new_values: Vec<Value>,
    ) -> Result<usize> {
        self.catalog
            .get(table)?
            .borrow_mut()
            .update_where_eq(column, value, new_values)
    }

    /// Compiles query text into a live query.
    pub fn query(&self, src: &str) -> Result<LiveQuery> {
        compile(src, &self.catalog)
    }

    /// Compiles query text and streams its patches to `on_message`,
    /// starting with the full-snapshot message.
    ///
    /// The returned live query keeps the graph alive; the emitter is held
    /// by its subscriptions.
    pub fn observe(
        &self,
        src: &str,
        on_message: impl Fn(&SyncMessage) + 'static,
    ) -> Result<(LiveQuery, Rc<EventEmitterTree>)> {
        let live = self.query(src)?;
        let emitter = observe(&live.observable(), on_message);
        Ok((live, emitter))
    }

    /// Returns the live rows of a table.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.catalog.get(table)?.borrow().live_rows())
    }
}
