//! Table catalog.
//!
//! The owned registry of base tables, keyed by name. One catalog is created
//! at startup and handed explicitly to the planner and the runtime; there
//! is no global state.

use crate::table::Table;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use rill_core::{Error, Result, RowSchema};

/// A name-ordered registry of tables.
#[derive(Default)]
pub struct Catalog {
    tables: BTreeMap<String, Rc<RefCell<Table>>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    /// Creates and registers a table.
    pub fn define(&mut self, name: &str, schema: RowSchema) -> Result<Rc<RefCell<Table>>> {
        if self.tables.contains_key(name) {
            return Err(Error::duplicate_table(name));
        }
        let table = Rc::new(RefCell::new(Table::new(name, schema)?));
        self.tables.insert(name.to_string(), Rc::clone(&table));
        Ok(table)
    }

    /// Looks up a table by name.
    ///
    /// An absent name is an error: every lookup comes from planning or a
    /// mutation path that should have defined the table first.
    pub fn get(&self, name: &str) -> Result<Rc<RefCell<Table>>> {
        self.tables
            .get(name)
            .map(Rc::clone)
            .ok_or_else(|| Error::table_not_found(name))
    }

    /// Returns true if a table with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the registered table names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(|k| k.as_str()).collect()
    }

    /// Returns the number of registered tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
