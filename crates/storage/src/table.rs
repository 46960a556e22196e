//! Base table.
//!
//! Rows are appended; a row id is the slot position at insertion time and
//! outlives deletion (deleted slots are tombstoned, never reused, so ids
//! stay stable forever). Every mutation updates the table's indexes first
//! and then publishes to subscribers.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use rill_core::{
    Error, Observable, Result, Row, RowId, RowSchema, Subscriber, SubscriberRef, Value,
};
use rill_index::ColumnIndex;
use rill_reactive::SubscriberList;

/// A base table: schema, row slots, secondary indexes, subscribers.
pub struct Table {
    name: String,
    schema: Rc<RowSchema>,
    rows: Vec<Option<Row>>,
    indexes: Vec<Rc<RefCell<ColumnIndex>>>,
    subs: SubscriberList,
}

impl core::fmt::Debug for Table {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

impl Table {
    /// Creates an empty table.
    ///
    /// Base tables may only declare scalar column types.
    pub fn new(name: impl Into<String>, schema: RowSchema) -> Result<Self> {
        let name = name.into();
        for column in schema.columns() {
            if !column.data_type().is_storable() {
                return Err(Error::invalid_operation(alloc::format!(
                    "column {} of table {} declares a non-storable type",
                    column.name(),
                    name
                )));
            }
        }
        Ok(Self {
            name,
            schema: Rc::new(schema),
            rows: Vec::new(),
            indexes: Vec::new(),
            subs: SubscriberList::new(),
        })
    }

    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema.
    #[inline]
    pub fn schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    /// Returns the id the next inserted row will receive.
    #[inline]
    pub fn next_row_id(&self) -> RowId {
        self.rows.len() as RowId
    }

    /// Returns the number of live rows.
    pub fn live_len(&self) -> usize {
        self.rows.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns a clone of every live row, in id order.
    pub fn live_rows(&self) -> Vec<Row> {
        self.rows.iter().flatten().cloned().collect()
    }

    /// Returns the live row with the given id.
    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(id as usize).and_then(|slot| slot.as_ref())
    }

    /// Resolves a column name to its position.
    pub fn column_position(&self, column: &str) -> Result<usize> {
        self.schema
            .position(column)
            .ok_or_else(|| Error::column_not_found(&self.name, column))
    }

    fn validate(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.schema.len() {
            return Err(Error::arity_mismatch(
                &self.name,
                self.schema.len(),
                values.len(),
            ));
        }
        for (column, value) in self.schema.columns().iter().zip(values) {
            if value.data_type() != column.data_type() {
                return Err(Error::type_mismatch(
                    &self.name,
                    column.name(),
                    column.data_type(),
                    value.data_type(),
                ));
            }
        }
        Ok(())
    }

    /// Validates and appends a row, then publishes the add event.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<RowId> {
        self.validate(&values)?;
        let id = self.next_row_id();
        let row = Row::new(id, values);
        self.rows.push(Some(row.clone()));
        for index in &self.indexes {
            index.borrow_mut().on_add(&row);
        }
        self.subs.publish_add(&row);
        Ok(id)
    }

    /// Tombstones every live row whose `column` equals `value`.
    ///
    /// Returns the number of rows removed. Each removal publishes its own
    /// remove event.
    pub fn remove_where_eq(&mut self, column: &str, value: &Value) -> Result<usize> {
        let position = self.column_position(column)?;
        let matches: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.as_ref()
                    .map(|row| row.get(position) == Some(value))
                    .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect();

        for slot in &matches {
            let row = self.rows[*slot].take().expect("matched slot is live");
            for index in &self.indexes {
                index.borrow_mut().on_remove(&row);
            }
            self.subs.publish_remove(&row);
        }
        Ok(matches.len())
    }

    /// Replaces the values of every live row whose `column` equals `value`.
    ///
    /// Row ids are preserved. Returns the number of rows updated; each
    /// update publishes its own event.
    pub fn update_where_eq(
        &mut self,
        column: &str,
        value: &Value,
        new_values: Vec<Value>,
    ) -> Result<usize> {
        let position = self.column_position(column)?;
        self.validate(&new_values)?;
        let matches: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.as_ref()
                    .map(|row| row.get(position) == Some(value))
                    .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect();

        for slot in &matches {
            let old = self.rows[*slot].clone().expect("matched slot is live");
            let new = Row::new(old.id(), new_values.clone());
            self.rows[*slot] = Some(new.clone());
            for index in &self.indexes {
                index.borrow_mut().on_update(&old, &new);
            }
            self.subs.publish_update(&old, &new);
        }
        Ok(matches.len())
    }

    /// Returns the index on `column`, creating it on demand.
    ///
    /// A fresh index is backfilled from the current live rows. Idempotent:
    /// asking twice returns the same index.
    pub fn index_on(&mut self, column: &str) -> Result<Rc<RefCell<ColumnIndex>>> {
        let position = self.column_position(column)?;
        let data_type = self.schema.get(position).expect("resolved position").data_type();
        if !data_type.is_indexable() {
            return Err(Error::not_indexable(&self.name, column));
        }
        if let Some(existing) = self.index_for(position) {
            return Ok(existing);
        }

        let index = Rc::new(RefCell::new(ColumnIndex::new(position)));
        {
            let mut index = index.borrow_mut();
            for slot in self.rows.iter().flatten() {
                index.on_add(slot);
            }
        }
        self.indexes.push(Rc::clone(&index));
        Ok(index)
    }

    /// Returns the index on the given column position, if one exists.
    pub fn index_for(&self, position: usize) -> Option<Rc<RefCell<ColumnIndex>>> {
        self.indexes
            .iter()
            .find(|index| index.borrow().column() == position)
            .map(Rc::clone)
    }

    /// Returns true if `column` has an index.
    pub fn has_index(&self, column: &str) -> bool {
        self.schema
            .position(column)
            .and_then(|position| self.index_for(position))
            .is_some()
    }
}

impl Observable for Table {
    fn row_schema(&self) -> Rc<RowSchema> {
        self.schema()
    }

    fn snapshot(&mut self) -> Vec<Row> {
        self.live_rows()
    }

    fn add_sub(&mut self, sub: SubscriberRef) {
        self.subs.add(sub);
    }

    fn remove_sub(&mut self, sub: &SubscriberRef) -> bool {
        self.subs.remove(sub)
    }
}
