//! Correlated subquery operator.
//!
//! The planner lowers a nested select into a `SubqueryTemplate`: the
//! resolved pieces of the child plan with its correlation points left
//! open. `CorrelatedSubquery` stamps the template out once per outer row,
//! binding the open points to that row's values, and appends a handle to
//! the child observable to the row flowing downstream.
//!
//! A child instance lives exactly as long as its outer row: the guard
//! inside each instance unsubscribes the child plan from its base table
//! when the instance is dropped, so teardown cascades through nested
//! levels.

use crate::ast::CmpOp;
use crate::operators::filter::{Filter, Operand, Predicate};
use crate::operators::lookup::IndexedEqLookup;
use crate::operators::mapper::{Mapper, RowTransform};
use crate::operators::upstream_rows;
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;
use rill_core::{
    link, Observable, ObservableRef, Row, RowId, RowSchema, Subscriber, SubscriberRef, Value,
    WeakObservable,
};
use rill_index::ColumnIndex;
use rill_reactive::SubscriberList;
use rill_storage::Table;

/// A value resolved at instantiation time: either a literal from the query
/// text or a column of the outer row.
#[derive(Clone, Debug)]
pub enum BoundValue {
    Literal(Value),
    Outer(usize),
}

impl BoundValue {
    fn resolve(&self, outer: Option<&Row>) -> Value {
        match self {
            BoundValue::Literal(value) => value.clone(),
            BoundValue::Outer(position) => outer
                .and_then(|row| row.get(*position))
                .cloned()
                .unwrap_or_else(|| panic!("correlated binding requires an outer row")),
        }
    }
}

/// One side of a templated predicate.
#[derive(Clone, Debug)]
pub enum BoundOperand {
    Column(usize),
    Value(BoundValue),
}

impl BoundOperand {
    fn resolve(&self, outer: Option<&Row>) -> Operand {
        match self {
            BoundOperand::Column(position) => Operand::Column(*position),
            BoundOperand::Value(value) => Operand::Literal(value.resolve(outer)),
        }
    }
}

/// A predicate with its correlation points left open.
#[derive(Clone, Debug)]
pub struct BoundPredicate {
    pub left: BoundOperand,
    pub op: CmpOp,
    pub right: BoundOperand,
}

impl BoundPredicate {
    fn resolve(&self, outer: Option<&Row>) -> Predicate {
        Predicate {
            left: self.left.resolve(outer),
            op: self.op,
            right: self.right.resolve(outer),
        }
    }
}

/// How a plan reads its base table.
#[derive(Clone)]
pub enum SourceSpec {
    /// Subscribe to every table event.
    Scan,
    /// Subscribe through an index probe for `column == key`.
    Lookup {
        index: Rc<RefCell<ColumnIndex>>,
        column: usize,
        key: BoundValue,
    },
}

/// One output column of a plan's final mapper.
#[derive(Clone, Debug)]
pub enum ProjectedColumn {
    /// A position of the rows flowing into the mapper.
    Input(usize),
    /// A constant, possibly bound from the outer row.
    Value(BoundValue),
}

/// A fully resolved plan, parameterized only by the outer row.
///
/// The same structure describes a top-level query (no outer row, no
/// correlation points) and a nested one.
#[derive(Clone)]
pub struct SubqueryTemplate {
    /// Base table of the plan.
    pub(crate) table: Rc<RefCell<Table>>,
    pub(crate) source: SourceSpec,
    pub(crate) filters: Vec<BoundPredicate>,
    /// Templates of nested selects, one per appended observable column.
    pub(crate) children: Vec<SubqueryTemplate>,
    pub(crate) projection: Vec<ProjectedColumn>,
    /// Outer-row positions this plan reads anywhere. When any of them
    /// changes, the child must be rebuilt.
    pub(crate) outer_refs: Vec<usize>,
    /// Table schema with the children's observable columns appended.
    pub(crate) mid_schema: Rc<RowSchema>,
    /// Output schema of the final mapper.
    pub(crate) schema: Rc<RowSchema>,
}

enum ResolvedProjection {
    Input(usize),
    Const(Value),
}

impl SubqueryTemplate {
    /// Returns the output schema of plans built from this template.
    pub fn schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    /// Returns true if any outer column this plan reads differs between
    /// the two rows.
    pub fn correlation_changed(&self, old: &Row, new: &Row) -> bool {
        self.outer_refs
            .iter()
            .any(|&position| old.get(position) != new.get(position))
    }

    /// Builds a live plan bound to `outer`.
    ///
    /// The returned instance owns the plan: dropping it unsubscribes the
    /// plan from its base table.
    pub fn instantiate(&self, outer: Option<&Row>) -> ChildInstance {
        let table_schema = self.table.borrow().schema();
        let mut current: ObservableRef = self.table.clone();
        let mut source: Option<SubscriberRef> = None;

        if let SourceSpec::Lookup { index, column, key } = &self.source {
            let lookup = Rc::new(RefCell::new(IndexedEqLookup::new(
                Rc::clone(&table_schema),
                Rc::clone(index),
                &self.table,
                *column,
                key.resolve(outer),
            )));
            let sub: SubscriberRef = lookup.clone();
            link(&current, &sub);
            source.get_or_insert(sub);
            current = lookup;
        }

        for predicate in &self.filters {
            let filter = Rc::new(RefCell::new(Filter::new(
                Rc::clone(&table_schema),
                predicate.resolve(outer),
            )));
            let sub: SubscriberRef = filter.clone();
            link(&current, &sub);
            source.get_or_insert(sub);
            current = filter;
        }

        if !self.children.is_empty() {
            let nested = Rc::new(RefCell::new(CorrelatedSubquery::new(
                Rc::clone(&self.mid_schema),
                self.children.clone(),
            )));
            let sub: SubscriberRef = nested.clone();
            link(&current, &sub);
            source.get_or_insert(sub);
            current = nested;
        }

        let columns: Vec<ResolvedProjection> = self
            .projection
            .iter()
            .map(|column| match column {
                ProjectedColumn::Input(position) => ResolvedProjection::Input(*position),
                ProjectedColumn::Value(value) => ResolvedProjection::Const(value.resolve(outer)),
            })
            .collect();
        let transform: RowTransform = Box::new(move |row: &Row| {
            let values = columns
                .iter()
                .map(|column| match column {
                    ResolvedProjection::Input(position) => row
                        .get(*position)
                        .cloned()
                        .unwrap_or_else(|| panic!("projection outside the plan's schema")),
                    ResolvedProjection::Const(value) => value.clone(),
                })
                .collect();
            Row::new(row.id(), values)
        });
        let mapper = Rc::new(RefCell::new(Mapper::new(Rc::clone(&self.schema), transform)));
        let sub: SubscriberRef = mapper.clone();
        link(&current, &sub);
        source.get_or_insert(sub);

        ChildInstance {
            root: mapper,
            _guard: ChildGuard {
                table: Rc::downgrade(&self.table),
                source: source.expect("plan always links at least its mapper"),
            },
        }
    }
}

/// Unsubscribes a plan's source from its base table on drop.
struct ChildGuard {
    table: Weak<RefCell<Table>>,
    source: SubscriberRef,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().remove_sub(&self.source);
        }
    }
}

/// A live plan built from a template.
pub struct ChildInstance {
    root: Rc<RefCell<Mapper>>,
    _guard: ChildGuard,
}

impl ChildInstance {
    /// Returns the root observable of the plan.
    pub fn root(&self) -> ObservableRef {
        self.root.clone()
    }
}

/// Maintains one child plan per outer row and appends the child handles to
/// the rows flowing downstream.
pub struct CorrelatedSubquery {
    /// Upstream schema with one observable column appended per template.
    schema: Rc<RowSchema>,
    templates: Vec<SubqueryTemplate>,
    children: HashMap<RowId, Vec<ChildInstance>>,
    subs: SubscriberList,
    upstream: Option<WeakObservable>,
}

impl CorrelatedSubquery {
    /// Creates the operator.
    ///
    /// `schema` is the upstream schema extended with the templates' output
    /// columns.
    pub fn new(schema: Rc<RowSchema>, templates: Vec<SubqueryTemplate>) -> Self {
        Self {
            schema,
            templates,
            children: HashMap::new(),
            subs: SubscriberList::new(),
            upstream: None,
        }
    }

    /// Returns the number of outer rows with live children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    fn extend(row: &Row, roots: &[ObservableRef]) -> Row {
        let mut values = row.values().to_vec();
        values.extend(roots.iter().map(|root| Value::Observable(Rc::clone(root))));
        Row::new(row.id(), values)
    }

    fn ensure_children(&mut self, row: &Row) -> Vec<ObservableRef> {
        let templates = &self.templates;
        self.children
            .entry(row.id())
            .or_insert_with(|| {
                templates
                    .iter()
                    .map(|template| template.instantiate(Some(row)))
                    .collect()
            })
            .iter()
            .map(|instance| instance.root())
            .collect()
    }
}

impl Subscriber for CorrelatedSubquery {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        let roots = self.ensure_children(row);
        self.subs.publish_add(&Self::extend(row, &roots));
    }

    fn on_remove(&mut self, row: &Row) {
        let instances = match self.children.remove(&row.id()) {
            Some(instances) => instances,
            // The row was never observed here; build the children only to
            // give the remove event its full shape.
            None => self
                .templates
                .iter()
                .map(|template| template.instantiate(Some(row)))
                .collect(),
        };
        let roots: Vec<ObservableRef> = instances.iter().map(|instance| instance.root()).collect();
        drop(instances);
        self.subs.publish_remove(&Self::extend(row, &roots));
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        let mut instances = match self.children.remove(&new.id()) {
            Some(instances) => instances,
            None => self
                .templates
                .iter()
                .map(|template| template.instantiate(Some(new)))
                .collect(),
        };
        let old_roots: Vec<ObservableRef> =
            instances.iter().map(|instance| instance.root()).collect();

        for (position, template) in self.templates.iter().enumerate() {
            if template.correlation_changed(old, new) {
                instances[position] = template.instantiate(Some(new));
            }
        }

        let new_roots: Vec<ObservableRef> =
            instances.iter().map(|instance| instance.root()).collect();
        self.children.insert(new.id(), instances);
        self.subs
            .publish_update(&Self::extend(old, &old_roots), &Self::extend(new, &new_roots));
    }
}

impl Observable for CorrelatedSubquery {
    fn row_schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    fn snapshot(&mut self) -> Vec<Row> {
        let rows = upstream_rows(&self.upstream);
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let roots = self.ensure_children(row);
            out.push(Self::extend(row, &roots));
        }
        out
    }

    fn add_sub(&mut self, sub: SubscriberRef) {
        self.subs.add(sub);
    }

    fn remove_sub(&mut self, sub: &SubscriberRef) -> bool {
        self.subs.remove(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;
    use rill_core::{Column, DataType};
    use rill_reactive::CallbackSubscriber;

    fn todo_table() -> Rc<RefCell<Table>> {
        let schema = RowSchema::new(vec![
            Column::new("title", DataType::String),
            Column::new("person_id", DataType::Int),
        ]);
        Rc::new(RefCell::new(Table::new("todo", schema).unwrap()))
    }

    fn person_table() -> Rc<RefCell<Table>> {
        let schema = RowSchema::new(vec![
            Column::new("name", DataType::String),
            Column::new("id", DataType::Int),
        ]);
        Rc::new(RefCell::new(Table::new("person", schema).unwrap()))
    }

    /// Template for: SELECT todo.title FROM todo WHERE todo.person_id == person.id
    fn todos_template(todo: &Rc<RefCell<Table>>) -> SubqueryTemplate {
        let index = todo.borrow_mut().index_on("person_id").unwrap();
        SubqueryTemplate {
            table: todo.clone(),
            source: SourceSpec::Lookup {
                index,
                column: 1,
                key: BoundValue::Outer(1),
            },
            filters: Vec::new(),
            children: Vec::new(),
            projection: vec![ProjectedColumn::Input(0)],
            outer_refs: vec![1],
            mid_schema: todo.borrow().schema(),
            schema: Rc::new(RowSchema::new(vec![Column::new("title", DataType::String)])),
        }
    }

    fn correlate(
        person: &Rc<RefCell<Table>>,
        todo: &Rc<RefCell<Table>>,
    ) -> Rc<RefCell<CorrelatedSubquery>> {
        let mid = {
            let mut columns = person.borrow().schema().columns().to_vec();
            columns.push(Column::new("todos", DataType::Observable));
            Rc::new(RowSchema::new(columns))
        };
        let corr = Rc::new(RefCell::new(CorrelatedSubquery::new(
            mid,
            vec![todos_template(todo)],
        )));
        let obs: ObservableRef = person.clone();
        let sub: SubscriberRef = corr.clone();
        link(&obs, &sub);
        corr
    }

    fn titles(obs: &ObservableRef) -> Vec<String> {
        obs.borrow_mut()
            .snapshot()
            .iter()
            .map(|row| row.get(0).unwrap().as_str().unwrap().into())
            .collect()
    }

    #[test]
    fn test_child_per_outer_row() {
        let person = person_table();
        let todo = todo_table();
        let corr = correlate(&person, &todo);

        let added = Rc::new(RefCell::new(Vec::new()));
        let added_clone = added.clone();
        let sub: SubscriberRef = Rc::new(RefCell::new(CallbackSubscriber::new().on_add(
            move |row| added_clone.borrow_mut().push(row.clone()),
        )));
        corr.borrow_mut().add_sub(sub);

        todo.borrow_mut()
            .insert(vec![Value::from("eat food"), Value::Int(0)])
            .unwrap();
        person
            .borrow_mut()
            .insert(vec![Value::from("shmuli"), Value::Int(0)])
            .unwrap();

        assert_eq!(corr.borrow().child_count(), 1);
        let row = added.borrow()[0].clone();
        assert_eq!(row.len(), 3);
        let nested = row.get(2).unwrap().as_observable().unwrap().clone();
        assert_eq!(titles(&nested), vec!["eat food"]);
    }

    #[test]
    fn test_child_sees_later_inserts() {
        let person = person_table();
        let todo = todo_table();
        let corr = correlate(&person, &todo);

        person
            .borrow_mut()
            .insert(vec![Value::from("shmuli"), Value::Int(0)])
            .unwrap();
        let nested = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();

        let added = Rc::new(RefCell::new(0));
        let added_clone = added.clone();
        let sub: SubscriberRef = Rc::new(RefCell::new(
            CallbackSubscriber::new().on_add(move |_| *added_clone.borrow_mut() += 1),
        ));
        nested.borrow_mut().add_sub(sub);

        todo.borrow_mut()
            .insert(vec![Value::from("eat food"), Value::Int(0)])
            .unwrap();
        todo.borrow_mut()
            .insert(vec![Value::from("for someone else"), Value::Int(9)])
            .unwrap();

        assert_eq!(*added.borrow(), 1);
        assert_eq!(titles(&nested), vec!["eat food"]);
    }

    #[test]
    fn test_remove_tears_down_child() {
        let person = person_table();
        let todo = todo_table();
        let corr = correlate(&person, &todo);

        person
            .borrow_mut()
            .insert(vec![Value::from("shmuli"), Value::Int(0)])
            .unwrap();
        let nested = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();

        let added = Rc::new(RefCell::new(0));
        let added_clone = added.clone();
        let sub: SubscriberRef = Rc::new(RefCell::new(
            CallbackSubscriber::new().on_add(move |_| *added_clone.borrow_mut() += 1),
        ));
        nested.borrow_mut().add_sub(sub);

        person
            .borrow_mut()
            .remove_where_eq("id", &Value::Int(0))
            .unwrap();
        assert_eq!(corr.borrow().child_count(), 0);

        // Events no longer reach the torn-down child.
        todo.borrow_mut()
            .insert(vec![Value::from("late"), Value::Int(0)])
            .unwrap();
        assert_eq!(*added.borrow(), 0);
    }

    #[test]
    fn test_update_keeps_child_when_correlation_unchanged() {
        let person = person_table();
        let todo = todo_table();
        let corr = correlate(&person, &todo);

        person
            .borrow_mut()
            .insert(vec![Value::from("shmuli"), Value::Int(0)])
            .unwrap();
        let before = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();

        person
            .borrow_mut()
            .update_where_eq("id", &Value::Int(0), vec![Value::from("shm"), Value::Int(0)])
            .unwrap();
        let after = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();

        assert!(rill_core::observe::same_observable(&before, &after));
    }

    #[test]
    fn test_update_rebuilds_child_when_correlation_changes() {
        let person = person_table();
        let todo = todo_table();
        let corr = correlate(&person, &todo);

        todo.borrow_mut()
            .insert(vec![Value::from("for 0"), Value::Int(0)])
            .unwrap();
        todo.borrow_mut()
            .insert(vec![Value::from("for 7"), Value::Int(7)])
            .unwrap();

        person
            .borrow_mut()
            .insert(vec![Value::from("shmuli"), Value::Int(0)])
            .unwrap();
        let before = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();
        assert_eq!(titles(&before), vec!["for 0"]);

        person
            .borrow_mut()
            .update_where_eq("id", &Value::Int(0), vec![Value::from("shmuli"), Value::Int(7)])
            .unwrap();
        let after = corr.borrow_mut().snapshot()[0]
            .get(2)
            .unwrap()
            .as_observable()
            .unwrap()
            .clone();

        assert!(!rill_core::observe::same_observable(&before, &after));
        assert_eq!(titles(&after), vec!["for 7"]);
    }
}
