//! Predicate operator.

use crate::ast::CmpOp;
use crate::operators::upstream_rows;
use alloc::rc::Rc;
use alloc::vec::Vec;
use rill_core::{Observable, Row, RowSchema, Subscriber, SubscriberRef, Value, WeakObservable};
use rill_reactive::SubscriberList;

/// One side of a comparison.
#[derive(Clone, Debug)]
pub enum Operand {
    /// A column position of the flowing rows.
    Column(usize),
    /// A constant.
    Literal(Value),
}

impl Operand {
    fn value<'a>(&'a self, row: &'a Row) -> Option<&'a Value> {
        match self {
            Operand::Column(position) => row.get(*position),
            Operand::Literal(value) => Some(value),
        }
    }
}

/// A comparison between two operands, evaluated per row.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub left: Operand,
    pub op: CmpOp,
    pub right: Operand,
}

impl Predicate {
    /// Evaluates the predicate against a row.
    ///
    /// Rows whose operands cannot be compared (missing column, mismatched
    /// types) do not satisfy the predicate.
    pub fn eval(&self, row: &Row) -> bool {
        let (left, right) = match (self.left.value(row), self.right.value(row)) {
            (Some(l), Some(r)) => (l, r),
            _ => return false,
        };
        left.compare(right)
            .map(|ordering| self.op.matches(ordering))
            .unwrap_or(false)
    }
}

/// Passes through only the rows satisfying a predicate.
///
/// Updates are resolved by the membership change they cause: a row entering
/// the result is an add, a row leaving it is a remove, a row staying in is
/// an update, and a row staying out is dropped.
pub struct Filter {
    schema: Rc<RowSchema>,
    predicate: Predicate,
    subs: SubscriberList,
    upstream: Option<WeakObservable>,
}

impl Filter {
    /// Creates a filter over rows of `schema`.
    pub fn new(schema: Rc<RowSchema>, predicate: Predicate) -> Self {
        Self {
            schema,
            predicate,
            subs: SubscriberList::new(),
            upstream: None,
        }
    }
}

impl Subscriber for Filter {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        if self.predicate.eval(row) {
            self.subs.publish_add(row);
        }
    }

    fn on_remove(&mut self, row: &Row) {
        if self.predicate.eval(row) {
            self.subs.publish_remove(row);
        }
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        match (self.predicate.eval(old), self.predicate.eval(new)) {
            (false, false) => {}
            (true, true) => self.subs.publish_update(old, new),
            (false, true) => self.subs.publish_add(new),
            (true, false) => self.subs.publish_remove(old),
        }
    }
}

impl Observable for Filter {
    fn row_schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    fn snapshot(&mut self) -> Vec<Row> {
        upstream_rows(&self.upstream)
            .into_iter()
            .filter(|row| self.predicate.eval(row))
            .collect()
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
    use alloc::vec;
    use core::cell::RefCell;
    use rill_core::{Column, DataType};
    use rill_reactive::CallbackSubscriber;

    fn age_filter() -> Filter {
        let schema = Rc::new(RowSchema::new(vec![
            Column::new("name", DataType::String),
            Column::new("age", DataType::Int),
        ]));
        Filter::new(
            schema,
            Predicate {
                left: Operand::Column(1),
                op: CmpOp::Ge,
                right: Operand::Literal(Value::Int(3)),
            },
        )
    }

    fn row(id: u64, age: i64) -> Row {
        Row::new(id, vec![Value::from("p"), Value::Int(age)])
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Event {
        Add(i64),
        Remove(i64),
        Update(i64, i64),
    }

    fn record(filter: &mut Filter) -> Rc<RefCell<Vec<Event>>> {
        let events: Rc<RefCell<Vec<Event>>> = Rc::new(RefCell::new(Vec::new()));
        let (e1, e2, e3) = (events.clone(), events.clone(), events.clone());
        let sub: SubscriberRef = Rc::new(RefCell::new(
            CallbackSubscriber::new()
                .on_add(move |r| {
                    e1.borrow_mut()
                        .push(Event::Add(r.get(1).unwrap().as_int().unwrap()))
                })
                .on_remove(move |r| {
                    e2.borrow_mut()
                        .push(Event::Remove(r.get(1).unwrap().as_int().unwrap()))
                })
                .on_update(move |o, n| {
                    e3.borrow_mut().push(Event::Update(
                        o.get(1).unwrap().as_int().unwrap(),
                        n.get(1).unwrap().as_int().unwrap(),
                    ))
                }),
        ));
        filter.add_sub(sub);
        events
    }

    #[test]
    fn test_add_respects_predicate() {
        let mut filter = age_filter();
        let events = record(&mut filter);

        filter.on_add(&row(0, 22));
        filter.on_add(&row(1, 2));

        assert_eq!(*events.borrow(), vec![Event::Add(22)]);
    }

    #[test]
    fn test_update_four_cases() {
        let mut filter = age_filter();
        let events = record(&mut filter);

        filter.on_update(&row(0, 1), &row(0, 2)); // out -> out: dropped
        filter.on_update(&row(1, 5), &row(1, 6)); // in -> in: update
        filter.on_update(&row(2, 2), &row(2, 4)); // out -> in: add
        filter.on_update(&row(3, 4), &row(3, 2)); // in -> out: remove

        assert_eq!(
            *events.borrow(),
            vec![Event::Update(5, 6), Event::Add(4), Event::Remove(4)]
        );
    }

    #[test]
    fn test_remove_respects_predicate() {
        let mut filter = age_filter();
        let events = record(&mut filter);

        filter.on_remove(&row(0, 22));
        filter.on_remove(&row(1, 2));

        assert_eq!(*events.borrow(), vec![Event::Remove(22)]);
    }

    #[test]
    fn test_predicate_type_mismatch_is_false() {
        let predicate = Predicate {
            left: Operand::Column(0),
            op: CmpOp::Eq,
            right: Operand::Literal(Value::Int(1)),
        };
        assert!(!predicate.eval(&row(0, 1))); // column 0 is a string
    }

    #[test]
    fn test_string_comparison() {
        let predicate = Predicate {
            left: Operand::Column(0),
            op: CmpOp::Lt,
            right: Operand::Literal(Value::from("q")),
        };
        assert!(predicate.eval(&row(0, 1))); // "p" < "q"
    }
}
