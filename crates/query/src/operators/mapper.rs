//! Row-shaping operator.

use crate::operators::upstream_rows;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use rill_core::{Observable, Row, RowSchema, Subscriber, SubscriberRef, WeakObservable};
use rill_reactive::SubscriberList;

/// A pure row transform.
pub type RowTransform = Box<dyn Fn(&Row) -> Row>;

/// Applies a transform to every row flowing through.
///
/// The transform is applied to both sides of an update, so downstream
/// nodes always see rows in this operator's output shape.
pub struct Mapper {
    schema: Rc<RowSchema>,
    transform: RowTransform,
    subs: SubscriberList,
    upstream: Option<WeakObservable>,
}

impl Mapper {
    /// Creates a mapper emitting rows of `schema`.
    pub fn new(schema: Rc<RowSchema>, transform: RowTransform) -> Self {
        Self {
            schema,
            transform,
            subs: SubscriberList::new(),
            upstream: None,
        }
    }

    fn apply(&self, row: &Row) -> Row {
        (self.transform)(row)
    }
}

impl Subscriber for Mapper {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        self.subs.publish_add(&self.apply(row));
    }

    fn on_remove(&mut self, row: &Row) {
        self.subs.publish_remove(&self.apply(row));
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        self.subs.publish_update(&self.apply(old), &self.apply(new));
    }
}

impl Observable for Mapper {
    fn row_schema(&self) -> Rc<RowSchema> {
        Rc::clone(&self.schema)
    }

    fn snapshot(&mut self) -> Vec<Row> {
        upstream_rows(&self.upstream)
            .iter()
            .map(|row| self.apply(row))
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
    use rill_core::{Column, DataType, Value};
    use rill_reactive::CallbackSubscriber;

    fn reversed_mapper() -> Mapper {
        let schema = Rc::new(RowSchema::new(vec![
            Column::new("b", DataType::Int),
            Column::new("a", DataType::Int),
        ]));
        Mapper::new(
            schema,
            Box::new(|row| {
                Row::new(
                    row.id(),
                    vec![row.get(1).cloned().unwrap(), row.get(0).cloned().unwrap()],
                )
            }),
        )
    }

    #[test]
    fn test_mapper_transforms_adds() {
        let mut mapper = reversed_mapper();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub: SubscriberRef = Rc::new(RefCell::new(
            CallbackSubscriber::new().on_add(move |row| seen_clone.borrow_mut().push(row.clone())),
        ));
        mapper.add_sub(sub);

        mapper.on_add(&Row::new(3, vec![Value::Int(1), Value::Int(2)]));

        assert_eq!(
            *seen.borrow(),
            vec![Row::new(3, vec![Value::Int(2), Value::Int(1)])]
        );
    }

    #[test]
    fn test_mapper_transforms_both_update_sides() {
        let mut mapper = reversed_mapper();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub: SubscriberRef = Rc::new(RefCell::new(CallbackSubscriber::new().on_update(
            move |old, new| seen_clone.borrow_mut().push((old.clone(), new.clone())),
        )));
        mapper.add_sub(sub);

        mapper.on_update(
            &Row::new(0, vec![Value::Int(1), Value::Int(2)]),
            &Row::new(0, vec![Value::Int(3), Value::Int(4)]),
        );

        let (old, new) = seen.borrow()[0].clone();
        assert_eq!(old, Row::new(0, vec![Value::Int(2), Value::Int(1)]));
        assert_eq!(new, Row::new(0, vec![Value::Int(4), Value::Int(3)]));
    }
}
