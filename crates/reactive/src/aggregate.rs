//! Incremental aggregate sinks.
//!
//! Each sink subscribes to a row stream, folds one numeric column into a
//! running value, and broadcasts the new value after every event. The fold
//! is incremental: the maintained value always equals re-folding the live
//! rows from scratch.
//!
//! Aggregates operate on the widened `i64` domain; `Avg` broadcasts `f64`.
//! Folding a non-integer column, or removing past an empty state, is an
//! invariant violation and panics.

use crate::broadcast::Broadcaster;
use rill_core::{Row, Subscriber, Value, WeakObservable};

/// Extracts the numeric field an aggregate folds.
fn numeric_field(row: &Row, column: usize) -> i64 {
    match row.get(column) {
        Some(Value::Int(v)) => *v,
        Some(other) => panic!(
            "aggregate column {} is not numeric: {:?}",
            column, other
        ),
        None => panic!("aggregate column {} is out of bounds", column),
    }
}

/// Counts the rows in the stream.
pub struct Count {
    out: Broadcaster<i64>,
    count: i64,
    upstream: Option<WeakObservable>,
}

impl Default for Count {
    fn default() -> Self {
        Self::new()
    }
}

impl Count {
    /// Creates a count sink starting at 0.
    pub fn new() -> Self {
        Self {
            out: Broadcaster::new(),
            count: 0,
            upstream: None,
        }
    }

    /// Subscribes a callback to count changes.
    pub fn subscribe(&mut self, f: impl Fn(&i64) + 'static) {
        self.out.subscribe(f);
    }

    /// Returns the current count.
    #[inline]
    pub fn get(&self) -> i64 {
        self.count
    }
}

impl Subscriber for Count {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, _row: &Row) {
        self.count += 1;
        self.out.broadcast(&self.count);
    }

    fn on_remove(&mut self, _row: &Row) {
        if self.count == 0 {
            panic!("count went below zero");
        }
        self.count -= 1;
        self.out.broadcast(&self.count);
    }

    fn on_update(&mut self, _old: &Row, _new: &Row) {
        self.out.broadcast(&self.count);
    }
}

/// Sums a numeric column across the stream.
pub struct Sum {
    out: Broadcaster<i64>,
    sum: i64,
    column: usize,
    upstream: Option<WeakObservable>,
}

impl Sum {
    /// Creates a sum sink over the given column position.
    pub fn new(column: usize) -> Self {
        Self {
            out: Broadcaster::new(),
            sum: 0,
            column,
            upstream: None,
        }
    }

    /// Subscribes a callback to sum changes.
    pub fn subscribe(&mut self, f: impl Fn(&i64) + 'static) {
        self.out.subscribe(f);
    }

    /// Returns the current sum.
    #[inline]
    pub fn get(&self) -> i64 {
        self.sum
    }
}

impl Subscriber for Sum {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        self.sum += numeric_field(row, self.column);
        self.out.broadcast(&self.sum);
    }

    fn on_remove(&mut self, row: &Row) {
        self.sum -= numeric_field(row, self.column);
        self.out.broadcast(&self.sum);
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        self.sum += numeric_field(new, self.column) - numeric_field(old, self.column);
        self.out.broadcast(&self.sum);
    }
}

/// Averages a numeric column across the stream.
///
/// Maintains the sum and count; the average is their double-precision
/// quotient, 0 when the stream is empty.
pub struct Avg {
    out: Broadcaster<f64>,
    sum: i64,
    count: i64,
    column: usize,
    upstream: Option<WeakObservable>,
}

impl Avg {
    /// Creates an average sink over the given column position.
    pub fn new(column: usize) -> Self {
        Self {
            out: Broadcaster::new(),
            sum: 0,
            count: 0,
            column,
            upstream: None,
        }
    }

    /// Subscribes a callback to average changes.
    pub fn subscribe(&mut self, f: impl Fn(&f64) + 'static) {
        self.out.subscribe(f);
    }

    /// Returns the current average, 0 when empty.
    pub fn get(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

impl Subscriber for Avg {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        self.sum += numeric_field(row, self.column);
        self.count += 1;
        let avg = self.get();
        self.out.broadcast(&avg);
    }

    fn on_remove(&mut self, row: &Row) {
        if self.count == 0 {
            panic!("average count went below zero");
        }
        self.sum -= numeric_field(row, self.column);
        self.count -= 1;
        let avg = self.get();
        self.out.broadcast(&avg);
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        if self.count == 0 {
            panic!("update on an empty average");
        }
        self.sum += numeric_field(new, self.column) - numeric_field(old, self.column);
        let avg = self.get();
        self.out.broadcast(&avg);
    }
}

/// Multiplies a numeric column across the stream.
///
/// Zero operands are tracked as a sentinel count rather than folded into
/// the product, so removing a zero never divides by zero and the product
/// of the remaining rows stays exact.
pub struct Product {
    out: Broadcaster<i64>,
    product: i64,
    zeros: u32,
    column: usize,
    upstream: Option<WeakObservable>,
}

impl Product {
    /// Creates a product sink over the given column position.
    pub fn new(column: usize) -> Self {
        Self {
            out: Broadcaster::new(),
            product: 1,
            zeros: 0,
            column,
            upstream: None,
        }
    }

    /// Subscribes a callback to product changes.
    pub fn subscribe(&mut self, f: impl Fn(&i64) + 'static) {
        self.out.subscribe(f);
    }

    /// Returns the current product.
    pub fn get(&self) -> i64 {
        if self.zeros > 0 {
            0
        } else {
            self.product
        }
    }

    fn add_value(&mut self, v: i64) {
        if v == 0 {
            self.zeros += 1;
        } else {
            self.product *= v;
        }
    }

    fn remove_value(&mut self, v: i64) {
        if v == 0 {
            if self.zeros == 0 {
                panic!("removing a zero that was never added");
            }
            self.zeros -= 1;
        } else {
            self.product /= v;
        }
    }
}

impl Subscriber for Product {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        self.add_value(numeric_field(row, self.column));
        let value = self.get();
        self.out.broadcast(&value);
    }

    fn on_remove(&mut self, row: &Row) {
        self.remove_value(numeric_field(row, self.column));
        let value = self.get();
        self.out.broadcast(&value);
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        self.remove_value(numeric_field(old, self.column));
        self.add_value(numeric_field(new, self.column));
        let value = self.get();
        self.out.broadcast(&value);
    }
}
