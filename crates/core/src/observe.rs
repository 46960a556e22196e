//! Observable / subscriber interfaces.
//!
//! Every node in a query graph is an `Observable` (it can be subscribed to
//! and can report its current rows), a `Subscriber` (it reacts to upstream
//! add/remove/update events), or both. The interfaces live in this crate so
//! that a `Value` cell can own a handle to a nested reactive result.
//!
//! Delivery is synchronous and single-threaded: a publisher invokes its
//! subscribers in subscription order, and a subscriber that publishes in
//! response is serviced depth-first before the publisher moves on.

use crate::row::Row;
use crate::schema::RowSchema;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

/// Shared handle to a graph node viewed as an event source.
pub type ObservableRef = Rc<RefCell<dyn Observable>>;

/// Non-owning handle to an upstream event source.
pub type WeakObservable = Weak<RefCell<dyn Observable>>;

/// Shared handle to a graph node viewed as an event consumer.
pub type SubscriberRef = Rc<RefCell<dyn Subscriber>>;

/// An ordered source of row add/remove/update events.
pub trait Observable {
    /// Returns the schema of the rows this node emits.
    fn row_schema(&self) -> Rc<RowSchema>;

    /// Returns the current logical rows of this node.
    ///
    /// Takes `&mut self` so lazy nodes may materialize per-row state on
    /// first observation.
    fn snapshot(&mut self) -> Vec<Row>;

    /// Appends a subscriber to the delivery list.
    fn add_sub(&mut self, sub: SubscriberRef);

    /// Removes a subscriber by handle identity.
    ///
    /// Returns true if the subscriber was found and removed.
    fn remove_sub(&mut self, sub: &SubscriberRef) -> bool;
}

/// A consumer of row events, with a back-reference to its upstream source.
pub trait Subscriber {
    /// Stores the upstream back-reference. Installed by [`link`].
    fn set_subscribed_to(&mut self, upstream: WeakObservable);

    /// A row entered the upstream result.
    fn on_add(&mut self, row: &Row);

    /// A row left the upstream result.
    fn on_remove(&mut self, row: &Row);

    /// A row changed in place.
    fn on_update(&mut self, old: &Row, new: &Row);
}

/// Wires a subscriber to an observable, installing both directions.
pub fn link(obs: &ObservableRef, sub: &SubscriberRef) {
    obs.borrow_mut().add_sub(Rc::clone(sub));
    sub.borrow_mut().set_subscribed_to(Rc::downgrade(obs));
}

/// Compares two subscriber handles by the object they point at.
///
/// `Rc::ptr_eq` on trait objects also compares vtable pointers, which may
/// differ across codegen units; comparing data pointers is the reliable
/// identity test.
pub fn same_subscriber(a: &SubscriberRef, b: &SubscriberRef) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Compares two observable handles by the object they point at.
pub fn same_observable(a: &ObservableRef, b: &ObservableRef) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}
