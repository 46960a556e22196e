//! Subscriber fan-out.
//!
//! `SubscriberList` is the delivery list every event source owns. Events go
//! out synchronously, in subscription order, with no coalescing.

use alloc::boxed::Box;
use alloc::vec::Vec;
use rill_core::observe::same_subscriber;
use rill_core::{Row, Subscriber, SubscriberRef, WeakObservable};

/// An ordered list of subscribers with publish fan-out.
#[derive(Default)]
pub struct SubscriberList {
    subs: Vec<SubscriberRef>,
}

impl SubscriberList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self { subs: Vec::new() }
    }

    /// Appends a subscriber.
    pub fn add(&mut self, sub: SubscriberRef) {
        self.subs.push(sub);
    }

    /// Removes a subscriber by handle identity.
    ///
    /// Returns true if the subscriber was found and removed.
    pub fn remove(&mut self, sub: &SubscriberRef) -> bool {
        let before = self.subs.len();
        self.subs.retain(|s| !same_subscriber(s, sub));
        self.subs.len() != before
    }

    /// Returns the number of subscribers.
    #[inline]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Returns true if there are no subscribers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Delivers an add event to every subscriber in order.
    pub fn publish_add(&self, row: &Row) {
        for sub in &self.subs {
            sub.borrow_mut().on_add(row);
        }
    }

    /// Delivers a remove event to every subscriber in order.
    pub fn publish_remove(&self, row: &Row) {
        for sub in &self.subs {
            sub.borrow_mut().on_remove(row);
        }
    }

    /// Delivers an update event to every subscriber in order.
    pub fn publish_update(&self, old: &Row, new: &Row) {
        for sub in &self.subs {
            sub.borrow_mut().on_update(old, new);
        }
    }
}

/// Closure handlers for each event kind.
type AddFn = Box<dyn FnMut(&Row)>;
type RemoveFn = Box<dyn FnMut(&Row)>;
type UpdateFn = Box<dyn FnMut(&Row, &Row)>;

/// A subscriber driven by optional closures, one per event kind.
#[derive(Default)]
pub struct CallbackSubscriber {
    on_add: Option<AddFn>,
    on_remove: Option<RemoveFn>,
    on_update: Option<UpdateFn>,
    upstream: Option<WeakObservable>,
}

impl CallbackSubscriber {
    /// Creates a subscriber with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the add handler.
    pub fn on_add(mut self, f: impl FnMut(&Row) + 'static) -> Self {
        self.on_add = Some(Box::new(f));
        self
    }

    /// Sets the remove handler.
    pub fn on_remove(mut self, f: impl FnMut(&Row) + 'static) -> Self {
        self.on_remove = Some(Box::new(f));
        self
    }

    /// Sets the update handler.
    pub fn on_update(mut self, f: impl FnMut(&Row, &Row) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Returns the upstream back-reference, if linked.
    pub fn subscribed_to(&self) -> Option<&WeakObservable> {
        self.upstream.as_ref()
    }
}

impl Subscriber for CallbackSubscriber {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        if let Some(f) = self.on_add.as_mut() {
            f(row);
        }
    }

    fn on_remove(&mut self, row: &Row) {
        if let Some(f) = self.on_remove.as_mut() {
            f(row);
        }
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        if let Some(f) = self.on_update.as_mut() {
            f(old, new);
        }
    }
}
