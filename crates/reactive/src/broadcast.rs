//! Single-value broadcaster.
//!
//! The scalar counterpart of an observable: aggregate sinks push each new
//! aggregate value through one of these.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Callback type for broadcast values.
pub type BroadcastFn<T> = Box<dyn Fn(&T)>;

/// Fans a single value out to a list of callbacks.
pub struct Broadcaster<T> {
    subscribers: Vec<BroadcastFn<T>>,
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Broadcaster<T> {
    /// Creates a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Appends a subscriber callback.
    pub fn subscribe(&mut self, subscriber: impl Fn(&T) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Delivers a value to every subscriber in order.
    pub fn broadcast(&self, value: &T) {
        for subscriber in &self.subscribers {
            subscriber(value);
        }
    }

    /// Returns the number of subscribers.
    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns true if there are no subscribers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
