//! rill-reactive - Reactive plumbing for the rill query engine.
//!
//! This crate provides the concrete pieces behind the `Observable` /
//! `Subscriber` interfaces of `rill-core`:
//!
//! - `SubscriberList`: the ordered fan-out every event source owns
//! - `CallbackSubscriber`: a closure-driven subscriber
//! - `Broadcaster<T>`: the single-value counterpart of an observable
//! - aggregate sinks (`Count`, `Sum`, `Avg`, `Product`) that fold a row
//!   stream into one incrementally-maintained value
//!
//! Delivery is synchronous and in subscription order. A subscriber may
//! publish in response; re-entrant publishes are serviced depth-first.

#![no_std]

extern crate alloc;

pub mod aggregate;
pub mod broadcast;
pub mod subscribers;

pub use aggregate::{Avg, Count, Product, Sum};
pub use broadcast::Broadcaster;
pub use subscribers::{CallbackSubscriber, SubscriberList};
