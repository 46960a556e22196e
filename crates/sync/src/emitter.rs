//! Event-emitter tree.
//!
//! Walks a recursive observable result and flattens its mutations into
//! path-scoped patch messages. Each observable in the tree gets one
//! subscriber; rows are addressed as `/<pk>[/<col>/<pk>...]` where the
//! primary key is the row's first column and `col` names the observable
//! cell a nested row lives in.

use crate::json::row_to_json;
use crate::message::{SyncKind, SyncMessage};
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use rill_core::observe::same_observable;
use rill_core::{
    link, Observable, ObservableRef, Row, RowSchema, Subscriber, SubscriberRef, Value,
    WeakObservable,
};

/// Flattens a recursive observable into patch messages.
pub struct EventEmitterTree {
    on_message: Box<dyn Fn(&SyncMessage)>,
}

impl EventEmitterTree {
    /// Creates an emitter delivering messages to `on_message`.
    pub fn new(on_message: impl Fn(&SyncMessage) + 'static) -> Rc<Self> {
        Rc::new(Self {
            on_message: Box::new(on_message),
        })
    }

    /// Delivers one message.
    pub fn emit(&self, message: &SyncMessage) {
        (self.on_message)(message);
    }

    /// Subscribes `emitter` to `obs` and to every nested observable of its
    /// current rows, scoping patches under `path`.
    pub fn sync_from_observable(emitter: &Rc<Self>, obs: &ObservableRef, path: &str) {
        let schema = obs.borrow().row_schema();
        let sub: SubscriberRef = Rc::new(RefCell::new(TreeSubscriber {
            emitter: Rc::clone(emitter),
            path: path.into(),
            schema: Rc::clone(&schema),
            upstream: None,
        }));
        link(obs, &sub);

        let rows = obs.borrow_mut().snapshot();
        for row in &rows {
            let row_path = join(path, &primary_key(row));
            Self::walk_row(emitter, row, &row_path, &schema);
        }
    }

    /// Builds the full-snapshot message for the root observable.
    pub fn initial_message(obs: &ObservableRef) -> SyncMessage {
        SyncMessage::new(SyncKind::Initial, crate::json::rows_to_json(obs), String::new())
    }

    fn walk_row(emitter: &Rc<Self>, row: &Row, row_path: &str, schema: &RowSchema) {
        for (position, value) in row.values().iter().enumerate() {
            if let Value::Observable(child) = value {
                if let Some(column) = schema.get(position) {
                    Self::sync_from_observable(emitter, child, &join(row_path, column.name()));
                }
            }
        }
    }
}

/// Subscribes an emitter to an observable and emits the initial snapshot
/// message, mirroring what a transport does per client.
pub fn observe(
    obs: &ObservableRef,
    on_message: impl Fn(&SyncMessage) + 'static,
) -> Rc<EventEmitterTree> {
    let emitter = EventEmitterTree::new(on_message);
    EventEmitterTree::sync_from_observable(&emitter, obs, "");
    emitter.emit(&EventEmitterTree::initial_message(obs));
    emitter
}

fn primary_key(row: &Row) -> String {
    match row.get(0).and_then(|value| value.path_segment()) {
        Some(segment) => segment,
        None => panic!("a row's first column must render as a path segment"),
    }
}

fn join(path: &str, segment: &str) -> String {
    format!("{}/{}", path, segment)
}

struct TreeSubscriber {
    emitter: Rc<EventEmitterTree>,
    path: String,
    schema: Rc<RowSchema>,
    upstream: Option<WeakObservable>,
}

impl Subscriber for TreeSubscriber {
    fn set_subscribed_to(&mut self, upstream: WeakObservable) {
        self.upstream = Some(upstream);
    }

    fn on_add(&mut self, row: &Row) {
        let row_path = join(&self.path, &primary_key(row));
        self.emitter.emit(&SyncMessage::new(
            SyncKind::Add,
            row_to_json(row, &self.schema),
            row_path.clone(),
        ));
        EventEmitterTree::walk_row(&self.emitter, row, &row_path, &self.schema);
    }

    fn on_remove(&mut self, row: &Row) {
        self.emitter.emit(&SyncMessage::new(
            SyncKind::Remove,
            row_to_json(row, &self.schema),
            join(&self.path, &primary_key(row)),
        ));
        // Nested subscriptions die with the row that owned them; nothing to
        // unhook here.
    }

    fn on_update(&mut self, old: &Row, new: &Row) {
        self.emitter.emit(&SyncMessage::new(
            SyncKind::Update,
            row_to_json(new, &self.schema),
            join(&self.path, &primary_key(old)),
        ));

        // A nested cell whose handle survived stays subscribed; a replaced
        // handle gets its subtree walked from scratch.
        let new_row_path = join(&self.path, &primary_key(new));
        for (position, value) in new.values().iter().enumerate() {
            if let Value::Observable(child) = value {
                let replaced = match old.get(position) {
                    Some(Value::Observable(previous)) => !same_observable(previous, child),
                    _ => true,
                };
                if replaced {
                    if let Some(column) = self.schema.get(position) {
                        EventEmitterTree::sync_from_observable(
                            &self.emitter,
                            child,
                            &join(&new_row_path, column.name()),
                        );
                    }
                }
            }
        }
    }
}
