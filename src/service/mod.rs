//! Services - push-based state sources nodes can bind to.
//!
//! A [`Service`] holds an immutable snapshot of some external state and a
//! list of subscribers. Replacing or updating the snapshot notifies every
//! subscriber of `changed` with the new snapshot. Subscriptions bound to a
//! node end when the node is destroyed.
//!
//! Concrete services:
//! - [`hyprland`] - workspaces, monitors, clients and the focused window
//! - [`applications`] - installed desktop applications
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::service::Service;
//!
//! let battery = Service::new("battery", 100_u8);
//! battery.connect(label, |label, percent| {
//!     label.set_label(&format!("{percent}%"));
//! });
//! battery.set(42); // label now shows "42%"
//! ```

pub mod applications;
pub mod hyprland;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::engine::{self, Cleanup, NodeId};
use crate::spec::SignalCallback;

/// Event every service emits after its snapshot changed.
pub const CHANGED: &str = "changed";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("cannot parse output of {command}: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Connectable
// =============================================================================

/// Anything a node can subscribe to through a `Connection::Service`.
pub trait Connectable {
    /// Call `callback` with the node whenever `event` (default `changed`)
    /// fires. The returned cleanup ends the subscription.
    fn connect_widget(&self, node: NodeId, callback: SignalCallback, event: Option<&str>) -> Cleanup;
}

// =============================================================================
// Service hub
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Listener<S> = Rc<dyn Fn(&S, &[Value])>;

struct Subscriber<S> {
    id: SubscriptionId,
    event: String,
    listener: Listener<S>,
}

struct ServiceInner<S> {
    name: String,
    state: RefCell<Rc<S>>,
    subscribers: RefCell<Vec<Subscriber<S>>>,
    next_id: Cell<usize>,
}

/// Shared handle to a service. Clones observe the same state.
pub struct Service<S> {
    inner: Rc<ServiceInner<S>>,
}

impl<S> Clone for Service<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Service<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.inner.name)
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<S: 'static> Service<S> {
    pub fn new(name: &str, state: S) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                name: name.to_string(),
                state: RefCell::new(Rc::new(state)),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The current state. Later updates never mutate a snapshot already handed out.
    pub fn snapshot(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Listen to `event` without binding to a node.
    pub fn subscribe(&self, event: &str, listener: impl Fn(&S, &[Value]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscribers.borrow_mut().push(Subscriber {
            id,
            event: event.to_string(),
            listener: Rc::new(listener),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.subscribers.borrow_mut().retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Bind `callback` to `node`: it runs now with the current snapshot and
    /// after every change, until the node is destroyed.
    pub fn connect(&self, node: NodeId, callback: impl Fn(NodeId, &S) + 'static) -> SubscriptionId {
        let callback = Rc::new(callback);
        let id = {
            let callback = Rc::clone(&callback);
            self.subscribe(CHANGED, move |state, _| {
                if node.is_alive() {
                    callback(node, state);
                }
            })
        };
        self.unsubscribe_on_destroy(node, id);

        let state = self.snapshot();
        callback(node, &*state);
        id
    }

    /// Bind `callback` to `node` for a specific event. Does not run immediately.
    pub fn connect_event(
        &self,
        node: NodeId,
        event: &str,
        callback: impl Fn(NodeId, &S, &[Value]) + 'static,
    ) -> SubscriptionId {
        let id = self.subscribe(event, move |state, args| {
            if node.is_alive() {
                callback(node, state, args);
            }
        });
        self.unsubscribe_on_destroy(node, id);
        id
    }

    fn unsubscribe_on_destroy(&self, node: NodeId, id: SubscriptionId) {
        let inner = Rc::downgrade(&self.inner);
        engine::on_destroy(node, move || {
            if let Some(inner) = inner.upgrade() {
                inner.subscribers.borrow_mut().retain(|s| s.id != id);
            }
        });
    }

    /// Replace the snapshot and notify `changed`.
    pub fn set(&self, state: S) {
        *self.inner.state.borrow_mut() = Rc::new(state);
        self.emit(CHANGED, &[]);
    }

    /// Derive a new snapshot from the current one and notify `changed`.
    pub fn update(&self, f: impl FnOnce(&mut S))
    where
        S: Clone,
    {
        {
            let mut state = self.inner.state.borrow_mut();
            f(Rc::make_mut(&mut state));
        }
        self.emit(CHANGED, &[]);
    }

    /// Mutate the snapshot without notifying.
    pub fn update_quietly(&self, f: impl FnOnce(&mut S))
    where
        S: Clone,
    {
        let mut state = self.inner.state.borrow_mut();
        f(Rc::make_mut(&mut state));
    }

    /// Notify every subscriber of `event`. Returns how many listeners ran.
    ///
    /// Listeners are collected first, so they may subscribe, unsubscribe or
    /// destroy nodes while running.
    pub fn emit(&self, event: &str, args: &[Value]) -> usize {
        let listeners: Vec<Listener<S>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.event == event)
            .map(|s| Rc::clone(&s.listener))
            .collect();
        let state = self.snapshot();

        tracing::trace!(service = %self.inner.name, event, listeners = listeners.len(), "emit");
        for listener in &listeners {
            listener(&*state, args);
        }
        listeners.len()
    }
}

impl<S: 'static> Connectable for Service<S> {
    fn connect_widget(&self, node: NodeId, callback: SignalCallback, event: Option<&str>) -> Cleanup {
        let event = event.unwrap_or(CHANGED);
        let id = self.connect_event(node, event, move |node, _, args| callback(node, args));
        if event == CHANGED && node.is_alive() {
            callback_now(self, node, id);
        }

        let inner = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.subscribers.borrow_mut().retain(|s| s.id != id);
            }
        })
    }
}

/// Run one subscriber immediately with the current snapshot.
fn callback_now<S: 'static>(service: &Service<S>, node: NodeId, id: SubscriptionId) {
    let listener = service
        .inner
        .subscribers
        .borrow()
        .iter()
        .find(|s| s.id == id)
        .map(|s| Rc::clone(&s.listener));
    if let Some(listener) = listener {
        tracing::trace!(service = %service.inner.name, node = ?node, "initial notify");
        let state = service.snapshot();
        listener(&*state, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate, reset_registry};
    use crate::types::NodeKind;

    fn setup() {
        reset_registry();
    }

    #[test]
    fn test_connect_runs_now_and_on_change() {
        setup();

        let service = Service::new("counter", 1_u32);
        let label = allocate(NodeKind::Label);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        service.connect(label, move |_, value| s.borrow_mut().push(*value));

        service.set(2);
        service.update(|value| *value += 1);

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_subscription_ends_with_node() {
        setup();

        let service = Service::new("counter", 0_u32);
        let label = allocate(NodeKind::Label);
        service.connect(label, |_, _| {});
        assert_eq!(service.subscriber_count(), 1);

        label.destroy();
        assert_eq!(service.subscriber_count(), 0);
        assert_eq!(service.emit(CHANGED, &[]), 0);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        setup();

        let service = Service::new("list", vec![1, 2]);
        let before = service.snapshot();
        service.update(|list| list.push(3));

        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*service.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn test_connect_widget_with_event() {
        setup();

        let service = Service::new("hypr", ());
        let node = allocate(NodeKind::Label);
        let urgent = Rc::new(Cell::new(0));
        let u = urgent.clone();
        let dispose = service.connect_widget(node, Rc::new(move |_, _| u.set(u.get() + 1)), Some("urgent-window"));

        assert_eq!(urgent.get(), 0);
        service.emit("urgent-window", &[Value::from("0xabc")]);
        service.emit(CHANGED, &[]);
        assert_eq!(urgent.get(), 1);

        dispose();
        service.emit("urgent-window", &[]);
        assert_eq!(urgent.get(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        setup();

        let service = Service::new("s", ());
        let other = service.clone();
        let id = Rc::new(Cell::new(None));
        let own = id.clone();
        id.set(Some(service.subscribe(CHANGED, move |_, _| {
            if let Some(id) = own.get() {
                other.unsubscribe(id);
            }
        })));

        assert_eq!(service.emit(CHANGED, &[]), 1);
        assert_eq!(service.emit(CHANGED, &[]), 0);
    }
}
