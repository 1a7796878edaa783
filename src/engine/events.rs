//! Signal handler registry.
//!
//! Native events are modelled as named signals on a node. Builders and
//! `Connection::Signal` entries attach handlers; the toolkit layer (or a
//! test) emits them. Handlers receive the node and the event arguments.
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::engine::events;
//!
//! events::connect(button, "clicked", Rc::new(|node, _args| {
//!     node.toggle_class_name("pressed", true);
//! }));
//! events::emit(button, "clicked", &[]);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::registry::{self, NodeId};
use crate::types::{MouseButton, NodeFlags, ScrollDirection};

// =============================================================================
// Signal Names
// =============================================================================

pub const CLICKED: &str = "clicked";
pub const BUTTON_PRESS: &str = "button-press-event";
pub const BUTTON_RELEASE: &str = "button-release-event";
pub const SCROLL: &str = "scroll-event";
pub const ENTER: &str = "enter-notify-event";
pub const LEAVE: &str = "leave-notify-event";
pub const ACTIVATE: &str = "activate";
pub const CHANGED: &str = "changed";
pub const VALUE_CHANGED: &str = "value-changed";
pub const TOGGLED: &str = "toggled";
pub const SELECT: &str = "select";
pub const DESELECT: &str = "deselect";
pub const POPPED_UP: &str = "popped-up";
pub const MOVE_SCROLL: &str = "move-scroll";

// =============================================================================
// Types
// =============================================================================

/// Signal handler. Receives the emitting node and the event arguments.
pub type Handler = Rc<dyn Fn(NodeId, &[Value])>;

/// Identifies one handler so it can be disconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

struct HandlerRegistry {
    handlers: HashMap<NodeId, Vec<(HandlerId, String, Handler)>>,
    next_id: usize,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }
}

thread_local! {
    static REGISTRY: RefCell<HandlerRegistry> = RefCell::new(HandlerRegistry::new());
}

// =============================================================================
// Public API
// =============================================================================

/// Attach a handler for `signal` on `node`.
///
/// Handlers on dead nodes are dropped immediately and never fire.
pub fn connect(node: NodeId, signal: &str, handler: Handler) -> HandlerId {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        if registry::is_alive(node) {
            reg.handlers
                .entry(node)
                .or_default()
                .push((id, signal.to_string(), handler));
        }
        id
    })
}

pub fn disconnect(node: NodeId, id: HandlerId) {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        if let Some(handlers) = reg.handlers.get_mut(&node) {
            handlers.retain(|(handler_id, _, _)| *handler_id != id);
            if handlers.is_empty() {
                reg.handlers.remove(&node);
            }
        }
    });
}

/// Emit `signal` on `node`. Returns how many handlers ran.
///
/// Handlers are collected before any of them runs, so a handler may connect,
/// disconnect or destroy nodes freely.
pub fn emit(node: NodeId, signal: &str, args: &[Value]) -> usize {
    let handlers: Vec<Handler> = REGISTRY.with(|reg| {
        reg.borrow()
            .handlers
            .get(&node)
            .map(|handlers| {
                handlers
                    .iter()
                    .filter(|(_, name, _)| name == signal)
                    .map(|(_, _, handler)| handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    });

    let mut ran = 0;
    for handler in handlers {
        if !registry::is_alive(node) {
            break;
        }
        handler(node, args);
        ran += 1;
    }
    ran
}

/// Number of handlers attached to `node` (all signals).
pub fn handler_count(node: NodeId) -> usize {
    REGISTRY.with(|reg| reg.borrow().handlers.get(&node).map_or(0, Vec::len))
}

/// Drop every handler of a node. Called when the node is released.
pub fn cleanup_node(node: NodeId) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().handlers.remove(&node);
    });
}

/// Reset all handler state (for testing).
pub fn reset_events() {
    REGISTRY.with(|reg| *reg.borrow_mut() = HandlerRegistry::new());
}

// =============================================================================
// Pointer helpers
// =============================================================================

/// Simulate a pointer press: sets the ACTIVE flag and emits the press signal.
pub fn press(node: NodeId, button: MouseButton) -> usize {
    node.set_flag(NodeFlags::ACTIVE, true);
    emit(node, BUTTON_PRESS, &[Value::from(button.number())])
}

pub fn release(node: NodeId, button: MouseButton) -> usize {
    node.set_flag(NodeFlags::ACTIVE, false);
    emit(node, BUTTON_RELEASE, &[Value::from(button.number())])
}

/// Press and release the primary button, then emit `clicked`.
pub fn click(node: NodeId) {
    press(node, MouseButton::Primary);
    release(node, MouseButton::Primary);
    emit(node, CLICKED, &[]);
}

pub fn scroll(node: NodeId, direction: ScrollDirection) -> usize {
    emit(node, SCROLL, &[Value::from(direction.as_str())])
}

pub fn hover(node: NodeId) -> usize {
    node.set_flag(NodeFlags::PRELIGHT, true);
    emit(node, ENTER, &[])
}

pub fn hover_lost(node: NodeId) -> usize {
    node.set_flag(NodeFlags::PRELIGHT, false);
    emit(node, LEAVE, &[])
}

/// Decode the button number carried by press/release events.
pub fn button_of(args: &[Value]) -> Option<MouseButton> {
    args.first().and_then(Value::as_u64).and_then(MouseButton::from_number)
}

/// Decode the direction carried by scroll events.
pub fn direction_of(args: &[Value]) -> Option<ScrollDirection> {
    match args.first().and_then(Value::as_str) {
        Some("up") => Some(ScrollDirection::Up),
        Some("down") => Some(ScrollDirection::Down),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate, reset_registry};
    use crate::types::NodeKind;
    use std::cell::Cell;

    fn setup() {
        reset_registry();
    }

    #[test]
    fn test_emit_only_matching_signal() {
        setup();

        let node = allocate(NodeKind::Button);
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        connect(node, CLICKED, Rc::new(move |_, _| c.set(c.get() + 1)));

        assert_eq!(emit(node, CLICKED, &[]), 1);
        assert_eq!(emit(node, TOGGLED, &[]), 0);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_disconnect() {
        setup();

        let node = allocate(NodeKind::Button);
        let id = connect(node, CLICKED, Rc::new(|_, _| {}));
        assert_eq!(handler_count(node), 1);

        disconnect(node, id);
        assert_eq!(handler_count(node), 0);
        assert_eq!(emit(node, CLICKED, &[]), 0);
    }

    #[test]
    fn test_handlers_dropped_with_node() {
        setup();

        let node = allocate(NodeKind::Button);
        connect(node, CLICKED, Rc::new(|_, _| {}));
        node.destroy();

        assert_eq!(handler_count(node), 0);
        assert_eq!(emit(node, CLICKED, &[]), 0);
    }

    #[test]
    fn test_handler_may_destroy_node() {
        setup();

        let node = allocate(NodeKind::Button);
        let second_ran = Rc::new(Cell::new(false));
        connect(node, CLICKED, Rc::new(|node, _| node.destroy()));
        let s = second_ran.clone();
        connect(node, CLICKED, Rc::new(move |_, _| s.set(true)));

        assert_eq!(emit(node, CLICKED, &[]), 1);
        assert!(!second_ran.get());
    }

    #[test]
    fn test_press_carries_button() {
        setup();

        let node = allocate(NodeKind::EventBox);
        let seen = Rc::new(Cell::new(None));
        let s = seen.clone();
        connect(node, BUTTON_PRESS, Rc::new(move |_, args| s.set(button_of(args))));

        press(node, MouseButton::Secondary);
        assert_eq!(seen.get(), Some(MouseButton::Secondary));
        assert!(node.flags().contains(NodeFlags::ACTIVE));
    }
}
