//! Node Registry - Slot allocation for the node arena.
//!
//! Manages the lifecycle of nodes:
//! - Generational slots so stale handles never alias new nodes
//! - Free index pool for O(1) reuse
//! - Destroy callbacks per node (timers, subscriptions, handlers)
//! - Recursive release of whole subtrees

use std::cell::RefCell;
use std::collections::HashMap;

use super::events;
use super::node::NodeData;
use crate::types::NodeKind;

// =============================================================================
// Handles
// =============================================================================

/// Handle to a node in the arena.
///
/// Handles are cheap to copy. A handle outlives its node safely: once the
/// node is released every accessor treats the handle as dead, even after the
/// slot has been reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Cleanup function run once, typically when a node is destroyed.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Registry State
// =============================================================================

struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

thread_local! {
    /// Arena storage, indexed by `NodeId::index`.
    static SLOTS: RefCell<Vec<Slot>> = const { RefCell::new(Vec::new()) };

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };

    /// Destroy callbacks registered per node.
    static DESTROY_CALLBACKS: RefCell<HashMap<NodeId, Vec<Cleanup>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate a bare node of the given kind.
pub fn allocate(kind: NodeKind) -> NodeId {
    let data = NodeData::new(kind);

    let reused = FREE_INDICES.with(|free| free.borrow_mut().pop());

    let id = SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        match reused {
            Some(index) => {
                let slot = &mut slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(data);
                NodeId { index, generation: slot.generation }
            }
            None => {
                let index = slots.len() as u32;
                slots.push(Slot { generation: 0, node: Some(data) });
                NodeId { index, generation: 0 }
            }
        }
    });

    tracing::trace!(node = ?id, %kind, "allocated node");
    id
}

/// Release a node and, recursively, all of its children.
///
/// Children go first, then the node's destroy callbacks run, then the node
/// is detached from its parent and its slot returns to the pool.
pub fn release(id: NodeId) {
    let Some(children) = with_node(id, |node| node.children.clone()) else {
        return;
    };

    for child in children {
        release(child);
    }

    run_destroy_callbacks(id);
    events::cleanup_node(id);

    let parent = with_node(id, |node| node.parent).flatten();
    if let Some(parent) = parent {
        with_node_mut(parent, |node| node.children.retain(|c| *c != id));
    }

    SLOTS.with(|slots| {
        if let Some(slot) = slots.borrow_mut().get_mut(id.index()) {
            slot.node = None;
        }
    });
    FREE_INDICES.with(|free| free.borrow_mut().push(id.index));

    tracing::trace!(node = ?id, "released node");
}

// =============================================================================
// Access
// =============================================================================

/// Whether the handle still refers to a live node.
pub fn is_alive(id: NodeId) -> bool {
    SLOTS.with(|slots| {
        slots
            .borrow()
            .get(id.index())
            .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
    })
}

/// Read a node. Returns `None` for dead handles.
///
/// The closure must not call back into the registry mutably.
pub fn with_node<R>(id: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
    SLOTS.with(|slots| {
        let slots = slots.borrow();
        let slot = slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref().map(f)
    })
}

/// Mutate a node. Returns `None` for dead handles.
pub fn with_node_mut<R>(id: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
    SLOTS.with(|slots| {
        let mut slots = slots.borrow_mut();
        let slot = slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut().map(f)
    })
}

/// Count of currently allocated nodes.
pub fn allocated_count() -> usize {
    SLOTS.with(|slots| slots.borrow().iter().filter(|s| s.node.is_some()).count())
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the node is destroyed.
///
/// Registering on a dead handle runs the callback immediately, so resources
/// bound to an already destroyed node are never leaked.
pub fn on_destroy(id: NodeId, callback: impl FnOnce() + 'static) {
    if !is_alive(id) {
        callback();
        return;
    }
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(id)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear destroy callbacks for a node.
fn run_destroy_callbacks(id: NodeId) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&id));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    SLOTS.with(|slots| slots.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    events::reset_events();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn setup() {
        reset_registry();
    }

    #[test]
    fn test_allocate() {
        setup();

        let a = allocate(NodeKind::Box);
        let b = allocate(NodeKind::Label);

        assert_ne!(a, b);
        assert!(is_alive(a));
        assert!(is_alive(b));
        assert_eq!(allocated_count(), 2);
    }

    #[test]
    fn test_release_and_reuse_bumps_generation() {
        setup();

        let a = allocate(NodeKind::Box);
        release(a);
        assert!(!is_alive(a));

        let b = allocate(NodeKind::Box);
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(!is_alive(a));
        assert!(is_alive(b));
    }

    #[test]
    fn test_release_is_recursive() {
        setup();

        let parent = allocate(NodeKind::Box);
        let child = allocate(NodeKind::Box);
        let grandchild = allocate(NodeKind::Label);
        parent.add(child);
        child.add(grandchild);

        release(parent);
        assert!(!is_alive(child));
        assert!(!is_alive(grandchild));
        assert_eq!(allocated_count(), 0);
    }

    #[test]
    fn test_destroy_callback() {
        setup();

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let id = allocate(NodeKind::Label);
        on_destroy(id, move || called_clone.set(true));

        assert!(!called.get());
        release(id);
        assert!(called.get());
    }

    #[test]
    fn test_destroy_callback_on_dead_handle_runs_now() {
        setup();

        let id = allocate(NodeKind::Label);
        release(id);

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();
        on_destroy(id, move || called_clone.set(true));
        assert!(called.get());
    }

    #[test]
    fn test_children_destroy_before_parent() {
        setup();

        let order = Rc::new(RefCell::new(Vec::new()));
        let parent = allocate(NodeKind::Box);
        let child = allocate(NodeKind::Label);
        parent.add(child);

        let o = order.clone();
        on_destroy(parent, move || o.borrow_mut().push("parent"));
        let o = order.clone();
        on_destroy(child, move || o.borrow_mut().push("child"));

        release(parent);
        assert_eq!(*order.borrow(), vec!["child", "parent"]);
    }
}
