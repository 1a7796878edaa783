//! Node engine - the arena every resolved spec lives in.
//!
//! The engine manages the core data structures:
//! - Registry: generational slot allocation, destroy callbacks
//! - Node: per-node record and the mutators available on every handle
//! - Events: named signal handlers per node
//! - Timer: the single-threaded clock driving interval connections
//!
//! # Architecture
//!
//! Nodes are NOT shared objects. They are slots in a thread-local arena,
//! addressed by copyable [`NodeId`] handles:
//!
//! ```text
//! Slot 0: Box   (parent=None, children=[1, 2], classes=["bar"])
//! Slot 1: Label (parent=0,    text="12:00")
//! Slot 2: Icon  (parent=0,    icon="firefox")
//! ```
//!
//! Destroying a slot destroys its subtree and runs every destroy callback
//! rooted there, which is how timers and service subscriptions end.

mod registry;
mod node;
pub mod events;
pub mod timer;

pub use registry::*;
pub use node::*;
