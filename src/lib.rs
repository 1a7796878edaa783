//! # spark-shell
//!
//! Declarative widget engine for desktop shells.
//!
//! Widgets are described as plain data ("specs") and resolved into live,
//! mutable nodes. Resolution wires styling, layout flags, signal handlers,
//! intervals and service subscriptions. On top of the engine, composite
//! renderers bind whole subtrees to compositor state and rebuild them on
//! every change.
//!
//! ## Architecture
//!
//! Nodes are generational indices into a thread-local arena rather than
//! objects. Destroying a node runs its destroy callbacks, which is how
//! intervals, signal handlers and service subscriptions end.
//!
//! ```text
//! Spec → Resolver → Builder (kind fields) → apply (universal fields) → Node
//!                                              ↑
//!                        Service::connect ─────┘ (full rebuild on change)
//! ```
//!
//! ## Modules
//!
//! - [`spec`] - Spec types, resolver and attribute applicator
//! - [`widgets`] - Builder registry and the built-in kinds
//! - [`renderers`] - Workspaces, window label/icon and taskbar
//! - [`service`] - Service hub, Hyprland and applications
//! - [`engine`] - Node arena, signals and timers
//! - [`layout`] - Taffy flexbox geometry for resolved trees
//! - [`diagnostics`] - Fail-soft error reports

pub mod command;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod icons;
pub mod layout;
pub mod logging;
pub mod renderers;
pub mod service;
pub mod spec;
pub mod types;
pub mod widgets;

// Re-export commonly used items
pub use types::*;

pub use command::{CapturingExecutor, Command, Executor, ShellExecutor};
pub use config::{ConfigError, EngineConfig};
pub use diagnostics::{Diagnostic, Severity};
pub use engine::{Cleanup, NodeId, allocate, on_destroy, reset_registry};
pub use icons::{IconIndex, IconSet, IconTheme};
pub use layout::{ComputedLayout, LayoutError, Rect, compute_layout};
pub use renderers::{FullRebuild, Reconciler, Substitution, register_hyprland};
pub use service::applications::{Application, Applications};
pub use service::hyprland::{Hyprland, HyprlandState};
pub use service::{Connectable, Service, ServiceError};
pub use spec::{Common, Connection, Declaration, Fields, Prop, Resolver, Spec, TypeRef};
pub use widgets::{Builder, Registry};
