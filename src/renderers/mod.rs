//! Service-bound composite renderers.
//!
//! Each renderer is a builder that returns one node and binds it to a
//! service. Whenever the service notifies, the renderer reads the snapshot
//! it was handed and brings the node up to date. Renderers with children
//! rebuild them from scratch through a [`Reconciler`]; no child of a
//! previous pass survives.
//!
//! - [`workspaces`] - one button per workspace slot
//! - [`window_label`] - title or class of the focused client
//! - [`window_icon`] - icon for the focused client
//! - [`taskbar`] - one entry per client with a matching application
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::renderers::register_hyprland;
//!
//! let resolver = Resolver::new(config);
//! register_hyprland(&resolver, &Hyprland::from_process(), &Applications::scan(&dirs));
//!
//! let bar = resolver.resolve_value(&json!({
//!     "type": "hyprland/workspaces",
//!     "fixed": 5,
//! }));
//! ```

pub mod taskbar;
pub mod window_icon;
pub mod window_label;
pub mod workspaces;

use serde_json::Value;

use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;
use crate::service::applications::Applications;
use crate::service::hyprland::Hyprland;
use crate::spec::{Fields, Resolver, Spec};
use crate::widgets::Builder;

pub const WORKSPACES: &str = "hyprland/workspaces";
pub const WINDOW_LABEL: &str = "hyprland/window-label";
pub const WINDOW_ICON: &str = "hyprland/window-icon";
pub const TASKBAR: &str = "hyprland/taskbar";

/// Register every Hyprland renderer on `resolver`.
pub fn register_hyprland(resolver: &Resolver, hyprland: &Hyprland, apps: &Applications) {
    let service = hyprland.clone();
    resolver.register(
        WORKSPACES,
        Builder::new(workspaces::WORKSPACES_FIELDS, move |resolver, tag, fields| {
            workspaces::build_workspaces(resolver, &service, tag, fields)
        }),
    );

    let service = hyprland.clone();
    resolver.register(
        WINDOW_LABEL,
        Builder::new(window_label::WINDOW_LABEL_FIELDS, move |resolver, tag, fields| {
            window_label::build_window_label(resolver, &service, tag, fields)
        }),
    );

    let service = hyprland.clone();
    resolver.register(
        WINDOW_ICON,
        Builder::new(window_icon::WINDOW_ICON_FIELDS, move |resolver, tag, fields| {
            window_icon::build_window_icon(resolver, &service, tag, fields)
        }),
    );

    let service = hyprland.clone();
    let apps = apps.clone();
    resolver.register(
        TASKBAR,
        Builder::new(taskbar::TASKBAR_FIELDS, move |resolver, tag, fields| {
            taskbar::build_taskbar(resolver, &service, &apps, tag, fields)
        }),
    );

    tracing::debug!("registered hyprland renderers");
}

// =============================================================================
// Substitutions
// =============================================================================

/// Exact-match replacement of a displayed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

/// Read `{from, to}` entries from the array field `name`.
///
/// Entries without string `from` and `to` are reported and skipped.
pub fn substitutions(fields: &Fields, name: &str) -> Vec<Substitution> {
    let Some(entries) = fields.array(name) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let from = entry.get("from").and_then(Value::as_str);
            let to = entry.get("to").and_then(Value::as_str);
            match (from, to) {
                (Some(from), Some(to)) => Some(Substitution {
                    from: from.to_string(),
                    to: to.to_string(),
                }),
                _ => {
                    diagnostics::report(Diagnostic::InvalidValue {
                        field: name.to_string(),
                        value: entry.to_string(),
                    });
                    None
                }
            }
        })
        .collect()
}

/// Replace `value` by the first rule whose `from` equals it. Not chained.
pub fn substitute(value: &str, rules: &[Substitution]) -> String {
    rules
        .iter()
        .find(|rule| rule.from == value)
        .map_or_else(|| value.to_string(), |rule| rule.to.clone())
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Brings a container's children in line with freshly built specs.
///
/// Implementations must leave no child of a previous pass attached.
pub trait Reconciler {
    fn reconcile(&self, resolver: &Resolver, container: NodeId, specs: &[Spec]);
}

/// Destroy every child, resolve the specs, append them and show the subtree.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullRebuild;

impl Reconciler for FullRebuild {
    fn reconcile(&self, resolver: &Resolver, container: NodeId, specs: &[Spec]) {
        container.clear_children();
        for child in resolver.resolve_all(specs) {
            container.add(child);
        }
        container.show_all();
        tracing::trace!(node = ?container, children = specs.len(), "rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::diagnostics::{reset_diagnostics, warning_count};
    use crate::engine::{allocate, reset_registry};
    use crate::icons::IconSet;
    use crate::types::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::rc::Rc;

    fn rules() -> Vec<Substitution> {
        let fields = Fields::new().with(
            "substitutes",
            json!([
                { "from": "a", "to": "b" },
                { "from": "b", "to": "c" },
                { "from": "a", "to": "z" },
            ]),
        );
        substitutions(&fields, "substitutes")
    }

    #[test]
    fn test_first_substitution_wins_without_chaining() {
        let rules = rules();
        assert_eq!(substitute("a", &rules), "b");
        assert_eq!(substitute("b", &rules), "c");
        assert_eq!(substitute("x", &rules), "x");
    }

    #[test]
    fn test_malformed_substitution_reported() {
        reset_diagnostics();
        let fields = Fields::new().with("substitutes", json!([{ "from": "a" }, { "from": "x", "to": "y" }]));

        let rules = substitutions(&fields, "substitutes");
        assert_eq!(rules.len(), 1);
        assert_eq!(warning_count(), 1);
    }

    #[test]
    fn test_full_rebuild_leaves_no_stale_children() {
        reset_registry();
        let resolver = Resolver::with_parts(
            EngineConfig::default(),
            Rc::new(CapturingExecutor::new()),
            Rc::new(IconSet::default()),
        );
        let container = allocate(NodeKind::Box);

        FullRebuild.reconcile(&resolver, container, &[Spec::from("a"), Spec::from("b")]);
        let first = container.children();
        FullRebuild.reconcile(&resolver, container, &[Spec::from("c")]);

        assert!(first.iter().all(|child| !child.is_alive()));
        let labels: Vec<Option<String>> = container.children().iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec![Some("c".to_string())]);
        assert!(container.children()[0].is_visible());
    }
}
