//! Workspace switcher.
//!
//! Renders one button per workspace slot inside a box. Slots come either
//! from a fixed count (`fixed: 5` gives 1..=5 whether or not those
//! workspaces exist) or from the workspaces living on an allow-listed set of
//! monitors (`monitors: ["DP-1", 1]`). Each button carries exactly one of
//! the classes `active`, `occupied` or `empty`.

use std::rc::Rc;

use serde_json::Value;

use super::{FullRebuild, Reconciler};
use crate::command::Command;
use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;
use crate::service::hyprland::{Hyprland, HyprlandState, Monitor};
use crate::spec::{Declaration, FieldSpec, FieldType, Fields, Resolver, Spec, field};
use crate::widgets::containers;

pub const WORKSPACES_FIELDS: &[FieldSpec] = &[
    field("orientation", FieldType::Str),
    field("homogeneous", FieldType::Bool),
    field("fixed", FieldType::Number),
    field("monitors", FieldType::Array),
    field("active", FieldType::Spec),
    field("occupied", FieldType::Spec),
    field("empty", FieldType::Spec),
];

// =============================================================================
// Slots
// =============================================================================

/// Entry of a `monitors` allow-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorRef {
    Name(String),
    Id(i64),
}

impl MonitorRef {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(MonitorRef::Name(name.clone())),
            Value::Number(id) => id.as_i64().map(MonitorRef::Id),
            _ => None,
        }
    }

    fn accepts(&self, name: &str, monitor: Option<&Monitor>) -> bool {
        match self {
            MonitorRef::Name(wanted) => wanted == name,
            MonitorRef::Id(wanted) => monitor.is_some_and(|m| m.id == *wanted),
        }
    }
}

/// Upper bound for `fixed`.
pub const MAX_FIXED: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceMode {
    Fixed(u32),
    Monitors(Vec<MonitorRef>),
}

impl WorkspaceMode {
    /// `fixed` wins when both are given. A zero count reads as absent; a
    /// fractional or out-of-range count is reported and ignored.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        if let Some(count) = fields.number("fixed").filter(|count| *count != 0.0) {
            if count.fract() == 0.0 && (1.0..=f64::from(MAX_FIXED)).contains(&count) {
                return Some(WorkspaceMode::Fixed(count as u32));
            }
            diagnostics::report(Diagnostic::InvalidValue {
                field: "fixed".to_string(),
                value: count.to_string(),
            });
        }

        let entries = fields.array("monitors")?;
        let allowed = entries
            .iter()
            .filter_map(|entry| {
                let parsed = MonitorRef::from_value(entry);
                if parsed.is_none() {
                    diagnostics::report(Diagnostic::InvalidValue {
                        field: "monitors".to_string(),
                        value: entry.to_string(),
                    });
                }
                parsed
            })
            .collect();
        Some(WorkspaceMode::Monitors(allowed))
    }

    /// Workspace ids to render, in order.
    pub fn slots(&self, state: &HyprlandState) -> Vec<i64> {
        match self {
            WorkspaceMode::Fixed(count) => (1..=i64::from(*count)).collect(),
            WorkspaceMode::Monitors(allowed) => state
                .workspaces
                .values()
                .filter(|ws| {
                    let monitor = state.monitor(&ws.monitor);
                    allowed.iter().any(|entry| entry.accepts(&ws.monitor, monitor))
                })
                .map(|ws| ws.id)
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotClass {
    Active,
    Occupied,
    Empty,
}

impl SlotClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotClass::Active => "active",
            SlotClass::Occupied => "occupied",
            SlotClass::Empty => "empty",
        }
    }
}

/// Active beats occupied beats empty. Unknown workspaces are empty.
pub fn classify(state: &HyprlandState, id: i64) -> SlotClass {
    if state.active.workspace.id == id {
        SlotClass::Active
    } else if state.workspace(id).is_some_and(|ws| ws.windows > 0) {
        SlotClass::Occupied
    } else {
        SlotClass::Empty
    }
}

// =============================================================================
// Renderer
// =============================================================================

struct SlotSpecs {
    active: Option<Spec>,
    occupied: Option<Spec>,
    empty: Option<Spec>,
}

impl SlotSpecs {
    fn child(&self, class: SlotClass) -> Option<&Spec> {
        match class {
            SlotClass::Active => self.active.as_ref(),
            SlotClass::Occupied => self.occupied.as_ref(),
            SlotClass::Empty => self.empty.as_ref(),
        }
    }
}

fn slot_spec(hyprland: &Hyprland, state: &HyprlandState, specs: &SlotSpecs, id: i64) -> Spec {
    let class = classify(state, id);
    let child = specs.child(class).cloned().unwrap_or_else(|| {
        let name = state.workspace(id).map(|ws| ws.name.as_str()).unwrap_or_default();
        if name.is_empty() {
            Spec::Text(id.to_string())
        } else {
            Spec::Text(name.to_string())
        }
    });

    let hyprland = hyprland.clone();
    Declaration::new("button")
        .class_name(class.as_str())
        .field("child", child)
        .field(
            "onClick",
            Command::callback(move |_, _| hyprland.hyprctl(&format!("dispatch workspace {id}"))),
        )
        .into()
}

/// Box of workspace buttons, rebuilt on every compositor change.
///
/// Without `fixed` or `monitors` the box is reported and returned unbound.
pub fn build_workspaces(resolver: &Resolver, hyprland: &Hyprland, tag: &str, fields: &Fields) -> NodeId {
    let node = containers::build_box(resolver, tag, fields);

    let Some(mode) = WorkspaceMode::from_fields(fields) else {
        diagnostics::report(Diagnostic::MissingWorkspaceMode(tag.to_string()));
        return node;
    };

    let specs = Rc::new(SlotSpecs {
        active: fields.spec("active"),
        occupied: fields.spec("occupied"),
        empty: fields.spec("empty"),
    });
    let resolver = resolver.clone();
    let service = hyprland.clone();
    hyprland.connect(node, move |node, state| {
        let children: Vec<Spec> = mode
            .slots(state)
            .into_iter()
            .map(|id| slot_spec(&service, state, &specs, id))
            .collect();
        FullRebuild.reconcile(&resolver, node, &children);
    });
    node
}
