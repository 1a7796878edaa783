//! Node data and the mutators available on every node handle.
//!
//! A node is a plain record in the arena: kind, tree links, flags, class
//! tokens, the single user-priority style rule, tooltip, metadata
//! properties, and a kind-specific state block filled in by the builder.
//!
//! Mutators live on [`NodeId`] so they are available to any code holding a
//! handle: `setup` hooks, connection callbacks, composite renderers.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use super::registry::{self, NodeId};
use crate::diagnostics::{self, Diagnostic};
use crate::types::{Align, Justification, NodeFlags, NodeKind, Orientation, Position, ScrollPolicy, Transition};

// =============================================================================
// Kind-specific State
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct LabelState {
    pub text: String,
    pub markup: bool,
    pub ellipsize: bool,
    pub wrap: bool,
    pub max_width_chars: i32,
    pub angle: f64,
    pub justify: Justification,
    pub xalign: f64,
    pub yalign: f64,
}

impl Default for LabelState {
    fn default() -> Self {
        Self {
            text: String::new(),
            markup: false,
            ellipsize: false,
            wrap: false,
            max_width_chars: -1,
            angle: 0.0,
            justify: Justification::Center,
            xalign: 0.5,
            yalign: 0.5,
        }
    }
}

/// Where an icon's pixels come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconSource {
    /// Theme icon name.
    Named(String),
    /// Image file on disk.
    File(PathBuf),
}

impl IconSource {
    /// The theme name or the file path as text.
    pub fn as_name(&self) -> String {
        match self {
            IconSource::Named(name) => name.clone(),
            IconSource::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IconState {
    pub source: IconSource,
    pub size: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliderState {
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub step: f64,
    pub orientation: Orientation,
    pub inverted: bool,
    pub draw_value: bool,
    /// Set while the user is interacting; only user changes fire `onChange`.
    pub dragging: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackState {
    pub pages: Vec<(String, NodeId)>,
    pub visible_child: Option<String>,
    pub transition: Transition,
    pub duration_ms: u32,
    pub hhomogeneous: bool,
    pub vhomogeneous: bool,
    pub interpolate_size: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum KindState {
    /// Buttons, event boxes: nothing beyond the child.
    #[default]
    Plain,
    Container {
        orientation: Orientation,
        homogeneous: bool,
    },
    Label(LabelState),
    Icon(IconState),
    Slider(SliderState),
    ProgressBar {
        fraction: f64,
        orientation: Orientation,
        inverted: bool,
    },
    Entry {
        text: String,
        placeholder: String,
        password: bool,
    },
    Stack(StackState),
    Revealer {
        reveal: bool,
        transition: Transition,
        duration_ms: u32,
    },
    Scrollable {
        hscroll: ScrollPolicy,
        vscroll: ScrollPolicy,
    },
    Switch {
        active: bool,
    },
    Overlay {
        passthrough: bool,
    },
    Popover {
        position: Position,
        modal: bool,
    },
    MenuButton {
        popover: Option<NodeId>,
        popup: Option<NodeId>,
    },
    Menu {
        x_offset: f64,
        y_offset: f64,
    },
    MenuItem {
        submenu: Option<NodeId>,
    },
}

// =============================================================================
// Node Data
// =============================================================================

#[derive(Clone, Debug)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub flags: NodeFlags,
    pub halign: Align,
    pub valign: Align,
    pub class_names: Vec<String>,
    pub user_style: Option<String>,
    pub tooltip: Option<String>,
    /// Author metadata from the `properties` field, kept apart from native attributes.
    pub properties: HashMap<String, Value>,
    pub state: KindState,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            flags: NodeFlags::default(),
            halign: Align::Fill,
            valign: Align::Fill,
            class_names: Vec::new(),
            user_style: None,
            tooltip: None,
            properties: HashMap::new(),
            state: KindState::default(),
        }
    }
}

// =============================================================================
// Handle API
// =============================================================================

impl NodeId {
    pub fn is_alive(self) -> bool {
        registry::is_alive(self)
    }

    pub fn kind(self) -> Option<NodeKind> {
        registry::with_node(self, |n| n.kind)
    }

    /// Destroy this node and its whole subtree.
    pub fn destroy(self) {
        registry::release(self);
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    pub fn parent(self) -> Option<NodeId> {
        registry::with_node(self, |n| n.parent).flatten()
    }

    pub fn children(self) -> Vec<NodeId> {
        registry::with_node(self, |n| n.children.clone()).unwrap_or_default()
    }

    /// Append a child. A child that already has a parent is moved, never shared.
    ///
    /// Adding a node under itself or under one of its descendants is refused
    /// and reported; the tree stays acyclic.
    pub fn add(self, child: NodeId) {
        if !self.is_alive() || !child.is_alive() {
            return;
        }
        if child == self || child.is_ancestor_of(self) {
            diagnostics::report(Diagnostic::TreeCycle {
                parent: self.index(),
                child: child.index(),
            });
            return;
        }
        if let Some(old) = child.parent() {
            old.remove(child);
        }
        registry::with_node_mut(self, |n| n.children.push(child));
        registry::with_node_mut(child, |n| n.parent = Some(self));
    }

    /// Whether `self` sits on the parent chain of `node`.
    pub fn is_ancestor_of(self, node: NodeId) -> bool {
        let mut current = node.parent();
        while let Some(parent) = current {
            if parent == self {
                return true;
            }
            current = parent.parent();
        }
        false
    }

    /// Detach a child without destroying it.
    pub fn remove(self, child: NodeId) {
        registry::with_node_mut(self, |n| n.children.retain(|c| *c != child));
        registry::with_node_mut(child, |n| {
            if n.parent == Some(self) {
                n.parent = None;
            }
        });
    }

    /// Destroy every current child.
    pub fn clear_children(self) {
        for child in self.children() {
            child.destroy();
        }
    }

    // -------------------------------------------------------------------------
    // Flags
    // -------------------------------------------------------------------------

    pub fn flags(self) -> NodeFlags {
        registry::with_node(self, |n| n.flags).unwrap_or(NodeFlags::empty())
    }

    pub fn set_flag(self, flag: NodeFlags, on: bool) {
        registry::with_node_mut(self, |n| n.flags.set(flag, on));
    }

    pub fn is_visible(self) -> bool {
        self.flags().contains(NodeFlags::VISIBLE)
    }

    pub fn set_visible(self, visible: bool) {
        self.set_flag(NodeFlags::VISIBLE, visible);
    }

    pub fn show(self) {
        self.set_visible(true);
    }

    pub fn hide(self) {
        self.set_visible(false);
    }

    /// Make this node and its whole subtree visible.
    pub fn show_all(self) {
        self.show();
        for child in self.children() {
            child.show_all();
        }
    }

    pub fn hexpand(self) -> bool {
        self.flags().contains(NodeFlags::HEXPAND)
    }

    pub fn set_hexpand(self, expand: bool) {
        self.set_flag(NodeFlags::HEXPAND, expand);
    }

    pub fn vexpand(self) -> bool {
        self.flags().contains(NodeFlags::VEXPAND)
    }

    pub fn set_vexpand(self, expand: bool) {
        self.set_flag(NodeFlags::VEXPAND, expand);
    }

    pub fn is_sensitive(self) -> bool {
        self.flags().contains(NodeFlags::SENSITIVE)
    }

    pub fn set_sensitive(self, sensitive: bool) {
        self.set_flag(NodeFlags::SENSITIVE, sensitive);
    }

    // -------------------------------------------------------------------------
    // Alignment
    // -------------------------------------------------------------------------

    pub fn halign(self) -> Align {
        registry::with_node(self, |n| n.halign).unwrap_or_default()
    }

    pub fn set_halign(self, align: Align) {
        registry::with_node_mut(self, |n| n.halign = align);
    }

    pub fn valign(self) -> Align {
        registry::with_node(self, |n| n.valign).unwrap_or_default()
    }

    pub fn set_valign(self, align: Align) {
        registry::with_node_mut(self, |n| n.valign = align);
    }

    // -------------------------------------------------------------------------
    // Class names
    // -------------------------------------------------------------------------

    pub fn class_names(self) -> Vec<String> {
        registry::with_node(self, |n| n.class_names.clone()).unwrap_or_default()
    }

    pub fn has_class(self, name: &str) -> bool {
        registry::with_node(self, |n| n.class_names.iter().any(|c| c == name)).unwrap_or(false)
    }

    /// Set or unset one class token. Setting twice is a no-op.
    pub fn toggle_class_name(self, name: &str, condition: bool) {
        if name.is_empty() {
            return;
        }
        registry::with_node_mut(self, |n| {
            let present = n.class_names.iter().any(|c| c == name);
            if condition && !present {
                n.class_names.push(name.to_string());
            } else if !condition && present {
                n.class_names.retain(|c| c != name);
            }
        });
    }

    // -------------------------------------------------------------------------
    // Style / tooltip / metadata
    // -------------------------------------------------------------------------

    /// Replace the node's user-priority style rule with `css`.
    pub fn set_style(self, css: &str) {
        let css = css.trim();
        registry::with_node_mut(self, |n| {
            n.user_style = (!css.is_empty()).then(|| css.to_string());
        });
    }

    pub fn style(self) -> Option<String> {
        registry::with_node(self, |n| n.user_style.clone()).flatten()
    }

    /// The user style wrapped as a rule for the node itself.
    pub fn style_rule(self) -> Option<String> {
        self.style().map(|css| format!("* {{ {css} }}"))
    }

    pub fn tooltip(self) -> Option<String> {
        registry::with_node(self, |n| n.tooltip.clone()).flatten()
    }

    pub fn set_tooltip(self, text: &str) {
        registry::with_node_mut(self, |n| n.tooltip = Some(text.to_string()));
    }

    pub fn property(self, key: &str) -> Option<Value> {
        registry::with_node(self, |n| n.properties.get(key).cloned()).flatten()
    }

    pub fn set_property(self, key: &str, value: Value) {
        registry::with_node_mut(self, |n| {
            n.properties.insert(key.to_string(), value);
        });
    }

    // -------------------------------------------------------------------------
    // Kind-specific state
    // -------------------------------------------------------------------------

    pub fn state(self) -> Option<KindState> {
        registry::with_node(self, |n| n.state.clone())
    }

    pub fn set_state(self, state: KindState) {
        registry::with_node_mut(self, |n| n.state = state);
    }

    pub fn update_state<R>(self, f: impl FnOnce(&mut KindState) -> R) -> Option<R> {
        registry::with_node_mut(self, |n| f(&mut n.state))
    }

    /// Text of a label node.
    pub fn label(self) -> Option<String> {
        registry::with_node(self, |n| match &n.state {
            KindState::Label(label) => Some(label.text.clone()),
            _ => None,
        })
        .flatten()
    }

    /// Replace a label's text. Returns false for non-label nodes.
    pub fn set_label(self, text: &str) -> bool {
        self.update_state(|state| match state {
            KindState::Label(label) => {
                label.text = text.to_string();
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }

    pub fn icon(self) -> Option<IconSource> {
        registry::with_node(self, |n| match &n.state {
            KindState::Icon(icon) => Some(icon.source.clone()),
            _ => None,
        })
        .flatten()
    }

    /// Point an icon node at a theme icon. Returns false for non-icon nodes.
    pub fn set_icon_name(self, name: &str) -> bool {
        self.update_state(|state| match state {
            KindState::Icon(icon) => {
                icon.source = IconSource::Named(name.to_string());
                true
            }
            _ => false,
        })
        .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate, reset_registry};

    fn setup() {
        reset_registry();
    }

    #[test]
    fn test_toggle_class_name_is_idempotent() {
        setup();

        let node = allocate(NodeKind::Box);
        node.toggle_class_name("active", true);
        node.toggle_class_name("active", true);
        assert_eq!(node.class_names(), vec!["active".to_string()]);

        node.toggle_class_name("active", false);
        node.toggle_class_name("active", false);
        assert!(node.class_names().is_empty());
    }

    #[test]
    fn test_set_style_replaces_rule() {
        setup();

        let node = allocate(NodeKind::Box);
        node.set_style("color: red;");
        node.set_style("color: blue;");
        assert_eq!(node.style().as_deref(), Some("color: blue;"));
        assert_eq!(node.style_rule().as_deref(), Some("* { color: blue; }"));

        node.set_style("  ");
        assert_eq!(node.style(), None);
    }

    #[test]
    fn test_add_moves_child_between_parents() {
        setup();

        let first = allocate(NodeKind::Box);
        let second = allocate(NodeKind::Box);
        let child = allocate(NodeKind::Label);

        first.add(child);
        second.add(child);

        assert!(first.children().is_empty());
        assert_eq!(second.children(), vec![child]);
        assert_eq!(child.parent(), Some(second));
    }

    #[test]
    fn test_clear_children_destroys() {
        setup();

        let parent = allocate(NodeKind::Box);
        let a = allocate(NodeKind::Label);
        let b = allocate(NodeKind::Label);
        parent.add(a);
        parent.add(b);

        parent.clear_children();
        assert!(parent.children().is_empty());
        assert!(!a.is_alive());
        assert!(!b.is_alive());
    }

    #[test]
    fn test_show_all_reaches_subtree() {
        setup();

        let parent = allocate(NodeKind::Box);
        let child = allocate(NodeKind::Label);
        parent.add(child);
        parent.hide();
        child.hide();

        parent.show_all();
        assert!(parent.is_visible());
        assert!(child.is_visible());
    }

    #[test]
    fn test_dead_handle_reads_as_empty() {
        setup();

        let node = allocate(NodeKind::Label);
        node.destroy();

        assert_eq!(node.kind(), None);
        assert!(!node.is_visible());
        assert!(node.class_names().is_empty());
        assert!(!node.set_label("x"));
    }

    #[test]
    fn test_add_refuses_ancestor() {
        setup();
        crate::diagnostics::reset_diagnostics();

        let root = allocate(NodeKind::Box);
        let middle = allocate(NodeKind::Box);
        let leaf = allocate(NodeKind::Box);
        root.add(middle);
        middle.add(leaf);

        leaf.add(root);
        leaf.add(leaf);

        assert_eq!(root.parent(), None);
        assert!(leaf.children().is_empty());
        assert!(root.is_ancestor_of(leaf));
        assert!(!leaf.is_ancestor_of(root));
        assert_eq!(crate::diagnostics::error_count(), 2);

        root.show_all();
        root.destroy();
        assert!(!leaf.is_alive());
    }
}
