//! Container builders: nodes whose main job is holding other nodes.

use serde_json::Value;

use super::{add_child, add_children, parse_token};
use crate::diagnostics::{self, Diagnostic};
use crate::engine::{KindState, NodeId, StackState, allocate};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, Spec, field};
use crate::types::{NodeKind, Orientation, ScrollPolicy, Transition};

/// Metadata key holding the comparison value of a dynamic item.
pub const DYNAMIC_VALUE: &str = "value";

// =============================================================================
// Box / CenterBox
// =============================================================================

pub const BOX_FIELDS: &[FieldSpec] = &[
    field("orientation", FieldType::Str),
    field("homogeneous", FieldType::Bool),
    field("children", FieldType::Specs),
];

fn container(kind: NodeKind, fields: &Fields) -> NodeId {
    let node = allocate(kind);
    node.set_state(KindState::Container {
        orientation: parse_token(fields, "orientation", Orientation::parse).unwrap_or_default(),
        homogeneous: fields.bool("homogeneous").unwrap_or(false),
    });
    node
}

pub fn build_box(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = container(NodeKind::Box, fields);
    add_children(resolver, node, fields, "children");
    node
}

/// Start, center and end child. Any other count is reported; the children
/// that were given are still packed in order.
pub fn build_center_box(resolver: &Resolver, tag: &str, fields: &Fields) -> NodeId {
    let node = container(NodeKind::CenterBox, fields);
    let got = fields.specs("children").len();
    if got != 3 {
        diagnostics::report(Diagnostic::ChildCount {
            kind: tag.to_string(),
            expected: 3,
            got,
        });
    }
    add_children(resolver, node, fields, "children");
    node
}

// =============================================================================
// Dynamic
// =============================================================================

pub const DYNAMIC_FIELDS: &[FieldSpec] = &[field("items", FieldType::Items)];

/// A box of hidden items, each tagged with the value it stands for.
pub fn build_dynamic(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Dynamic);
    node.set_state(KindState::Container {
        orientation: Orientation::Horizontal,
        homogeneous: false,
    });

    for item in fields.items("items") {
        if matches!(item.widget, Spec::Null) {
            continue;
        }
        let child = resolver.resolve(&item.widget);
        child.set_property(DYNAMIC_VALUE, item.value);
        child.hide();
        node.add(child);
    }
    node
}

/// Show the first item whose value satisfies `condition` and hide the rest.
///
/// The dynamic node itself is hidden when nothing matches.
pub fn dynamic_update(node: NodeId, condition: impl Fn(&Value) -> bool) -> Option<NodeId> {
    node.hide();
    let children = node.children();
    for child in &children {
        child.hide();
    }

    let shown = children
        .into_iter()
        .find(|child| condition(&child.property(DYNAMIC_VALUE).unwrap_or(Value::Null)))?;
    node.show();
    shown.show();
    Some(shown)
}

// =============================================================================
// Stack
// =============================================================================

pub const STACK_FIELDS: &[FieldSpec] = &[
    field("items", FieldType::Named),
    field("hhomogeneous", FieldType::Bool),
    field("vhomogeneous", FieldType::Bool),
    field("interpolateSize", FieldType::Bool),
    field("transition", FieldType::Str),
    field("transitionDuration", FieldType::Number),
];

pub fn build_stack(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Stack);
    let mut state = StackState {
        transition: parse_token(fields, "transition", Transition::parse).unwrap_or_default(),
        duration_ms: fields.number("transitionDuration").map_or(200, |ms| ms.max(0.0) as u32),
        hhomogeneous: fields.bool("hhomogeneous").unwrap_or(true),
        vhomogeneous: fields.bool("vhomogeneous").unwrap_or(true),
        interpolate_size: fields.bool("interpolateSize").unwrap_or(false),
        ..Default::default()
    };

    for (name, spec) in fields.named("items") {
        if matches!(spec, Spec::Null) {
            continue;
        }
        let child = resolver.resolve(&spec);
        node.add(child);
        state.pages.push((name, child));
    }
    state.visible_child = state.pages.first().map(|(name, _)| name.clone());

    node.set_state(KindState::Stack(state));
    node
}

/// Switch the visible page. Unknown names hide the whole stack.
pub fn stack_show_child(node: NodeId, name: &str) -> bool {
    node.show();
    let found = node
        .update_state(|state| match state {
            KindState::Stack(stack) if stack.pages.iter().any(|(page, _)| page == name) => {
                stack.visible_child = Some(name.to_string());
                true
            }
            _ => false,
        })
        .unwrap_or(false);

    if !found {
        node.hide();
    }
    found
}

// =============================================================================
// Revealer / Scrollable / Overlay
// =============================================================================

pub const REVEALER_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("transition", FieldType::Str),
    field("duration", FieldType::Number),
    field("revealChild", FieldType::Bool),
];

pub fn build_revealer(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Revealer);
    node.set_state(KindState::Revealer {
        reveal: fields.bool("revealChild").unwrap_or(false),
        transition: parse_token(fields, "transition", Transition::parse).unwrap_or(Transition::Crossfade),
        duration_ms: fields.number("duration").map_or(250, |ms| ms.max(0.0) as u32),
    });
    add_child(resolver, node, fields, "child");
    node
}

pub fn set_reveal_child(node: NodeId, reveal: bool) -> bool {
    node.update_state(|state| match state {
        KindState::Revealer { reveal: current, .. } => {
            *current = reveal;
            true
        }
        _ => false,
    })
    .unwrap_or(false)
}

pub const SCROLLABLE_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("hscroll", FieldType::Str),
    field("vscroll", FieldType::Str),
];

pub fn build_scrollable(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Scrollable);
    node.set_state(KindState::Scrollable {
        hscroll: parse_token(fields, "hscroll", ScrollPolicy::parse).unwrap_or_default(),
        vscroll: parse_token(fields, "vscroll", ScrollPolicy::parse).unwrap_or_default(),
    });
    add_child(resolver, node, fields, "child");
    node
}

pub const OVERLAY_FIELDS: &[FieldSpec] = &[
    field("children", FieldType::Specs),
    field("passthrough", FieldType::Bool),
];

/// The first child is the base; the rest are stacked on top of it.
pub fn build_overlay(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Overlay);
    node.set_state(KindState::Overlay {
        passthrough: fields.bool("passthrough").unwrap_or(true),
    });
    add_children(resolver, node, fields, "children");
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::diagnostics::{reset_diagnostics, take_reported};
    use crate::engine::reset_registry;
    use crate::icons::IconSet;
    use crate::spec::{Declaration, DynamicItem, Prop};
    use std::rc::Rc;

    fn setup() -> Resolver {
        reset_registry();
        reset_diagnostics();
        Resolver::with_parts(
            EngineConfig::default(),
            Rc::new(CapturingExecutor::new()),
            Rc::new(IconSet::default()),
        )
    }

    #[test]
    fn test_box_orientation_and_children() {
        let resolver = setup();

        let decl = Declaration::new("box")
            .field("orientation", "v")
            .field("children", vec![Spec::from("a"), Spec::from("b")]);
        let node = resolver.resolve(&decl.into());

        assert_eq!(
            node.state(),
            Some(KindState::Container {
                orientation: Orientation::Vertical,
                homogeneous: false,
            })
        );
        assert_eq!(node.children().len(), 2);
    }

    #[test]
    fn test_bad_orientation_warns_and_defaults() {
        let resolver = setup();

        let node = resolver.resolve(&Declaration::new("box").field("orientation", "diagonal").into());

        assert!(matches!(
            node.state(),
            Some(KindState::Container { orientation: Orientation::Horizontal, .. })
        ));
        assert_eq!(
            take_reported(),
            vec![Diagnostic::InvalidValue {
                field: "orientation".into(),
                value: "diagonal".into(),
            }]
        );
    }

    #[test]
    fn test_centerbox_wrong_count_is_best_effort() {
        let resolver = setup();

        let decl = Declaration::new("centerbox").field("children", vec![Spec::from("left"), Spec::from("mid")]);
        let node = resolver.resolve(&decl.into());

        assert_eq!(node.kind(), Some(NodeKind::CenterBox));
        assert_eq!(node.children().len(), 2);
        assert_eq!(
            take_reported(),
            vec![Diagnostic::ChildCount {
                kind: "centerbox".into(),
                expected: 3,
                got: 2,
            }]
        );
    }

    #[test]
    fn test_dynamic_update_shows_first_match() {
        let resolver = setup();

        let items = vec![
            DynamicItem { value: Value::from(66), widget: Spec::from("high") },
            DynamicItem { value: Value::from(33), widget: Spec::from("mid") },
            DynamicItem { value: Value::from(0), widget: Spec::from("low") },
        ];
        let node = resolver.resolve(&Declaration::new("dynamic").field("items", items).into());
        let children = node.children();
        assert!(children.iter().all(|c| !c.is_visible()));

        let level = 40.0;
        let shown = dynamic_update(node, |value| value.as_f64().is_some_and(|v| level > v));
        assert_eq!(shown, Some(children[1]));
        assert!(node.is_visible());
        assert!(!children[0].is_visible());
        assert!(children[1].is_visible());
        assert!(!children[2].is_visible());

        assert_eq!(dynamic_update(node, |_| false), None);
        assert!(!node.is_visible());
    }

    #[test]
    fn test_stack_show_child() {
        let resolver = setup();

        let pages = Prop::Named(vec![("wifi".into(), Spec::from("W")), ("bt".into(), Spec::from("B"))]);
        let node = resolver.resolve(&Declaration::new("stack").field("items", pages).into());
        assert!(matches!(node.state(), Some(KindState::Stack(s)) if s.visible_child.as_deref() == Some("wifi")));

        assert!(stack_show_child(node, "bt"));
        assert!(matches!(node.state(), Some(KindState::Stack(s)) if s.visible_child.as_deref() == Some("bt")));

        assert!(!stack_show_child(node, "nope"));
        assert!(!node.is_visible());

        assert!(stack_show_child(node, "wifi"));
        assert!(node.is_visible());
    }

    #[test]
    fn test_revealer_defaults() {
        let resolver = setup();

        let node = resolver.resolve(&Declaration::new("revealer").field("child", "x").into());
        assert_eq!(
            node.state(),
            Some(KindState::Revealer {
                reveal: false,
                transition: Transition::Crossfade,
                duration_ms: 250,
            })
        );
        assert!(set_reveal_child(node, true));
        assert!(matches!(node.state(), Some(KindState::Revealer { reveal: true, .. })));
    }
}
