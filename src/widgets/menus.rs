//! Popup builders: popover, menubutton, menu, menuitem.
//!
//! Popovers, popups and submenus are not children of the node that opens
//! them. They are resolved alongside it, referenced from its state and
//! destroyed together with it.

use serde_json::Value;

use super::{add_child, add_children, on_command, parse_token};
use crate::engine::{self, KindState, NodeId, allocate, events};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, field};
use crate::types::{NodeFlags, NodeKind, Position};

/// Resolve a detached popup from field `name`, owned by `owner`.
fn attach_popup(resolver: &Resolver, owner: NodeId, fields: &Fields, name: &str) -> Option<NodeId> {
    let popup = resolver.resolve(&fields.spec(name)?);
    popup.hide();
    engine::on_destroy(owner, move || popup.destroy());
    Some(popup)
}

// =============================================================================
// Popover
// =============================================================================

pub const POPOVER_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("modal", FieldType::Bool),
    field("position", FieldType::Str),
];

pub fn build_popover(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Popover);
    node.set_state(KindState::Popover {
        position: parse_token(fields, "position", Position::parse).unwrap_or_default(),
        modal: fields.bool("modal").unwrap_or(true),
    });
    add_child(resolver, node, fields, "child");
    node
}

// =============================================================================
// Menu Button
// =============================================================================

pub const MENU_BUTTON_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("popover", FieldType::Spec),
    field("popup", FieldType::Spec),
    field("onToggled", FieldType::Command),
];

pub fn build_menu_button(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::MenuButton);
    let popover = attach_popup(resolver, node, fields, "popover");
    let popup = attach_popup(resolver, node, fields, "popup");
    node.set_state(KindState::MenuButton { popover, popup });

    on_command(resolver, node, events::TOGGLED, fields, "onToggled");
    add_child(resolver, node, fields, "child");
    node
}

/// Open or close a menu button's popover and popup. Emits `toggled` on change.
pub fn set_menu_button_active(node: NodeId, active: bool) -> bool {
    let Some(KindState::MenuButton { popover, popup }) = node.state() else {
        return false;
    };
    if node.flags().contains(NodeFlags::ACTIVE) == active {
        return false;
    }

    node.set_flag(NodeFlags::ACTIVE, active);
    for attached in [popover, popup].into_iter().flatten() {
        attached.set_visible(active);
    }
    events::emit(node, events::TOGGLED, &[Value::from(active)]);
    true
}

// =============================================================================
// Menu / Menu Item
// =============================================================================

pub const MENU_FIELDS: &[FieldSpec] = &[
    field("children", FieldType::Specs),
    field("xOffset", FieldType::Number),
    field("yOffset", FieldType::Number),
    field("onPopup", FieldType::Command),
    field("onMoveScroll", FieldType::Command),
];

/// Menus start hidden with their items realized.
pub fn build_menu(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Menu);
    node.set_state(KindState::Menu {
        x_offset: fields.number("xOffset").unwrap_or(0.0),
        y_offset: fields.number("yOffset").unwrap_or(0.0),
    });
    add_children(resolver, node, fields, "children");
    on_command(resolver, node, events::POPPED_UP, fields, "onPopup");
    on_command(resolver, node, events::MOVE_SCROLL, fields, "onMoveScroll");

    node.show_all();
    node.hide();
    node
}

/// Show a menu and emit `popped-up`.
pub fn popup_menu(node: NodeId) -> bool {
    if node.kind() != Some(NodeKind::Menu) {
        return false;
    }
    node.show();
    events::emit(node, events::POPPED_UP, &[]);
    true
}

pub const MENU_ITEM_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("submenu", FieldType::Spec),
    field("onActivate", FieldType::Command),
    field("onSelect", FieldType::Command),
    field("onDeselect", FieldType::Command),
];

pub fn build_menu_item(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::MenuItem);
    add_child(resolver, node, fields, "child");

    let submenu = attach_popup(resolver, node, fields, "submenu");
    node.set_state(KindState::MenuItem { submenu });

    on_command(resolver, node, events::ACTIVATE, fields, "onActivate");
    on_command(resolver, node, events::SELECT, fields, "onSelect");
    on_command(resolver, node, events::DESELECT, fields, "onDeselect");
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::diagnostics::reset_diagnostics;
    use crate::engine::reset_registry;
    use crate::icons::IconSet;
    use crate::spec::{Declaration, Spec};
    use std::rc::Rc;

    fn setup() -> (Resolver, CapturingExecutor) {
        reset_registry();
        reset_diagnostics();
        let executor = CapturingExecutor::new();
        let resolver = Resolver::with_parts(
            EngineConfig::default(),
            Rc::new(executor.clone()),
            Rc::new(IconSet::default()),
        );
        (resolver, executor)
    }

    #[test]
    fn test_menu_starts_hidden_with_items_shown() {
        let (resolver, executor) = setup();

        let item = Declaration::new("menuitem").field("child", "Lock").field("onActivate", "loginctl lock-session");
        let decl = Declaration::new("menu")
            .field("children", vec![Spec::from(item)])
            .field("onPopup", "popped");
        let menu = resolver.resolve(&decl.into());

        assert!(!menu.is_visible());
        let items = menu.children();
        assert!(items[0].is_visible());

        assert!(popup_menu(menu));
        assert!(menu.is_visible());
        events::emit(items[0], events::ACTIVATE, &[]);
        assert_eq!(executor.take(), vec!["popped", "loginctl lock-session"]);
    }

    #[test]
    fn test_menu_button_toggles_popover() {
        let (resolver, executor) = setup();

        let popover = Declaration::new("popover").field("child", "content");
        let decl = Declaration::new("menubutton")
            .field("child", "Open")
            .field("popover", popover)
            .field("onToggled", "toggled");
        let node = resolver.resolve(&decl.into());

        let Some(KindState::MenuButton { popover: Some(popover), .. }) = node.state() else {
            panic!("menubutton without popover");
        };
        assert!(!popover.is_visible());

        assert!(set_menu_button_active(node, true));
        assert!(popover.is_visible());
        assert!(!set_menu_button_active(node, true));
        assert_eq!(executor.take(), vec!["toggled"]);

        node.destroy();
        assert!(!popover.is_alive());
    }

    #[test]
    fn test_submenu_destroyed_with_item() {
        let (resolver, _) = setup();

        let decl = Declaration::new("menuitem").field("submenu", Declaration::new("menu"));
        let item = resolver.resolve(&decl.into());
        let Some(KindState::MenuItem { submenu: Some(submenu) }) = item.state() else {
            panic!("menuitem without submenu");
        };

        item.destroy();
        assert!(!submenu.is_alive());
    }
}
