//! Interactive builders: button, eventbox, slider, entry, switch.
//!
//! Pointer commands are dispatched by button number on the press and release
//! signals, so one handler per signal covers primary, middle and secondary
//! clicks. Value widgets (slider, entry, switch) emit a change signal from
//! their setters and run the author's command with the new value.

use std::rc::Rc;

use serde_json::Value;

use super::{add_child, on_command, parse_token};
use crate::command::Command;
use crate::engine::{KindState, NodeId, SliderState, allocate, events};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, field};
use crate::types::{MouseButton, NodeKind, Orientation, ScrollDirection};

// =============================================================================
// Pointer Commands (button / eventbox)
// =============================================================================

pub const BUTTON_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("onClick", FieldType::Command),
    field("onSecondaryClick", FieldType::Command),
    field("onMiddleClick", FieldType::Command),
    field("onClickRelease", FieldType::Command),
    field("onSecondaryClickRelease", FieldType::Command),
    field("onMiddleClickRelease", FieldType::Command),
    field("onScrollUp", FieldType::Command),
    field("onScrollDown", FieldType::Command),
];

pub const EVENTBOX_FIELDS: &[FieldSpec] = &[
    field("child", FieldType::Spec),
    field("onClick", FieldType::Command),
    field("onSecondaryClick", FieldType::Command),
    field("onMiddleClick", FieldType::Command),
    field("onClickRelease", FieldType::Command),
    field("onSecondaryClickRelease", FieldType::Command),
    field("onMiddleClickRelease", FieldType::Command),
    field("onScrollUp", FieldType::Command),
    field("onScrollDown", FieldType::Command),
    field("onHover", FieldType::Command),
    field("onHoverLost", FieldType::Command),
];

/// Commands per pointer button for one signal.
struct ButtonCommands {
    primary: Option<Command>,
    secondary: Option<Command>,
    middle: Option<Command>,
}

impl ButtonCommands {
    fn read(fields: &Fields, primary: &str, secondary: &str, middle: &str) -> Self {
        Self {
            primary: fields.command(primary),
            secondary: fields.command(secondary),
            middle: fields.command(middle),
        }
    }

    fn for_button(&self, button: MouseButton) -> Option<&Command> {
        match button {
            MouseButton::Primary => self.primary.as_ref(),
            MouseButton::Secondary => self.secondary.as_ref(),
            MouseButton::Middle => self.middle.as_ref(),
        }
    }
}

fn wire_pointer(resolver: &Resolver, node: NodeId, fields: &Fields) {
    let signals = [
        (events::BUTTON_PRESS, ButtonCommands::read(fields, "onClick", "onSecondaryClick", "onMiddleClick")),
        (
            events::BUTTON_RELEASE,
            ButtonCommands::read(fields, "onClickRelease", "onSecondaryClickRelease", "onMiddleClickRelease"),
        ),
    ];
    for (signal, commands) in signals {
        let executor = resolver.shared_executor();
        events::connect(
            node,
            signal,
            Rc::new(move |node, args| {
                let command = events::button_of(args).and_then(|button| commands.for_button(button));
                if let Some(command) = command {
                    command.run(executor.as_ref(), node, args);
                }
            }),
        );
    }

    let up = fields.command("onScrollUp");
    let down = fields.command("onScrollDown");
    if up.is_some() || down.is_some() {
        let executor = resolver.shared_executor();
        events::connect(
            node,
            events::SCROLL,
            Rc::new(move |node, args| {
                let command = match events::direction_of(args) {
                    Some(ScrollDirection::Up) => up.as_ref(),
                    Some(ScrollDirection::Down) => down.as_ref(),
                    None => None,
                };
                if let Some(command) = command {
                    command.run(executor.as_ref(), node, args);
                }
            }),
        );
    }
}

pub fn build_button(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Button);
    add_child(resolver, node, fields, "child");
    wire_pointer(resolver, node, fields);
    node
}

pub fn build_event_box(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::EventBox);
    wire_pointer(resolver, node, fields);
    on_command(resolver, node, events::ENTER, fields, "onHover");
    on_command(resolver, node, events::LEAVE, fields, "onHoverLost");
    add_child(resolver, node, fields, "child");
    node
}

// =============================================================================
// Slider
// =============================================================================

pub const SLIDER_FIELDS: &[FieldSpec] = &[
    field("min", FieldType::Number),
    field("max", FieldType::Number),
    field("value", FieldType::Number),
    field("orientation", FieldType::Str),
    field("inverted", FieldType::Bool),
    field("drawValue", FieldType::Bool),
    field("onChange", FieldType::Command),
];

/// A value between `min` and `max`, stepping by a hundredth of the range.
///
/// `onChange` only runs for user changes (drag or scroll), never for
/// programmatic [`set_slider_value`] calls.
pub fn build_slider(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let min = fields.number("min").unwrap_or(0.0);
    let max = fields.number("max").unwrap_or(1.0).max(min);
    let state = SliderState {
        min,
        max,
        value: fields.number("value").unwrap_or(min).clamp(min, max),
        step: (max - min) / 100.0,
        orientation: parse_token(fields, "orientation", Orientation::parse).unwrap_or_default(),
        inverted: fields.bool("inverted").unwrap_or(false),
        draw_value: fields.bool("drawValue").unwrap_or(false),
        dragging: false,
    };

    let node = allocate(NodeKind::Slider);
    node.set_state(KindState::Slider(state));

    events::connect(node, events::BUTTON_PRESS, Rc::new(|node, _| set_dragging(node, true)));
    events::connect(node, events::BUTTON_RELEASE, Rc::new(|node, _| set_dragging(node, false)));
    events::connect(
        node,
        events::SCROLL,
        Rc::new(|node, args| {
            let Some(KindState::Slider(slider)) = node.state() else {
                return;
            };
            let delta = match events::direction_of(args) {
                Some(ScrollDirection::Up) => slider.step,
                Some(ScrollDirection::Down) => -slider.step,
                None => return,
            };
            set_dragging(node, true);
            set_slider_value(node, slider.value + delta);
            set_dragging(node, false);
        }),
    );

    if let Some(command) = fields.command("onChange") {
        let executor = resolver.shared_executor();
        events::connect(
            node,
            events::VALUE_CHANGED,
            Rc::new(move |node, args| {
                let dragging = matches!(node.state(), Some(KindState::Slider(SliderState { dragging: true, .. })));
                if let (true, Some(value)) = (dragging, args.first()) {
                    command.run_with_value(executor.as_ref(), node, &[], value);
                }
            }),
        );
    }

    node
}

fn set_dragging(node: NodeId, dragging: bool) {
    node.update_state(|state| {
        if let KindState::Slider(slider) = state {
            slider.dragging = dragging;
        }
    });
}

/// Move a slider, clamped to its range. Emits `value-changed` when the value moved.
pub fn set_slider_value(node: NodeId, value: f64) -> bool {
    let changed = node
        .update_state(|state| match state {
            KindState::Slider(slider) => {
                let value = value.clamp(slider.min, slider.max);
                let changed = value != slider.value;
                slider.value = value;
                changed.then_some(value)
            }
            _ => None,
        })
        .flatten();

    match changed {
        Some(value) => {
            events::emit(node, events::VALUE_CHANGED, &[Value::from(value)]);
            true
        }
        None => false,
    }
}

// =============================================================================
// Entry
// =============================================================================

pub const ENTRY_FIELDS: &[FieldSpec] = &[
    field("text", FieldType::Str),
    field("placeholder", FieldType::Str),
    field("password", FieldType::Bool),
    field("onChange", FieldType::Command),
    field("onAccept", FieldType::Command),
];

pub fn build_entry(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Entry);
    node.set_state(KindState::Entry {
        text: fields.str("text").unwrap_or_default().to_string(),
        placeholder: fields.str("placeholder").unwrap_or_default().to_string(),
        password: fields.bool("password").unwrap_or(false),
    });

    for (signal, name) in [(events::CHANGED, "onChange"), (events::ACTIVATE, "onAccept")] {
        let Some(command) = fields.command(name) else {
            continue;
        };
        let executor = resolver.shared_executor();
        events::connect(
            node,
            signal,
            Rc::new(move |node, args| {
                if let Some(text) = args.first() {
                    command.run_with_value(executor.as_ref(), node, &[], text);
                }
            }),
        );
    }
    node
}

fn entry_text(node: NodeId) -> Option<String> {
    match node.state()? {
        KindState::Entry { text, .. } => Some(text),
        _ => None,
    }
}

/// Replace an entry's text and emit `changed` with it.
pub fn set_entry_text(node: NodeId, text: &str) -> bool {
    let updated = node
        .update_state(|state| match state {
            KindState::Entry { text: current, .. } => {
                *current = text.to_string();
                true
            }
            _ => false,
        })
        .unwrap_or(false);
    if updated {
        events::emit(node, events::CHANGED, &[Value::from(text)]);
    }
    updated
}

/// Accept the entry (enter key): emits `activate` with the current text.
pub fn activate_entry(node: NodeId) -> bool {
    match entry_text(node) {
        Some(text) => {
            events::emit(node, events::ACTIVATE, &[Value::from(text)]);
            true
        }
        None => false,
    }
}

// =============================================================================
// Switch
// =============================================================================

pub const SWITCH_FIELDS: &[FieldSpec] = &[
    field("active", FieldType::Bool),
    field("onActivate", FieldType::Command),
];

pub fn build_switch(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::Switch);
    node.set_state(KindState::Switch {
        active: fields.bool("active").unwrap_or(false),
    });

    if let Some(command) = fields.command("onActivate") {
        let executor = resolver.shared_executor();
        events::connect(
            node,
            events::TOGGLED,
            Rc::new(move |node, args| {
                if let Some(active) = args.first() {
                    command.run_with_value(executor.as_ref(), node, &[], active);
                }
            }),
        );
    }
    node
}

/// Flip a switch. Emits `toggled` only when the state changes.
pub fn set_switch_active(node: NodeId, active: bool) -> bool {
    let changed = node
        .update_state(|state| match state {
            KindState::Switch { active: current } if *current != active => {
                *current = active;
                true
            }
            _ => false,
        })
        .unwrap_or(false);
    if changed {
        events::emit(node, events::TOGGLED, &[Value::from(active)]);
    }
    changed
}
