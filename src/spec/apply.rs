//! Applicator - decorates a base node with the universal fields.
//!
//! Runs once per resolved declaration, after the builder. Order matters only
//! for connections (array order) and `setup`, which always runs last so it
//! sees the fully decorated node.
//!
//! Every timer and service subscription created here is tied to the node's
//! lifetime through a destroy callback.

use crate::diagnostics::{self, Diagnostic};
use crate::engine::{self, NodeId, events, timer};
use crate::types::Align;

use super::{Common, Connection};

/// Apply `common` to `node`.
pub fn apply(node: NodeId, common: &Common) {
    if let Some(class_name) = &common.class_name {
        for token in class_name.split_whitespace() {
            node.toggle_class_name(token, true);
        }
    }

    if let Some(css) = &common.style {
        node.set_style(css);
    }

    if let Some(token) = &common.halign {
        if let Some(align) = parse_align("halign", token) {
            node.set_halign(align);
        }
    }
    if let Some(token) = &common.valign {
        if let Some(align) = parse_align("valign", token) {
            node.set_valign(align);
        }
    }

    if let Some(expand) = common.hexpand {
        node.set_hexpand(expand);
    }
    if let Some(expand) = common.vexpand {
        node.set_vexpand(expand);
    }
    if let Some(sensitive) = common.sensitive {
        node.set_sensitive(sensitive);
    }
    if let Some(tooltip) = &common.tooltip {
        node.set_tooltip(tooltip);
    }
    if let Some(visible) = common.visible {
        node.set_visible(visible);
    }

    for (key, value) in &common.properties {
        node.set_property(key, value.clone());
    }

    for connection in &common.connections {
        connect(node, connection);
    }

    if let Some(setup) = &common.setup {
        setup(node);
    }
}

/// Unknown tokens are reported and leave the current alignment untouched.
fn parse_align(field: &str, token: &str) -> Option<Align> {
    let align = Align::parse(token);
    if align.is_none() {
        diagnostics::report(Diagnostic::InvalidValue {
            field: field.to_string(),
            value: token.to_string(),
        });
    }
    align
}

fn connect(node: NodeId, connection: &Connection) {
    match connection {
        Connection::Signal { name, callback } => {
            events::connect(node, name, callback.clone());
        }
        Connection::Interval { period_ms, callback } => {
            let callback = callback.clone();
            let id = timer::interval(*period_ms, move || {
                if node.is_alive() {
                    callback(node);
                }
            });
            match id {
                Some(id) => engine::on_destroy(node, move || timer::cancel(id)),
                None => diagnostics::report(Diagnostic::ZeroInterval),
            }
        }
        Connection::Service { service, callback, event } => {
            let dispose = service.connect_widget(node, callback.clone(), event.as_deref());
            engine::on_destroy(node, dispose);
        }
    }
}
