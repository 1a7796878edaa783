//! Widget builders - the registry behind every type tag.
//!
//! A builder turns the kind-specific fields of a declaration into a bare
//! node; decoration with the universal fields happens afterwards in the
//! applicator. Builders are grouped by what they do:
//! - [`containers`] - box, centerbox, dynamic, overlay, revealer, scrollable, stack
//! - [`display`] - label, icon, progressbar
//! - [`interactive`] - button, eventbox, slider, entry, switch
//! - [`menus`] - popover, menubutton, menu, menuitem
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::widgets::Builder;
//! use spark_shell::spec::{field, FieldType};
//!
//! const CLOCK_FIELDS: &[FieldSpec] = &[field("format", FieldType::Str)];
//!
//! resolver.register("clock", Builder::new(CLOCK_FIELDS, |_, _, fields| {
//!     text_label(fields.str("format").unwrap_or("%H:%M"))
//! }));
//! ```

pub mod containers;
pub mod display;
pub mod interactive;
pub mod menus;

pub use containers::{dynamic_update, set_reveal_child, stack_show_child};
pub use display::{set_progress, text_label};
pub use interactive::{activate_entry, set_entry_text, set_slider_value, set_switch_active};
pub use menus::{popup_menu, set_menu_button_active};

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::command::Command;
use crate::diagnostics::{self, Diagnostic};
use crate::engine::{NodeId, events};
use crate::spec::{FieldSpec, Fields, Resolver};

// =============================================================================
// Builder
// =============================================================================

/// Builder function: receives the resolver, the tag it was invoked for and
/// the checked kind-specific fields.
pub type BuildFn = Rc<dyn Fn(&Resolver, &str, &Fields) -> NodeId>;

#[derive(Clone)]
pub struct Builder {
    /// Fields this builder reads. Anything else is reported as unknown.
    pub fields: &'static [FieldSpec],
    pub build: BuildFn,
}

impl Builder {
    pub fn new(
        fields: &'static [FieldSpec],
        build: impl Fn(&Resolver, &str, &Fields) -> NodeId + 'static,
    ) -> Self {
        Self {
            fields,
            build: Rc::new(build),
        }
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|field| field.name).collect();
        f.debug_struct("Builder").field("fields", &names).finish()
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Type tag to builder.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    builders: HashMap<String, Builder>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register("box", Builder::new(containers::BOX_FIELDS, containers::build_box));
        registry.register("centerbox", Builder::new(containers::BOX_FIELDS, containers::build_center_box));
        registry.register("dynamic", Builder::new(containers::DYNAMIC_FIELDS, containers::build_dynamic));
        registry.register("overlay", Builder::new(containers::OVERLAY_FIELDS, containers::build_overlay));
        registry.register("revealer", Builder::new(containers::REVEALER_FIELDS, containers::build_revealer));
        registry.register("scrollable", Builder::new(containers::SCROLLABLE_FIELDS, containers::build_scrollable));
        registry.register("stack", Builder::new(containers::STACK_FIELDS, containers::build_stack));

        registry.register("label", Builder::new(display::LABEL_FIELDS, display::build_label));
        registry.register("icon", Builder::new(display::ICON_FIELDS, display::build_icon));
        registry.register("progressbar", Builder::new(display::PROGRESS_FIELDS, display::build_progress_bar));

        registry.register("button", Builder::new(interactive::BUTTON_FIELDS, interactive::build_button));
        registry.register("eventbox", Builder::new(interactive::EVENTBOX_FIELDS, interactive::build_event_box));
        registry.register("slider", Builder::new(interactive::SLIDER_FIELDS, interactive::build_slider));
        registry.register("entry", Builder::new(interactive::ENTRY_FIELDS, interactive::build_entry));
        registry.register("switch", Builder::new(interactive::SWITCH_FIELDS, interactive::build_switch));

        registry.register("popover", Builder::new(menus::POPOVER_FIELDS, menus::build_popover));
        registry.register("menubutton", Builder::new(menus::MENU_BUTTON_FIELDS, menus::build_menu_button));
        registry.register("menu", Builder::new(menus::MENU_FIELDS, menus::build_menu));
        registry.register("menuitem", Builder::new(menus::MENU_ITEM_FIELDS, menus::build_menu_item));

        registry
    }

    /// Register a builder. Returns the builder previously registered for `tag`.
    pub fn register(&mut self, tag: &str, builder: Builder) -> Option<Builder> {
        self.builders.insert(tag.to_string(), builder)
    }

    pub fn get(&self, tag: &str) -> Option<&Builder> {
        self.builders.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.builders.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

// =============================================================================
// Shared builder helpers
// =============================================================================

/// Resolve the spec in field `name` and append it to `parent`.
pub(crate) fn add_child(resolver: &Resolver, parent: NodeId, fields: &Fields, name: &str) -> Option<NodeId> {
    let spec = fields.spec(name)?;
    let child = resolver.resolve(&spec);
    parent.add(child);
    Some(child)
}

/// Resolve every spec in field `name` and append them in order.
pub(crate) fn add_children(resolver: &Resolver, parent: NodeId, fields: &Fields, name: &str) -> Vec<NodeId> {
    let children = resolver.resolve_all(&fields.specs(name));
    for child in &children {
        parent.add(*child);
    }
    children
}

/// Run the command in field `name` whenever `signal` fires on `node`.
pub(crate) fn on_command(resolver: &Resolver, node: NodeId, signal: &str, fields: &Fields, name: &str) {
    let Some(command) = fields.command(name) else {
        return;
    };
    connect_command(resolver, node, signal, command);
}

pub(crate) fn connect_command(resolver: &Resolver, node: NodeId, signal: &str, command: Command) {
    let executor = resolver.shared_executor();
    events::connect(
        node,
        signal,
        Rc::new(move |node, args| command.run(executor.as_ref(), node, args)),
    );
}

/// Parse an enum token from field `name`, reporting unknown tokens.
pub(crate) fn parse_token<T>(fields: &Fields, name: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let token = fields.str(name)?;
    let parsed = parse(token);
    if parsed.is_none() {
        diagnostics::report(Diagnostic::InvalidValue {
            field: name.to_string(),
            value: token.to_string(),
        });
    }
    parsed
}
