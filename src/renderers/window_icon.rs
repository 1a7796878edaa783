//! Icon for the focused client.
//!
//! Two candidates are derived per change, one from the client class and one
//! from its title. Each goes through the substitutions on its own. The
//! shown name is picked by ascending priority: `fallback`, then the class
//! candidate if the icon theme has it, then the title candidate if the
//! theme has it. With none of the three the icon is hidden.

use super::{Substitution, substitute, substitutions};
use crate::engine::NodeId;
use crate::icons::IconTheme;
use crate::service::hyprland::{ActiveClient, Hyprland};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, field};
use crate::widgets::display;

pub const WINDOW_ICON_FIELDS: &[FieldSpec] = &[
    field("icon", FieldType::Str),
    field("size", FieldType::Number),
    field("symbolic", FieldType::Bool),
    field("substitutes", FieldType::Array),
    field("fallback", FieldType::Str),
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IconChoice {
    pub class_icon: String,
    pub title_icon: String,
    /// Name to show, `None` when nothing resolved and there is no fallback.
    pub name: Option<String>,
}

pub fn choose_icon(
    client: &ActiveClient,
    symbolic: bool,
    rules: &[Substitution],
    fallback: Option<&str>,
    icons: &dyn IconTheme,
) -> IconChoice {
    let suffix = if symbolic { "-symbolic" } else { "" };
    let class_icon = substitute(&format!("{}{suffix}", client.class), rules);
    let title_icon = substitute(&format!("{}{suffix}", client.title), rules);

    let mut name = fallback.filter(|f| !f.is_empty()).map(str::to_string);
    if icons.has_icon(&class_icon) {
        name = Some(class_icon.clone());
    }
    if icons.has_icon(&title_icon) {
        name = Some(title_icon.clone());
    }

    IconChoice {
        class_icon,
        title_icon,
        name,
    }
}

pub fn build_window_icon(resolver: &Resolver, hyprland: &Hyprland, tag: &str, fields: &Fields) -> NodeId {
    let symbolic = fields.bool("symbolic").unwrap_or(false);
    let rules = substitutions(fields, "substitutes");
    let fallback = fields.str("fallback").map(str::to_string);

    let node = display::build_icon(resolver, tag, fields);
    let resolver = resolver.clone();
    hyprland.connect(node, move |node, state| {
        let choice = choose_icon(
            &state.active.client,
            symbolic,
            &rules,
            fallback.as_deref(),
            resolver.icons(),
        );
        match choice.name {
            Some(name) => {
                node.set_icon_name(&name);
                node.show();
            }
            None => node.hide(),
        }
    });
    node
}
