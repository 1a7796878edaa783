//! Label mirroring the focused client's title or class.

use super::{Substitution, substitute, substitutions};
use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;
use crate::service::hyprland::{ActiveClient, Hyprland};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, field};
use crate::widgets::{display, text_label};

pub const WINDOW_LABEL_FIELDS: &[FieldSpec] = &[
    field("label", FieldType::Str),
    field("markup", FieldType::Bool),
    field("ellipsize", FieldType::Bool),
    field("wrap", FieldType::Bool),
    field("maxWidth", FieldType::Number),
    field("angle", FieldType::Number),
    field("justify", FieldType::Str),
    field("xalign", FieldType::Number),
    field("yalign", FieldType::Number),
    field("show", FieldType::Str),
    field("substitutes", FieldType::Array),
    field("fallback", FieldType::Str),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Show {
    Title,
    Class,
}

impl Show {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(Show::Title),
            "class" => Some(Show::Class),
            _ => None,
        }
    }

    fn read(self, client: &ActiveClient) -> &str {
        match self {
            Show::Title => &client.title,
            Show::Class => &client.class,
        }
    }
}

/// Text shown for `client`: substituted value, or `fallback` when that is empty.
pub fn window_text(client: &ActiveClient, show: Show, rules: &[Substitution], fallback: &str) -> String {
    let text = substitute(show.read(client), rules);
    if text.is_empty() { fallback.to_string() } else { text }
}

/// `show` defaults to `title`. Any other value yields an inert empty label.
pub fn build_window_label(resolver: &Resolver, hyprland: &Hyprland, tag: &str, fields: &Fields) -> NodeId {
    let token = fields.str("show").unwrap_or("title");
    let Some(show) = Show::parse(token) else {
        diagnostics::report(Diagnostic::InvalidShow {
            kind: tag.to_string(),
            value: token.to_string(),
        });
        return text_label("");
    };

    let rules = substitutions(fields, "substitutes");
    let fallback = fields.str("fallback").unwrap_or_default().to_string();
    let node = display::build_label(resolver, tag, fields);
    hyprland.connect(node, move |node, state| {
        node.set_label(&window_text(&state.active.client, show, &rules, &fallback));
    });
    node
}
