//! Display builders: label, icon and progress bar.

use std::path::Path;

use super::parse_token;
use crate::engine::{IconSource, IconState, KindState, LabelState, NodeId, allocate};
use crate::spec::{FieldSpec, FieldType, Fields, Resolver, field};
use crate::types::{Justification, NodeKind, Orientation};

// =============================================================================
// Label
// =============================================================================

pub const LABEL_FIELDS: &[FieldSpec] = &[
    field("label", FieldType::Str),
    field("markup", FieldType::Bool),
    field("ellipsize", FieldType::Bool),
    field("wrap", FieldType::Bool),
    field("maxWidth", FieldType::Number),
    field("angle", FieldType::Number),
    field("justify", FieldType::Str),
    field("xalign", FieldType::Number),
    field("yalign", FieldType::Number),
];

/// Plain label leaf with default attributes.
pub fn text_label(text: &str) -> NodeId {
    let node = allocate(NodeKind::Label);
    node.set_state(KindState::Label(LabelState {
        text: text.to_string(),
        ..Default::default()
    }));
    node
}

pub fn build_label(_resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let defaults = LabelState::default();
    let state = LabelState {
        text: fields.str("label").unwrap_or_default().to_string(),
        markup: fields.bool("markup").unwrap_or(defaults.markup),
        ellipsize: fields.bool("ellipsize").unwrap_or(defaults.ellipsize),
        wrap: fields.bool("wrap").unwrap_or(defaults.wrap),
        max_width_chars: fields.number("maxWidth").map_or(defaults.max_width_chars, |w| w as i32),
        angle: fields.number("angle").unwrap_or(defaults.angle),
        justify: parse_token(fields, "justify", Justification::parse).unwrap_or(defaults.justify),
        xalign: fields.number("xalign").unwrap_or(defaults.xalign),
        yalign: fields.number("yalign").unwrap_or(defaults.yalign),
    };

    let node = allocate(NodeKind::Label);
    node.set_state(KindState::Label(state));
    node
}

// =============================================================================
// Icon
// =============================================================================

pub const ICON_FIELDS: &[FieldSpec] = &[
    field("icon", FieldType::Str),
    field("size", FieldType::Number),
];

/// Existing file paths load as images; anything else is a theme name.
pub fn build_icon(resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let icon = fields.str("icon").unwrap_or_default();
    let source = if !icon.is_empty() && Path::new(icon).exists() {
        IconSource::File(icon.into())
    } else {
        IconSource::Named(icon.to_string())
    };
    let size = fields
        .number("size")
        .map_or(resolver.config().base_icon_size, |size| size.max(0.0) as u32);

    let node = allocate(NodeKind::Icon);
    node.set_state(KindState::Icon(IconState { source, size }));
    node
}

// =============================================================================
// Progress Bar
// =============================================================================

pub const PROGRESS_FIELDS: &[FieldSpec] = &[
    field("value", FieldType::Number),
    field("inverted", FieldType::Bool),
    field("orientation", FieldType::Str),
];

pub fn build_progress_bar(_resolver: &Resolver, _tag: &str, fields: &Fields) -> NodeId {
    let node = allocate(NodeKind::ProgressBar);
    node.set_state(KindState::ProgressBar {
        fraction: fields.number("value").unwrap_or(0.0).clamp(0.0, 1.0),
        orientation: parse_token(fields, "orientation", Orientation::parse).unwrap_or_default(),
        inverted: fields.bool("inverted").unwrap_or(false),
    });
    node
}

/// Set a progress bar's fraction, clamped to `0.0..=1.0`.
pub fn set_progress(node: NodeId, value: f64) -> bool {
    node.update_state(|state| match state {
        KindState::ProgressBar { fraction, .. } => {
            *fraction = value.clamp(0.0, 1.0);
            true
        }
        _ => false,
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::diagnostics::reset_diagnostics;
    use crate::engine::reset_registry;
    use crate::icons::IconSet;
    use crate::spec::Declaration;
    use std::rc::Rc;

    fn setup() -> Resolver {
        reset_registry();
        reset_diagnostics();
        let config = EngineConfig {
            base_icon_size: 24,
            ..Default::default()
        };
        Resolver::with_parts(config, Rc::new(CapturingExecutor::new()), Rc::new(IconSet::default()))
    }

    #[test]
    fn test_label_fields() {
        let resolver = setup();

        let decl = Declaration::new("label")
            .field("label", "<b>hi</b>")
            .field("markup", true)
            .field("justify", "left")
            .field("maxWidth", 12);
        let node = resolver.resolve(&decl.into());

        let Some(KindState::Label(label)) = node.state() else {
            panic!("not a label");
        };
        assert_eq!(label.text, "<b>hi</b>");
        assert!(label.markup);
        assert_eq!(label.justify, Justification::Left);
        assert_eq!(label.max_width_chars, 12);
        assert_eq!(label.xalign, 0.5);
    }

    #[test]
    fn test_icon_size_defaults_to_config() {
        let resolver = setup();

        let node = resolver.resolve(&Declaration::new("icon").field("icon", "firefox").into());
        assert_eq!(
            node.state(),
            Some(KindState::Icon(IconState {
                source: IconSource::Named("firefox".into()),
                size: 24,
            }))
        );
    }

    #[test]
    fn test_icon_from_existing_file() {
        let resolver = setup();

        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let node = resolver.resolve(&Declaration::new("icon").field("icon", path.as_str()).field("size", 32).into());

        assert_eq!(node.icon(), Some(IconSource::File(path.into())));
    }

    #[test]
    fn test_progress_clamped() {
        let resolver = setup();

        let node = resolver.resolve(&Declaration::new("progressbar").field("value", 1.5).into());
        assert!(matches!(node.state(), Some(KindState::ProgressBar { fraction, .. }) if fraction == 1.0));

        assert!(set_progress(node, 0.25));
        assert!(matches!(node.state(), Some(KindState::ProgressBar { fraction, .. }) if fraction == 0.25));
    }
}
