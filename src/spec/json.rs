//! Specs loaded from configuration data.
//!
//! Data specs use the camelCase keys authors write in config files
//! (`className`, `halign`, `onClick`, ...). Universal keys fill
//! [`Common`]; every other key is converted according to the field
//! declaration of the registered builder, so nested widgets become specs
//! and everything else stays plain JSON for the builder's own checks.
//!
//! Callables cannot be written as data: `connections` and `setup` are
//! reported and ignored.

use serde_json::{Map, Value};

use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;

use super::{Common, Declaration, DynamicItem, FieldType, Prop, Resolver, Spec, TypeRef, lookup};

const UNIVERSAL_KEYS: &[&str] = &[
    "type",
    "className",
    "style",
    "halign",
    "valign",
    "hexpand",
    "vexpand",
    "sensitive",
    "tooltip",
    "visible",
    "properties",
    "connections",
    "setup",
];

impl Resolver {
    /// Resolve a spec written as JSON (or TOML converted to JSON).
    pub fn resolve_value(&self, value: &Value) -> NodeId {
        self.resolve(&self.spec_from_value(value))
    }

    /// Convert a JSON value into a spec.
    pub fn spec_from_value(&self, value: &Value) -> Spec {
        match value {
            Value::Null => Spec::Null,
            Value::String(text) => Spec::Text(text.clone()),
            Value::Number(_) | Value::Bool(_) => Spec::Text(value.to_string()),
            Value::Array(_) => {
                diagnostics::report(Diagnostic::InvalidValue {
                    field: "widget".to_string(),
                    value: value.to_string(),
                });
                Spec::Null
            }
            Value::Object(object) => self.declaration_from_object(object).into(),
        }
    }

    fn declaration_from_object(&self, object: &Map<String, Value>) -> Declaration {
        let ty = match object.get("type") {
            Some(Value::String(tag)) => TypeRef::Tag(tag.clone()),
            _ => TypeRef::Missing,
        };
        let kind = ty.describe();
        let declared = match &ty {
            TypeRef::Tag(tag) => self.builder(tag).map(|b| b.fields),
            _ => None,
        };

        let mut decl = Declaration {
            ty,
            common: common_from_object(&kind, object),
            ..Default::default()
        };

        for (name, value) in object {
            if UNIVERSAL_KEYS.contains(&name.as_str()) {
                continue;
            }
            let field_type = declared.and_then(|fields| lookup(fields, name));
            decl.fields.set(name, self.prop_from_value(field_type, value));
        }
        decl
    }

    fn prop_from_value(&self, field_type: Option<FieldType>, value: &Value) -> Prop {
        match (field_type, value) {
            (Some(FieldType::Spec), Value::Object(_) | Value::Array(_)) => Prop::Spec(self.spec_from_value(value)),
            (Some(FieldType::Specs), Value::Array(entries)) => {
                Prop::Specs(entries.iter().map(|v| self.spec_from_value(v)).collect())
            }
            (Some(FieldType::Named), Value::Array(entries)) => Prop::Named(
                entries
                    .iter()
                    .filter_map(|entry| match entry.as_array().map(Vec::as_slice) {
                        Some([Value::String(name), widget]) => Some((name.clone(), self.spec_from_value(widget))),
                        _ => {
                            diagnostics::report(Diagnostic::InvalidValue {
                                field: "items".to_string(),
                                value: entry.to_string(),
                            });
                            None
                        }
                    })
                    .collect(),
            ),
            (Some(FieldType::Items), Value::Array(entries)) => Prop::Items(
                entries
                    .iter()
                    .map(|entry| DynamicItem {
                        value: entry.get("value").cloned().unwrap_or(Value::Null),
                        widget: entry.get("widget").map_or(Spec::Null, |w| self.spec_from_value(w)),
                    })
                    .collect(),
            ),
            _ => Prop::Value(value.clone()),
        }
    }
}

fn common_from_object(kind: &str, object: &Map<String, Value>) -> Common {
    let mismatch = |field: &str, expected: &'static str| {
        diagnostics::report(Diagnostic::TypeMismatch {
            kind: kind.to_string(),
            field: field.to_string(),
            expected,
        });
    };
    let string = |field: &str| match object.get(field) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            mismatch(field, "a string");
            None
        }
    };
    let boolean = |field: &str| match object.get(field) {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            mismatch(field, "a boolean");
            None
        }
    };

    let mut common = Common {
        class_name: string("className"),
        style: string("style"),
        halign: string("halign"),
        valign: string("valign"),
        hexpand: boolean("hexpand"),
        vexpand: boolean("vexpand"),
        sensitive: boolean("sensitive"),
        tooltip: string("tooltip"),
        visible: boolean("visible"),
        ..Default::default()
    };

    match object.get("properties") {
        None => {}
        Some(Value::Object(map)) => {
            common.properties = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        }
        Some(Value::Array(pairs)) => {
            for pair in pairs {
                match pair.as_array().map(Vec::as_slice) {
                    Some([Value::String(key), value]) => common.properties.push((key.clone(), value.clone())),
                    _ => mismatch("properties", "a list of [key, value] pairs"),
                }
            }
        }
        Some(_) => mismatch("properties", "a list of [key, value] pairs"),
    }

    for field in ["connections", "setup"] {
        if object.contains_key(field) {
            diagnostics::report(Diagnostic::Unrepresentable {
                field: field.to_string(),
            });
        }
    }

    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::diagnostics::{reset_diagnostics, take_reported};
    use crate::engine::reset_registry;
    use crate::icons::IconSet;
    use crate::types::{Align, NodeKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;
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
    fn test_nested_children_become_specs() {
        let resolver = setup();

        let node = resolver.resolve_value(&json!({
            "type": "box",
            "className": "bar",
            "halign": "end",
            "children": [
                "plain text",
                { "type": "label", "label": "clock", "className": "clock" },
            ],
        }));

        assert_eq!(node.kind(), Some(NodeKind::Box));
        assert!(node.has_class("bar"));
        assert_eq!(node.halign(), Align::End);
        let children = node.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].label().as_deref(), Some("plain text"));
        assert!(children[1].has_class("clock"));
        assert!(take_reported().is_empty());
    }

    #[test]
    fn test_callables_are_unrepresentable() {
        let resolver = setup();

        let node = resolver.resolve_value(&json!({
            "type": "label",
            "connections": [[1000, "tick"]],
            "setup": "x",
        }));

        assert_eq!(node.kind(), Some(NodeKind::Label));
        assert_eq!(
            take_reported(),
            vec![
                Diagnostic::Unrepresentable { field: "connections".into() },
                Diagnostic::Unrepresentable { field: "setup".into() },
            ]
        );
    }

    #[test]
    fn test_universal_mismatch_skips_field() {
        let resolver = setup();

        let node = resolver.resolve_value(&json!({ "type": "box", "hexpand": "yes", "tooltip": "tip" }));

        assert!(!node.hexpand());
        assert_eq!(node.tooltip().as_deref(), Some("tip"));
        assert_eq!(
            take_reported(),
            vec![Diagnostic::TypeMismatch {
                kind: "box".into(),
                field: "hexpand".into(),
                expected: "a boolean",
            }]
        );
    }

    #[test]
    fn test_properties_as_pairs() {
        let resolver = setup();

        let node = resolver.resolve_value(&json!({ "type": "box", "properties": [["index", 2]] }));
        assert_eq!(node.property("index"), Some(json!(2)));
    }

    #[test]
    fn test_missing_type_is_placeholder() {
        let resolver = setup();

        let node = resolver.resolve_value(&json!({ "className": "lost" }));
        assert_eq!(node.label().as_deref(), Some("error widget from: \"null\""));
        assert_eq!(take_reported(), vec![Diagnostic::UnknownType("null".into())]);
    }
}
