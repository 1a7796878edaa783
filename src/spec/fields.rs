//! Kind-specific fields and their static declarations.
//!
//! Every builder declares the fields it reads as a `&'static [FieldSpec]`.
//! Before a builder runs, [`check_fields`] compares what the author wrote
//! against that declaration: values of the wrong shape are reported and
//! dropped, names the builder does not know are reported and left unread.

use std::any::Any;
use std::rc::Rc;

use serde_json::Value;

use super::{DynamicItem, Prop, Spec};
use crate::command::Command;
use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;

// =============================================================================
// Declarations
// =============================================================================

/// Shape of a kind-specific field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Number,
    Bool,
    /// A single child spec.
    Spec,
    /// A list of child specs.
    Specs,
    /// `[name, spec]` pairs.
    Named,
    /// `{value, widget}` entries.
    Items,
    /// Shell template or callback.
    Command,
    /// Already built node.
    Node,
    /// Arbitrary JSON array.
    Array,
    Opaque,
}

impl FieldType {
    /// Wording used in type mismatch reports.
    pub fn describe(self) -> &'static str {
        match self {
            FieldType::Str => "a string",
            FieldType::Number => "a number",
            FieldType::Bool => "a boolean",
            FieldType::Spec => "a widget",
            FieldType::Specs => "an array of widgets",
            FieldType::Named => "an array of [name, widget] pairs",
            FieldType::Items => "an array of {value, widget} items",
            FieldType::Command => "a string or a function",
            FieldType::Node => "a widget instance",
            FieldType::Array => "an array",
            FieldType::Opaque => "a function",
        }
    }

    pub fn accepts(self, prop: &Prop) -> bool {
        match (self, prop) {
            (FieldType::Str, Prop::Value(v)) => v.is_string(),
            (FieldType::Number, Prop::Value(v)) => v.is_number(),
            (FieldType::Bool, Prop::Value(v)) => v.is_boolean(),
            (FieldType::Spec, Prop::Spec(_) | Prop::Node(_)) => true,
            (FieldType::Spec, Prop::Value(v)) => v.is_string() || v.is_null(),
            (FieldType::Specs, Prop::Specs(_)) => true,
            (FieldType::Named, Prop::Named(_)) => true,
            (FieldType::Items, Prop::Items(_)) => true,
            (FieldType::Command, Prop::Command(_)) => true,
            (FieldType::Command, Prop::Value(v)) => v.is_string(),
            (FieldType::Node, Prop::Node(_)) => true,
            (FieldType::Array, Prop::Value(v)) => v.is_array(),
            (FieldType::Opaque, Prop::Opaque(_)) => true,
            _ => false,
        }
    }
}

/// One entry of a builder's field declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

pub const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

/// Look up a field declaration by name.
pub fn lookup(declared: &[FieldSpec], name: &str) -> Option<FieldType> {
    declared.iter().find(|f| f.name == name).map(|f| f.ty)
}

/// Validate `fields` for `kind`, returning only the entries the builder may read.
///
/// Mismatched values are reported and dropped so the builder falls back to
/// its default. Unknown names are reported and dropped.
pub fn check_fields(kind: &str, declared: &[FieldSpec], fields: &Fields) -> Fields {
    let mut checked = Fields::new();
    for (name, prop) in fields.iter() {
        match lookup(declared, name) {
            Some(ty) if ty.accepts(prop) => checked.set(name, prop.clone()),
            Some(ty) => diagnostics::report(Diagnostic::TypeMismatch {
                kind: kind.to_string(),
                field: name.to_string(),
                expected: ty.describe(),
            }),
            None => diagnostics::report(Diagnostic::UnknownField {
                kind: kind.to_string(),
                field: name.to_string(),
            }),
        }
    }
    checked
}

// =============================================================================
// Fields
// =============================================================================

/// Ordered kind-specific fields of a declaration.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    entries: Vec<(String, Prop)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value of the same name in place.
    pub fn set(&mut self, name: &str, prop: Prop) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = prop,
            None => self.entries.push((name.to_string(), prop)),
        }
    }

    pub fn with(mut self, name: &str, prop: impl Into<Prop>) -> Self {
        self.set(name, prop.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Copy of these fields without the named entries.
    pub fn without(&self, names: &[&str]) -> Fields {
        Fields {
            entries: self
                .entries
                .iter()
                .filter(|(n, _)| !names.contains(&n.as_str()))
                .cloned()
                .collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Typed access
    // -------------------------------------------------------------------------

    fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Prop::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name)?.as_str()
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name)?.as_f64()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name)?.as_bool()
    }

    pub fn array(&self, name: &str) -> Option<&[Value]> {
        self.value(name)?.as_array().map(Vec::as_slice)
    }

    /// A child spec. Text becomes a label spec, JSON null a null spec.
    pub fn spec(&self, name: &str) -> Option<Spec> {
        match self.get(name)? {
            Prop::Spec(spec) => Some(spec.clone()),
            Prop::Node(node) => Some(Spec::Node(*node)),
            Prop::Value(Value::String(text)) => Some(Spec::Text(text.clone())),
            Prop::Value(Value::Null) => Some(Spec::Null),
            _ => None,
        }
    }

    pub fn specs(&self, name: &str) -> Vec<Spec> {
        match self.get(name) {
            Some(Prop::Specs(specs)) => specs.clone(),
            _ => Vec::new(),
        }
    }

    pub fn named(&self, name: &str) -> Vec<(String, Spec)> {
        match self.get(name) {
            Some(Prop::Named(named)) => named.clone(),
            _ => Vec::new(),
        }
    }

    pub fn items(&self, name: &str) -> Vec<DynamicItem> {
        match self.get(name) {
            Some(Prop::Items(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// A command. Empty templates read as absent.
    pub fn command(&self, name: &str) -> Option<Command> {
        let command = match self.get(name)? {
            Prop::Command(command) => command.clone(),
            Prop::Value(Value::String(template)) => Command::Template(template.clone()),
            _ => return None,
        };
        (!command.is_noop()).then_some(command)
    }

    pub fn node(&self, name: &str) -> Option<NodeId> {
        match self.get(name)? {
            Prop::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn opaque<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        match self.get(name)? {
            Prop::Opaque(payload) => Rc::clone(payload).downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// Wrap a builder-specific payload for an [`FieldType::Opaque`] field.
pub fn opaque<T: 'static>(payload: T) -> Prop {
    Prop::Opaque(Rc::new(payload) as Rc<dyn Any>)
}
