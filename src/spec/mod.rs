//! Specs - declarative descriptions of nodes.
//!
//! A [`Spec`] is what authors write. The [`Resolver`] turns it into a live
//! node:
//!
//! ```text
//! Spec ──► Resolver ──► Registry builder ──► bare node ──► apply(common) ──► node
//! ```
//!
//! Structured specs are [`Declaration`]s: a type reference, the universal
//! fields every node understands ([`Common`]) and the kind-specific
//! [`Fields`] only the matching builder reads.
//!
//! # Example
//!
//! ```ignore
//! use spark_shell::spec::{Connection, Declaration, Spec};
//!
//! let clock = Declaration::new("label")
//!     .field("label", "--:--")
//!     .class_name("clock bar-item")
//!     .halign("center")
//!     .connect(Connection::interval(1000, |label| {
//!         label.set_label(&current_time());
//!     }));
//!
//! let node = resolver.resolve(&clock.into());
//! ```

mod apply;
mod fields;
mod json;
mod resolve;

pub use apply::apply;
pub use fields::*;
pub use resolve::Resolver;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::command::Command;
use crate::engine::NodeId;
use crate::engine::events::Handler;
use crate::service::Connectable;

// =============================================================================
// Callback Types
// =============================================================================

/// Callback receiving a finished node (`setup`, interval ticks).
pub type NodeCallback = Rc<dyn Fn(NodeId)>;

/// Zero-argument node producer.
pub type NodeFactory = Rc<dyn Fn() -> NodeId>;

/// Callback receiving a node and event arguments (signals, services).
pub type SignalCallback = Handler;

// =============================================================================
// Spec
// =============================================================================

/// Anything the resolver accepts.
#[derive(Clone, Default)]
pub enum Spec {
    /// Missing spec; resolves to a visible error placeholder.
    #[default]
    Null,
    /// Plain text; resolves to a label leaf.
    Text(String),
    /// Produces the node itself; the result is used undecorated.
    Factory(NodeFactory),
    /// Already built; passed through unchanged.
    Node(NodeId),
    Declared(Box<Declaration>),
}

impl Spec {
    pub fn factory(f: impl Fn() -> NodeId + 'static) -> Self {
        Spec::Factory(Rc::new(f))
    }

    /// Short human-readable form used in placeholders and logs.
    pub fn describe(&self) -> String {
        match self {
            Spec::Null => "null".to_string(),
            Spec::Text(text) => text.clone(),
            Spec::Factory(_) => "<factory>".to_string(),
            Spec::Node(node) => format!("{node:?}"),
            Spec::Declared(decl) => decl.ty.describe(),
        }
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spec::Null => f.write_str("Null"),
            Spec::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Spec::Factory(_) => f.write_str("Factory(..)"),
            Spec::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Spec::Declared(decl) => f.debug_tuple("Declared").field(decl).finish(),
        }
    }
}

impl From<&str> for Spec {
    fn from(text: &str) -> Self {
        Spec::Text(text.to_string())
    }
}

impl From<String> for Spec {
    fn from(text: String) -> Self {
        Spec::Text(text)
    }
}

impl From<NodeId> for Spec {
    fn from(node: NodeId) -> Self {
        Spec::Node(node)
    }
}

impl From<Declaration> for Spec {
    fn from(decl: Declaration) -> Self {
        Spec::Declared(Box::new(decl))
    }
}

impl<T: Into<Spec>> From<Option<T>> for Spec {
    fn from(spec: Option<T>) -> Self {
        spec.map_or(Spec::Null, Into::into)
    }
}

// =============================================================================
// Type Reference
// =============================================================================

/// The `type` of a declaration.
#[derive(Clone, Default)]
pub enum TypeRef {
    #[default]
    Missing,
    /// Registry key.
    Tag(String),
    /// Called with no arguments; the declaration's fields are not passed.
    Factory(NodeFactory),
    Node(NodeId),
}

impl TypeRef {
    pub fn describe(&self) -> String {
        match self {
            TypeRef::Missing => "null".to_string(),
            TypeRef::Tag(tag) => tag.clone(),
            TypeRef::Factory(_) => "<factory>".to_string(),
            TypeRef::Node(node) => format!("{node:?}"),
        }
    }
}

// =============================================================================
// Connections
// =============================================================================

/// A binding attached to a node during decoration.
#[derive(Clone)]
pub enum Connection {
    /// Native signal; callback gets the node and the event arguments.
    Signal { name: String, callback: SignalCallback },
    /// Recurring timer; callback gets the node on every tick.
    Interval { period_ms: u64, callback: NodeCallback },
    /// Delegated subscription; the service decides when to call back.
    Service {
        service: Rc<dyn Connectable>,
        callback: SignalCallback,
        event: Option<String>,
    },
}

impl Connection {
    pub fn signal(name: &str, callback: impl Fn(NodeId, &[Value]) + 'static) -> Self {
        Connection::Signal {
            name: name.to_string(),
            callback: Rc::new(callback),
        }
    }

    pub fn interval(period_ms: u64, callback: impl Fn(NodeId) + 'static) -> Self {
        Connection::Interval {
            period_ms,
            callback: Rc::new(callback),
        }
    }

    pub fn service(service: Rc<dyn Connectable>, callback: impl Fn(NodeId, &[Value]) + 'static) -> Self {
        Connection::Service {
            service,
            callback: Rc::new(callback),
            event: None,
        }
    }

    pub fn service_event(
        service: Rc<dyn Connectable>,
        event: &str,
        callback: impl Fn(NodeId, &[Value]) + 'static,
    ) -> Self {
        Connection::Service {
            service,
            callback: Rc::new(callback),
            event: Some(event.to_string()),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Signal { name, .. } => write!(f, "Signal({name})"),
            Connection::Interval { period_ms, .. } => write!(f, "Interval({period_ms}ms)"),
            Connection::Service { event, .. } => write!(f, "Service({})", event.as_deref().unwrap_or("changed")),
        }
    }
}

// =============================================================================
// Universal Fields
// =============================================================================

/// Fields every node understands, regardless of kind.
#[derive(Clone, Default)]
pub struct Common {
    pub class_name: Option<String>,
    pub style: Option<String>,
    pub halign: Option<String>,
    pub valign: Option<String>,
    pub hexpand: Option<bool>,
    pub vexpand: Option<bool>,
    pub sensitive: Option<bool>,
    pub tooltip: Option<String>,
    pub visible: Option<bool>,
    pub connections: Vec<Connection>,
    pub properties: Vec<(String, Value)>,
    pub setup: Option<NodeCallback>,
}

impl fmt::Debug for Common {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Common")
            .field("class_name", &self.class_name)
            .field("style", &self.style)
            .field("halign", &self.halign)
            .field("valign", &self.valign)
            .field("hexpand", &self.hexpand)
            .field("vexpand", &self.vexpand)
            .field("sensitive", &self.sensitive)
            .field("tooltip", &self.tooltip)
            .field("visible", &self.visible)
            .field("connections", &self.connections)
            .field("properties", &self.properties)
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

// =============================================================================
// Declaration
// =============================================================================

/// A structured spec.
#[derive(Clone, Default)]
pub struct Declaration {
    pub ty: TypeRef,
    pub common: Common,
    pub fields: Fields,
}

impl Declaration {
    /// Declaration of a registered kind, e.g. `"label"`.
    pub fn new(tag: &str) -> Self {
        Self {
            ty: TypeRef::Tag(tag.to_string()),
            ..Default::default()
        }
    }

    /// Declaration whose base node comes from `factory`.
    pub fn from_factory(factory: impl Fn() -> NodeId + 'static) -> Self {
        Self {
            ty: TypeRef::Factory(Rc::new(factory)),
            ..Default::default()
        }
    }

    /// Declaration decorating an existing node.
    pub fn from_node(node: NodeId) -> Self {
        Self {
            ty: TypeRef::Node(node),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: &str, value: impl Into<Prop>) -> Self {
        self.fields.set(name, value.into());
        self
    }

    pub fn class_name(mut self, class_name: &str) -> Self {
        self.common.class_name = Some(class_name.to_string());
        self
    }

    pub fn style(mut self, css: &str) -> Self {
        self.common.style = Some(css.to_string());
        self
    }

    pub fn halign(mut self, align: &str) -> Self {
        self.common.halign = Some(align.to_string());
        self
    }

    pub fn valign(mut self, align: &str) -> Self {
        self.common.valign = Some(align.to_string());
        self
    }

    pub fn hexpand(mut self, expand: bool) -> Self {
        self.common.hexpand = Some(expand);
        self
    }

    pub fn vexpand(mut self, expand: bool) -> Self {
        self.common.vexpand = Some(expand);
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.common.sensitive = Some(sensitive);
        self
    }

    pub fn tooltip(mut self, text: &str) -> Self {
        self.common.tooltip = Some(text.to_string());
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.common.visible = Some(visible);
        self
    }

    pub fn connect(mut self, connection: Connection) -> Self {
        self.common.connections.push(connection);
        self
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.common.properties.push((key.to_string(), value.into()));
        self
    }

    pub fn setup(mut self, setup: impl Fn(NodeId) + 'static) -> Self {
        self.common.setup = Some(Rc::new(setup));
        self
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("type", &self.ty.describe())
            .field("common", &self.common)
            .field("fields", &self.fields)
            .finish()
    }
}

// =============================================================================
// Kind-specific Field Values
// =============================================================================

/// One entry of a `dynamic` widget: the value it is shown for, and the widget.
#[derive(Clone, Debug)]
pub struct DynamicItem {
    pub value: Value,
    pub widget: Spec,
}

/// Value of a kind-specific field.
#[derive(Clone)]
pub enum Prop {
    Value(Value),
    Spec(Spec),
    Specs(Vec<Spec>),
    /// Named children, e.g. stack pages.
    Named(Vec<(String, Spec)>),
    Items(Vec<DynamicItem>),
    Command(Command),
    Node(NodeId),
    /// Builder-specific payload such as a renderer's item factory.
    Opaque(Rc<dyn Any>),
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Value(value) => write!(f, "{value}"),
            Prop::Spec(spec) => spec.fmt(f),
            Prop::Specs(specs) => f.debug_list().entries(specs).finish(),
            Prop::Named(named) => f.debug_list().entries(named).finish(),
            Prop::Items(items) => f.debug_list().entries(items).finish(),
            Prop::Command(command) => command.fmt(f),
            Prop::Node(node) => node.fmt(f),
            Prop::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Value(value)
    }
}

impl From<&str> for Prop {
    fn from(text: &str) -> Self {
        Prop::Value(Value::from(text))
    }
}

impl From<String> for Prop {
    fn from(text: String) -> Self {
        Prop::Value(Value::from(text))
    }
}

impl From<bool> for Prop {
    fn from(flag: bool) -> Self {
        Prop::Value(Value::from(flag))
    }
}

impl From<f64> for Prop {
    fn from(number: f64) -> Self {
        Prop::Value(Value::from(number))
    }
}

impl From<i64> for Prop {
    fn from(number: i64) -> Self {
        Prop::Value(Value::from(number))
    }
}

impl From<i32> for Prop {
    fn from(number: i32) -> Self {
        Prop::Value(Value::from(number))
    }
}

impl From<u32> for Prop {
    fn from(number: u32) -> Self {
        Prop::Value(Value::from(number))
    }
}

impl From<Spec> for Prop {
    fn from(spec: Spec) -> Self {
        Prop::Spec(spec)
    }
}

impl From<Declaration> for Prop {
    fn from(decl: Declaration) -> Self {
        Prop::Spec(decl.into())
    }
}

impl From<Vec<Spec>> for Prop {
    fn from(specs: Vec<Spec>) -> Self {
        Prop::Specs(specs)
    }
}

impl From<Vec<DynamicItem>> for Prop {
    fn from(items: Vec<DynamicItem>) -> Self {
        Prop::Items(items)
    }
}

impl From<Command> for Prop {
    fn from(command: Command) -> Self {
        Prop::Command(command)
    }
}

impl From<NodeId> for Prop {
    fn from(node: NodeId) -> Self {
        Prop::Node(node)
    }
}
