//! Resolver - turns any [`Spec`] into a live node.
//!
//! The resolver owns the builder registry and the collaborators builders
//! need (command executor, icon theme, configuration). It is a cheap handle:
//! clones share the same registry, so builders and renderers can keep one
//! and call back into it when they resolve children.

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::{Executor, ShellExecutor};
use crate::config::EngineConfig;
use crate::diagnostics::{self, Diagnostic};
use crate::engine::NodeId;
use crate::icons::{IconIndex, IconSet, IconTheme};
use crate::widgets::{self, Builder, Registry};

use super::{Declaration, Fields, Spec, TypeRef, apply, check_fields};

struct ResolverInner {
    registry: RefCell<Registry>,
    executor: Rc<dyn Executor>,
    icons: Rc<dyn IconTheme>,
    config: EngineConfig,
}

#[derive(Clone)]
pub struct Resolver {
    inner: Rc<ResolverInner>,
}

impl Resolver {
    /// Resolver with the default builders, a shell executor and an icon
    /// index over the configured icon directories.
    pub fn new(config: EngineConfig) -> Self {
        let icons: Rc<dyn IconTheme> = if config.icon_dirs.is_empty() {
            Rc::new(IconSet::default())
        } else {
            Rc::new(IconIndex::scan(config.icon_dirs.as_slice()))
        };
        Self::with_parts(config, Rc::new(ShellExecutor), icons)
    }

    pub fn with_parts(config: EngineConfig, executor: Rc<dyn Executor>, icons: Rc<dyn IconTheme>) -> Self {
        Self {
            inner: Rc::new(ResolverInner {
                registry: RefCell::new(Registry::with_defaults()),
                executor,
                icons,
                config,
            }),
        }
    }

    pub fn executor(&self) -> &dyn Executor {
        self.inner.executor.as_ref()
    }

    /// Owned executor handle for handlers that outlive the current call.
    pub fn shared_executor(&self) -> Rc<dyn Executor> {
        Rc::clone(&self.inner.executor)
    }

    pub fn icons(&self) -> &dyn IconTheme {
        self.inner.icons.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Register (or replace) the builder for `tag`.
    pub fn register(&self, tag: &str, builder: Builder) {
        self.inner.registry.borrow_mut().register(tag, builder);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.inner.registry.borrow().contains(tag)
    }

    pub fn builder(&self, tag: &str) -> Option<Builder> {
        self.inner.registry.borrow().get(tag).cloned()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.inner.registry.borrow().tags()
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    pub fn resolve(&self, spec: &Spec) -> NodeId {
        match spec {
            Spec::Null => {
                diagnostics::report(Diagnostic::NullSpec);
                self.placeholder("null")
            }
            Spec::Text(text) => widgets::text_label(text),
            Spec::Factory(factory) => factory(),
            Spec::Node(node) => *node,
            Spec::Declared(decl) => self.resolve_declaration(decl),
        }
    }

    fn resolve_declaration(&self, decl: &Declaration) -> NodeId {
        let base = match &decl.ty {
            TypeRef::Factory(factory) => {
                if !decl.fields.is_empty() {
                    tracing::debug!(fields = decl.fields.len(), "factory type ignores kind-specific fields");
                }
                Some(factory())
            }
            TypeRef::Tag(tag) => self.build(tag, &decl.fields),
            TypeRef::Node(node) => node.is_alive().then_some(*node),
            TypeRef::Missing => None,
        };

        match base {
            Some(node) => {
                apply(node, &decl.common);
                node
            }
            None => {
                let ty = decl.ty.describe();
                diagnostics::report(Diagnostic::UnknownType(ty.clone()));
                self.placeholder(&ty)
            }
        }
    }

    /// Run the builder registered for `tag`, or `None` if there is none.
    ///
    /// Fields are checked against the builder's declaration first.
    pub fn build(&self, tag: &str, fields: &Fields) -> Option<NodeId> {
        let builder = self.builder(tag)?;
        let checked = check_fields(tag, builder.fields, fields);
        let node = (builder.build)(self, tag, &checked);
        tracing::trace!(kind = tag, node = ?node, "built node");
        Some(node)
    }

    /// Resolve every spec in order.
    pub fn resolve_all(&self, specs: &[Spec]) -> Vec<NodeId> {
        specs.iter().map(|spec| self.resolve(spec)).collect()
    }

    /// Visible label standing in for a spec that could not be built.
    pub fn placeholder(&self, literal: &str) -> NodeId {
        widgets::text_label(&format!("error widget from: \"{literal}\""))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("tags", &self.tags())
            .field("config", &self.inner.config)
            .finish()
    }
}
