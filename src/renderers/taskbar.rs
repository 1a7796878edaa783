//! Taskbar: one entry per client that some application claims.
//!
//! Matching runs in two passes over the application list in list order.
//! The first entry that accepts the client title wins; only when no entry
//! accepts the title does the class get a pass. Clients nobody claims are
//! not rendered.
//!
//! # Example
//!
//! ```ignore
//! let item = taskbar::item_factory(|app, client, _| {
//!     Declaration::new("label").field("label", format!("{} - {}", app.name, client.title)).into()
//! });
//! let bar = resolver.resolve(&Declaration::new(TASKBAR).field("item", item).into());
//! ```

use std::rc::Rc;

use super::{FullRebuild, Reconciler};
use crate::command::Command;
use crate::engine::NodeId;
use crate::service::CHANGED;
use crate::service::applications::{Application, Applications};
use crate::service::hyprland::{Client, Hyprland, HyprlandState};
use crate::spec::{Declaration, FieldSpec, FieldType, Fields, Prop, Resolver, Spec, field, opaque};
use crate::widgets::containers;

pub const TASKBAR_FIELDS: &[FieldSpec] = &[
    field("orientation", FieldType::Str),
    field("homogeneous", FieldType::Bool),
    field("item", FieldType::Opaque),
];

// =============================================================================
// Matching
// =============================================================================

/// Decides whether an entry claims a client title or class.
pub trait Matcher {
    fn matches(&self, text: &str) -> bool;
}

impl Matcher for Application {
    fn matches(&self, text: &str) -> bool {
        Application::matches(self, text)
    }
}

/// First entry accepting the title, else first accepting the class.
///
/// An empty title or class never takes part.
pub fn match_client<'a, M: Matcher>(entries: &'a [M], client: &Client) -> Option<&'a M> {
    [client.title.as_str(), client.class.as_str()]
        .into_iter()
        .filter(|text| !text.is_empty())
        .find_map(|text| entries.iter().find(|entry| entry.matches(text)))
}

// =============================================================================
// Items
// =============================================================================

/// Builds the spec rendered for one matched client.
pub type ItemFactory = Rc<dyn Fn(&Application, &Client, &HyprlandState) -> Spec>;

/// Wrap a custom item builder for the `item` field.
pub fn item_factory(f: impl Fn(&Application, &Client, &HyprlandState) -> Spec + 'static) -> Prop {
    opaque::<ItemFactory>(Rc::new(f))
}

/// Icon button focusing the client on click.
pub fn default_item(hyprland: &Hyprland) -> ItemFactory {
    let hyprland = hyprland.clone();
    Rc::new(move |app: &Application, client: &Client, state: &HyprlandState| {
        let class = if state.is_focused(client) { "focused" } else { "nonfocused" };
        let command = format!("dispatch focuswindow address:{}", client.address);
        let hyprland = hyprland.clone();

        Declaration::new("button")
            .field("child", Declaration::new("icon").field("icon", app.icon_name.as_str()))
            .tooltip(&client.title)
            .class_name(class)
            .field("onClick", Command::callback(move |_, _| hyprland.hyprctl(&command)))
            .into()
    })
}

/// Specs for every claimed client, in client order.
pub fn taskbar_items(apps: &[Application], state: &HyprlandState, item: &ItemFactory) -> Vec<Spec> {
    state
        .clients
        .iter()
        .filter_map(|client| match_client(apps, client).map(|app| item(app, client, state)))
        .collect()
}

// =============================================================================
// Renderer
// =============================================================================

/// Box of taskbar entries, rebuilt when clients or applications change.
pub fn build_taskbar(
    resolver: &Resolver,
    hyprland: &Hyprland,
    apps: &Applications,
    tag: &str,
    fields: &Fields,
) -> NodeId {
    let node = containers::build_box(resolver, tag, fields);
    let item = fields
        .opaque::<ItemFactory>("item")
        .map_or_else(|| default_item(hyprland), |item| Rc::clone(&*item));

    let rebuild: Rc<dyn Fn(NodeId, &HyprlandState)> = {
        let resolver = resolver.clone();
        let apps = apps.clone();
        Rc::new(move |node: NodeId, state: &HyprlandState| {
            let entries = apps.query("");
            FullRebuild.reconcile(&resolver, node, &taskbar_items(&entries, state, &item));
        })
    };

    {
        let hyprland = hyprland.clone();
        let rebuild = Rc::clone(&rebuild);
        apps.service()
            .connect_event(node, CHANGED, move |node, _, _| rebuild(node, &hyprland.snapshot()));
    }
    hyprland.connect(node, move |node, state| rebuild(node, state));
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CapturingExecutor;
    use crate::config::EngineConfig;
    use crate::engine::{events, reset_registry};
    use crate::icons::IconSet;
    use crate::renderers::{TASKBAR, register_hyprland};
    use crate::service::hyprland::{ActiveClient, MemoryHyprctl};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Exact(&'static str);

    impl Matcher for Exact {
        fn matches(&self, text: &str) -> bool {
            text == self.0
        }
    }

    fn client(address: &str, title: &str, class: &str) -> Client {
        Client {
            address: address.into(),
            title: title.into(),
            class: class.into(),
            ..Default::default()
        }
    }

    fn app(name: &str, icon: &str) -> Application {
        Application {
            name: name.into(),
            desktop: format!("{}.desktop", name.to_lowercase()),
            icon_name: icon.into(),
            ..Default::default()
        }
    }

    fn setup(apps: Vec<Application>) -> (Resolver, Hyprland, Applications, MemoryHyprctl) {
        reset_registry();
        let ctl = MemoryHyprctl::new();
        let hyprland = Hyprland::new(Rc::new(ctl.clone()));
        let apps = Applications::new(apps);
        let resolver = Resolver::with_parts(
            EngineConfig::default(),
            Rc::new(CapturingExecutor::new()),
            Rc::new(IconSet::default()),
        );
        register_hyprland(&resolver, &hyprland, &apps);
        (resolver, hyprland, apps, ctl)
    }

    #[test]
    fn test_title_pass_before_class_pass() {
        let entries = [Exact("firefox"), Exact("Firefox")];
        let matched = match_client(&entries, &client("0x1", "Firefox", "firefox"));
        assert_eq!(matched.map(|e| e.0), Some("Firefox"));

        let by_class = match_client(&entries, &client("0x1", "Mozilla", "firefox"));
        assert_eq!(by_class.map(|e| e.0), Some("firefox"));
    }

    #[test]
    fn test_empty_title_and_class_skip() {
        let entries = [Exact("")];
        assert!(match_client(&entries, &client("0x1", "", "")).is_none());
    }

    #[test]
    fn test_default_items() {
        let (resolver, hyprland, _, ctl) = setup(vec![app("Firefox", "firefox"), app("Foot", "foot")]);
        let mut state = HyprlandState::default();
        state.clients = vec![
            client("0xaa", "Mozilla Firefox", "firefox"),
            client("0xbb", "unclaimed", "xterm"),
            client("0xcc", "~", "foot"),
        ];
        state.active.client = ActiveClient {
            address: "cc".into(),
            ..Default::default()
        };
        hyprland.set_state(state);

        let bar = resolver.resolve_value(&json!({ "type": TASKBAR }));
        let items = bar.children();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].class_names(), vec!["nonfocused"]);
        assert_eq!(items[1].class_names(), vec!["focused"]);
        assert_eq!(items[0].tooltip().as_deref(), Some("Mozilla Firefox"));
        assert_eq!(items[1].children()[0].icon().map(|i| i.as_name()).as_deref(), Some("foot"));

        events::click(items[0]);
        assert_eq!(ctl.take_dispatched(), vec!["dispatch focuswindow address:0xaa"]);
    }

    #[test]
    fn test_rebuilds_on_application_change() {
        let (resolver, hyprland, apps, _) = setup(Vec::new());
        let mut state = HyprlandState::default();
        state.clients = vec![client("0x1", "~", "foot")];
        hyprland.set_state(state);

        let bar = resolver.resolve_value(&json!({ "type": TASKBAR }));
        assert!(bar.children().is_empty());

        apps.reload(vec![app("Foot", "foot")]);
        assert_eq!(bar.children().len(), 1);
    }

    #[test]
    fn test_custom_item_factory() {
        let (resolver, hyprland, _, _) = setup(vec![app("Foot", "foot")]);
        let mut state = HyprlandState::default();
        state.clients = vec![client("0x1", "~", "foot")];
        hyprland.set_state(state);

        let item = item_factory(|app, client, _| Spec::Text(format!("{}: {}", app.name, client.title)));
        let bar = resolver.resolve(&Declaration::new(TASKBAR).field("item", item).into());
        assert_eq!(bar.children()[0].label().as_deref(), Some("Foot: ~"));
    }
}
