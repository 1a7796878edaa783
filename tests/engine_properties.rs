//! End-to-end properties of resolution and the composite renderers.

use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;

use spark_shell::diagnostics::{error_count, reset_diagnostics, take_reported};
use spark_shell::engine::events;
use spark_shell::engine::timer::{advance, reset_timers};
use spark_shell::renderers::taskbar::{Matcher, match_client};
use spark_shell::renderers::{WINDOW_ICON, WORKSPACES};
use spark_shell::service::hyprland::{ActiveClient, Client, MemoryHyprctl, Workspace, WorkspaceRef};
use spark_shell::{
    Applications, CapturingExecutor, Connection, Declaration, Diagnostic, EngineConfig, Hyprland, HyprlandState,
    IconSet, NodeId, Resolver, Spec, engine::IconSource, register_hyprland, reset_registry,
};

fn setup(icons: &[&str]) -> (Resolver, Hyprland) {
    reset_registry();
    reset_timers();
    reset_diagnostics();

    let hyprland = Hyprland::new(Rc::new(MemoryHyprctl::new()));
    let resolver = Resolver::with_parts(
        EngineConfig::default(),
        Rc::new(CapturingExecutor::new()),
        Rc::new(IconSet::new(icons.iter().copied())),
    );
    register_hyprland(&resolver, &hyprland, &Applications::new(Vec::new()));
    (resolver, hyprland)
}

#[test]
fn unknown_type_resolves_to_placeholder() {
    let (resolver, _) = setup(&[]);

    let node = resolver.resolve(&Declaration::new("no-such-widget").into());

    let text = node.label().unwrap_or_default();
    assert!(text.contains("no-such-widget"), "placeholder text: {text}");
    assert_eq!(error_count(), 1);
    assert_eq!(take_reported(), vec![Diagnostic::UnknownType("no-such-widget".into())]);
}

#[test]
fn omitted_visible_means_visible() {
    let (resolver, _) = setup(&[]);

    for tag in ["box", "label", "button", "icon", "slider", "revealer"] {
        let node = resolver.resolve(&Declaration::new(tag).into());
        assert!(node.is_visible(), "{tag} should start visible");
    }
}

#[test]
fn class_names_are_deduplicated() {
    let (resolver, _) = setup(&[]);

    let node = resolver.resolve(&Declaration::new("box").class_name("a a b").into());

    let mut classes = node.class_names();
    classes.sort();
    assert_eq!(classes, vec!["a", "b"]);
}

#[test]
fn intervals_and_signals_are_independent() {
    let (resolver, _) = setup(&[]);
    let ticks = Rc::new(Cell::new(0));
    let clicks = Rc::new(Cell::new(0));

    let t = ticks.clone();
    let c = clicks.clone();
    let decl = Declaration::new("button")
        .connect(Connection::interval(250, move |_| t.set(t.get() + 1)))
        .connect(Connection::signal(events::CLICKED, move |_, _| c.set(c.get() + 1)));
    let node = resolver.resolve(&decl.into());

    advance(1000);
    assert!(ticks.get() >= 4, "ticks: {}", ticks.get());
    assert_eq!(clicks.get(), 0);

    events::click(node);
    assert_eq!(clicks.get(), 1);

    let before = ticks.get();
    node.destroy();
    advance(1000);
    assert_eq!(ticks.get(), before);
}

#[test]
fn fixed_workspaces_tie_break() {
    let (resolver, hyprland) = setup(&[]);
    let mut state = HyprlandState::default();
    state.active.workspace = WorkspaceRef {
        id: 1,
        name: "1".into(),
    };
    state.set_workspaces(vec![
        Workspace {
            id: 1,
            name: "1".into(),
            windows: 2,
            monitor: "DP-1".into(),
        },
        Workspace {
            id: 3,
            name: "3".into(),
            windows: 0,
            monitor: "DP-1".into(),
        },
    ]);
    hyprland.set_state(state);

    let node = resolver.resolve_value(&json!({ "type": WORKSPACES, "fixed": 3 }));

    let classes: Vec<Vec<String>> = node.children().iter().map(|slot| slot.class_names()).collect();
    assert_eq!(classes, vec![vec!["active"], vec!["empty"], vec!["empty"]]);
}

#[test]
fn window_icon_prefers_resolvable_class_over_fallback() {
    let (resolver, hyprland) = setup(&["firefox"]);
    let mut state = HyprlandState::default();
    state.active.client = ActiveClient {
        address: "0xabc".into(),
        title: "Mozilla Firefox".into(),
        class: "firefox".into(),
    };
    hyprland.set_state(state);

    let node = resolver.resolve_value(&json!({ "type": WINDOW_ICON, "fallback": "app-icon" }));

    assert_eq!(node.icon(), Some(IconSource::Named("firefox".into())));
    assert!(node.is_visible());
}

struct Exact(&'static str);

impl Matcher for Exact {
    fn matches(&self, text: &str) -> bool {
        text == self.0
    }
}

#[test]
fn taskbar_title_pass_precedes_class_pass() {
    let registry = [Exact("firefox"), Exact("Firefox")];
    let client = Client {
        title: "Firefox".into(),
        class: "firefox".into(),
        ..Default::default()
    };

    let chosen = match_client(&registry, &client).map(|entry| entry.0);
    assert_eq!(chosen, Some("Firefox"));

    let untitled = Client {
        class: "firefox".into(),
        ..Default::default()
    };
    assert_eq!(match_client(&registry, &untitled).map(|entry| entry.0), Some("firefox"));
}

#[test]
fn resolving_twice_yields_independent_nodes() {
    let (resolver, _) = setup(&[]);
    let spec: Spec = Declaration::new("box")
        .class_name("bar")
        .halign("center")
        .field("children", vec![Spec::from("a"), Spec::from("b")])
        .into();

    let first = resolver.resolve(&spec);
    let second = resolver.resolve(&spec);

    assert_ne!(first, second);
    assert_eq!(first.class_names(), second.class_names());
    assert_eq!(first.halign(), second.halign());
    let labels = |node: NodeId| node.children().iter().map(|c| c.label()).collect::<Vec<_>>();
    assert_eq!(labels(first), labels(second));

    first.toggle_class_name("changed", true);
    first.children()[0].set_label("x");
    assert!(!second.has_class("changed"));
    assert_eq!(second.children()[0].label().as_deref(), Some("a"));
    assert!(first.children().iter().all(|c| !second.children().contains(c)));
}
