//! Hyprland service - compositor state for the workspace and window renderers.
//!
//! The snapshot is filled from `hyprctl -j monitors|workspaces|clients` and
//! kept current from the event socket (`event>>args` lines). Every handled
//! event ends with a `changed` notification.
//!
//! # Events
//!
//! | Event | Effect |
//! |---|---|
//! | `activewindow` | focused client class and title |
//! | `activewindowv2` | focused client address |
//! | `closewindow` | clears the focused client, resyncs |
//! | `urgent` | emits `urgent-window` with the address |
//! | `activelayout` | emits `keyboard-layout` with keyboard and layout |
//! | `changefloating` | updates the client's floating flag |
//! | anything else | resyncs |

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::{Command as Process, Stdio};
use std::rc::Rc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Connectable, Service, ServiceError};
use crate::command::spawn_reaped;
use crate::diagnostics::{self, Diagnostic};
use crate::engine::{Cleanup, NodeId};
use crate::spec::SignalCallback;

pub const URGENT_WINDOW: &str = "urgent-window";
pub const KEYBOARD_LAYOUT: &str = "keyboard-layout";

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkspaceRef {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Monitor {
    pub id: i64,
    pub name: String,
    pub focused: bool,
    pub active_workspace: WorkspaceRef,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub windows: u32,
    /// Name of the monitor showing this workspace.
    pub monitor: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Client {
    /// Hex address including the `0x` prefix.
    pub address: String,
    pub pid: i64,
    pub workspace: WorkspaceRef,
    pub monitor: i64,
    pub class: String,
    pub title: String,
    pub floating: bool,
}

/// The focused window as reported by `activewindow` events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveClient {
    pub address: String,
    pub title: String,
    pub class: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Active {
    pub client: ActiveClient,
    pub monitor: String,
    pub workspace: WorkspaceRef,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HyprlandState {
    pub active: Active,
    pub monitors: Vec<Monitor>,
    pub workspaces: BTreeMap<i64, Workspace>,
    pub clients: Vec<Client>,
}

/// Addresses arrive with and without the `0x` prefix.
fn bare_address(address: &str) -> &str {
    address.strip_prefix("0x").unwrap_or(address)
}

impl HyprlandState {
    pub fn workspace(&self, id: i64) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn monitor(&self, name: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.name == name)
    }

    pub fn client(&self, address: &str) -> Option<&Client> {
        let address = bare_address(address);
        self.clients.iter().find(|c| bare_address(&c.address) == address)
    }

    pub fn is_focused(&self, client: &Client) -> bool {
        let active = bare_address(&self.active.client.address);
        !active.is_empty() && bare_address(&client.address) == active
    }

    pub fn set_monitors(&mut self, monitors: Vec<Monitor>) {
        if let Some(focused) = monitors.iter().find(|m| m.focused) {
            self.active.monitor = focused.name.clone();
            self.active.workspace = focused.active_workspace.clone();
        }
        self.monitors = monitors;
    }

    pub fn set_workspaces(&mut self, workspaces: Vec<Workspace>) {
        self.workspaces = workspaces.into_iter().map(|ws| (ws.id, ws)).collect();
    }

    pub fn set_clients(&mut self, clients: Vec<Client>) {
        self.clients = clients;
    }
}

// =============================================================================
// Events
// =============================================================================

/// What the service has to do after an event was applied to the state.
#[derive(Clone, Debug, PartialEq)]
pub enum EventOutcome {
    Updated,
    Resync,
    /// Clear state, then resync.
    ClosedWindow,
    Emit(&'static str, Vec<Value>),
}

/// Apply one `name>>args` event to `state`.
pub fn apply_event(state: &mut HyprlandState, name: &str, args: &str) -> EventOutcome {
    match name {
        "activewindow" => {
            let (class, title) = args.split_once(',').unwrap_or((args, ""));
            state.active.client.class = class.to_string();
            state.active.client.title = title.to_string();
            EventOutcome::Updated
        }
        "activewindowv2" => {
            state.active.client.address = args.to_string();
            EventOutcome::Updated
        }
        "closewindow" => {
            state.active.client = ActiveClient::default();
            EventOutcome::ClosedWindow
        }
        "urgent" => EventOutcome::Emit(URGENT_WINDOW, vec![Value::from(args)]),
        "activelayout" => {
            let (keyboard, layout) = args.split_once(',').unwrap_or((args, ""));
            EventOutcome::Emit(KEYBOARD_LAYOUT, vec![Value::from(keyboard), Value::from(layout)])
        }
        "changefloating" => {
            let (address, floating) = args.split_once(',').unwrap_or((args, ""));
            let address = bare_address(address).to_string();
            if let Some(client) = state
                .clients
                .iter_mut()
                .find(|c| bare_address(&c.address) == address)
            {
                client.floating = floating == "1";
            }
            EventOutcome::Updated
        }
        _ => EventOutcome::Resync,
    }
}

// =============================================================================
// hyprctl
// =============================================================================

/// Access to the compositor's control socket.
pub trait Hyprctl {
    /// Run `hyprctl <args>` and return its output.
    fn query(&self, args: &str) -> Result<String, ServiceError>;

    /// Run `hyprctl <args>` without waiting for it.
    fn dispatch(&self, args: &str);
}

/// Runs the `hyprctl` binary.
#[derive(Clone, Debug, Default)]
pub struct ProcessHyprctl;

impl Hyprctl for ProcessHyprctl {
    fn query(&self, args: &str) -> Result<String, ServiceError> {
        let command = format!("hyprctl {args}");
        let output = Process::new("hyprctl")
            .args(args.split_whitespace())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ServiceError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ServiceError::Exit {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn dispatch(&self, args: &str) {
        tracing::debug!(args, "hyprctl dispatch");
        let mut process = Process::new("hyprctl");
        process
            .args(args.split_whitespace())
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        spawn_reaped(&mut process, &format!("hyprctl {args}"));
    }
}

/// Canned query answers and a log of dispatched commands.
#[derive(Clone, Debug, Default)]
pub struct MemoryHyprctl {
    responses: Rc<RefCell<HashMap<String, String>>>,
    dispatched: Rc<RefCell<Vec<String>>>,
}

impl MemoryHyprctl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, args: &str, output: &str) {
        self.responses
            .borrow_mut()
            .insert(args.to_string(), output.to_string());
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.borrow().clone()
    }

    pub fn take_dispatched(&self) -> Vec<String> {
        std::mem::take(&mut *self.dispatched.borrow_mut())
    }
}

impl Hyprctl for MemoryHyprctl {
    fn query(&self, args: &str) -> Result<String, ServiceError> {
        self.responses
            .borrow()
            .get(args)
            .cloned()
            .ok_or_else(|| ServiceError::Exit {
                command: format!("hyprctl {args}"),
                status: "exit status: 1".to_string(),
                stderr: "no canned response".to_string(),
            })
    }

    fn dispatch(&self, args: &str) {
        self.dispatched.borrow_mut().push(args.to_string());
    }
}

fn query_json<T: DeserializeOwned>(ctl: &dyn Hyprctl, args: &str) -> Result<T, ServiceError> {
    let output = ctl.query(args)?;
    serde_json::from_str(&output).map_err(|source| ServiceError::Parse {
        command: format!("hyprctl {args}"),
        source,
    })
}

// =============================================================================
// Service
// =============================================================================

/// Compositor state plus its command channel.
#[derive(Clone)]
pub struct Hyprland {
    service: Service<HyprlandState>,
    ctl: Rc<dyn Hyprctl>,
}

impl std::fmt::Debug for Hyprland {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hyprland").field("service", &self.service).finish()
    }
}

impl Hyprland {
    /// Service with an empty snapshot. Call [`Hyprland::sync`] to fill it.
    pub fn new(ctl: Rc<dyn Hyprctl>) -> Self {
        Self {
            service: Service::new("hyprland", HyprlandState::default()),
            ctl,
        }
    }

    /// Service backed by the `hyprctl` binary, synced once.
    pub fn from_process() -> Self {
        let hyprland = Self::new(Rc::new(ProcessHyprctl));
        if let Err(err) = hyprland.sync() {
            hyprland.report(&err);
        }
        hyprland
    }

    pub fn service(&self) -> &Service<HyprlandState> {
        &self.service
    }

    pub fn snapshot(&self) -> Rc<HyprlandState> {
        self.service.snapshot()
    }

    /// Run `callback` now and after every change until `node` is destroyed.
    pub fn connect(&self, node: NodeId, callback: impl Fn(NodeId, &HyprlandState) + 'static) {
        self.service.connect(node, callback);
    }

    /// Replace the whole snapshot.
    pub fn set_state(&self, state: HyprlandState) {
        self.service.set(state);
    }

    /// Fire-and-forget `hyprctl <command>`, e.g. `dispatch workspace 3`.
    pub fn hyprctl(&self, command: &str) {
        self.ctl.dispatch(command);
    }

    /// Reload monitors, workspaces and clients, then notify `changed`.
    pub fn sync(&self) -> Result<(), ServiceError> {
        let result = self.fetch();
        self.service.emit(super::CHANGED, &[]);
        result
    }

    fn fetch(&self) -> Result<(), ServiceError> {
        let monitors: Vec<Monitor> = query_json(self.ctl.as_ref(), "-j monitors")?;
        self.service.update_quietly(|state| state.set_monitors(monitors));

        let workspaces: Vec<Workspace> = query_json(self.ctl.as_ref(), "-j workspaces")?;
        self.service.update_quietly(|state| state.set_workspaces(workspaces));

        let clients: Vec<Client> = query_json(self.ctl.as_ref(), "-j clients")?;
        self.service.update_quietly(|state| state.set_clients(clients));
        Ok(())
    }

    /// Handle one line from the event socket.
    pub fn handle_event(&self, line: &str) {
        let line = line.trim_end();
        let Some((name, args)) = line.split_once(">>") else {
            if !line.is_empty() {
                tracing::trace!(line, "ignoring malformed hyprland event");
            }
            return;
        };

        let mut outcome = EventOutcome::Updated;
        self.service
            .update_quietly(|state| outcome = apply_event(state, name, args));
        tracing::trace!(event = name, ?outcome, "hyprland event");

        match outcome {
            EventOutcome::Updated => {}
            EventOutcome::Resync | EventOutcome::ClosedWindow => {
                if let Err(err) = self.fetch() {
                    self.report(&err);
                }
            }
            EventOutcome::Emit(event, args) => {
                self.service.emit(event, &args);
            }
        }
        self.service.emit(super::CHANGED, &[]);
    }

    /// Handle every line `reader` yields. Returns the number of lines read.
    pub fn handle_events(&self, reader: impl BufRead) -> Result<usize, ServiceError> {
        let mut count = 0;
        for line in reader.lines() {
            let line = line.map_err(|source| ServiceError::Io {
                path: "hyprland event socket".to_string(),
                source,
            })?;
            self.handle_event(&line);
            count += 1;
        }
        Ok(count)
    }

    fn report(&self, err: &ServiceError) {
        diagnostics::report(Diagnostic::Service {
            service: self.service.name().to_string(),
            message: err.to_string(),
        });
    }
}

impl Connectable for Hyprland {
    fn connect_widget(&self, node: NodeId, callback: SignalCallback, event: Option<&str>) -> Cleanup {
        self.service.connect_widget(node, callback, event)
    }
}

/// Path of the event socket for the running instance, if any.
pub fn event_socket_path() -> Option<PathBuf> {
    let signature = std::env::var("HYPRLAND_INSTANCE_SIGNATURE").ok()?;
    Some(PathBuf::from(format!("/tmp/hypr/{signature}/.socket2.sock")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{reset_diagnostics, take_reported};
    use crate::engine::reset_registry;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    const MONITORS: &str = r#"[
        {"id": 0, "name": "DP-1", "focused": true, "activeWorkspace": {"id": 2, "name": "2"}},
        {"id": 1, "name": "HDMI-A-1", "focused": false, "activeWorkspace": {"id": 5, "name": "5"}}
    ]"#;
    const WORKSPACES: &str = r#"[
        {"id": 2, "name": "2", "windows": 1, "monitor": "DP-1", "hasfullscreen": false},
        {"id": 5, "name": "5", "windows": 0, "monitor": "HDMI-A-1"}
    ]"#;
    const CLIENTS: &str = r#"[
        {"address": "0x55d1", "pid": 42, "workspace": {"id": 2, "name": "2"}, "monitor": 0,
         "class": "firefox", "title": "Mozilla Firefox", "floating": false, "pinned": false}
    ]"#;

    fn setup() -> (Hyprland, MemoryHyprctl) {
        reset_registry();
        reset_diagnostics();
        let ctl = MemoryHyprctl::new();
        ctl.respond("-j monitors", MONITORS);
        ctl.respond("-j workspaces", WORKSPACES);
        ctl.respond("-j clients", CLIENTS);
        (Hyprland::new(Rc::new(ctl.clone())), ctl)
    }

    #[test]
    fn test_sync_fills_snapshot() {
        let (hyprland, _) = setup();

        hyprland.sync().unwrap();
        let state = hyprland.snapshot();

        assert_eq!(state.active.monitor, "DP-1");
        assert_eq!(state.active.workspace.id, 2);
        assert_eq!(state.workspace(2).map(|w| w.windows), Some(1));
        assert_eq!(state.monitor("HDMI-A-1").map(|m| m.id), Some(1));
        assert_eq!(state.client("55d1").map(|c| c.class.as_str()), Some("firefox"));
    }

    #[test]
    fn test_sync_parse_error() {
        let (hyprland, ctl) = setup();
        ctl.respond("-j clients", "not json");

        let err = hyprland.sync().unwrap_err();
        assert!(matches!(err, ServiceError::Parse { .. }));
    }

    #[test]
    fn test_active_window_events() {
        let (hyprland, _) = setup();
        hyprland.sync().unwrap();

        hyprland.handle_event("activewindow>>kitty,~/src, main");
        hyprland.handle_event("activewindowv2>>55d1");
        let state = hyprland.snapshot();

        assert_eq!(state.active.client.class, "kitty");
        assert_eq!(state.active.client.title, "~/src, main");
        assert!(state.is_focused(&state.clients[0]));
    }

    #[test]
    fn test_closewindow_clears_and_resyncs() {
        let (hyprland, ctl) = setup();
        hyprland.handle_event("activewindow>>kitty,shell");
        assert!(hyprland.snapshot().clients.is_empty());

        ctl.respond("-j clients", "[]");
        hyprland.handle_event("closewindow>>55d1");
        let state = hyprland.snapshot();

        assert_eq!(state.active.client, ActiveClient::default());
        assert_eq!(state.active.monitor, "DP-1");
    }

    #[test]
    fn test_every_event_notifies_changed() {
        let (hyprland, _) = setup();

        let changes = Rc::new(Cell::new(0));
        let c = changes.clone();
        hyprland.service().subscribe(crate::service::CHANGED, move |_, _| c.set(c.get() + 1));

        hyprland.handle_event("activewindowv2>>1");
        hyprland.handle_event("workspace>>3");
        hyprland.handle_event("garbage");
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn test_urgent_and_layout_emit() {
        let (hyprland, _) = setup();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        hyprland
            .service()
            .subscribe(URGENT_WINDOW, move |_, args| s.borrow_mut().push(args.to_vec()));
        let s = seen.clone();
        hyprland
            .service()
            .subscribe(KEYBOARD_LAYOUT, move |_, args| s.borrow_mut().push(args.to_vec()));

        hyprland.handle_event("urgent>>55d1");
        hyprland.handle_event("activelayout>>at-translated-set-2-keyboard,English (US)");

        assert_eq!(
            *seen.borrow(),
            vec![
                vec![Value::from("55d1")],
                vec![Value::from("at-translated-set-2-keyboard"), Value::from("English (US)")],
            ]
        );
    }

    #[test]
    fn test_changefloating() {
        let (hyprland, _) = setup();
        hyprland.sync().unwrap();

        hyprland.handle_event("changefloating>>55d1,1");
        assert!(hyprland.snapshot().clients[0].floating);
    }

    #[test]
    fn test_failed_resync_is_reported() {
        reset_registry();
        reset_diagnostics();
        let hyprland = Hyprland::new(Rc::new(MemoryHyprctl::new()));

        hyprland.handle_event("openwindow>>1,2,kitty,shell");
        let reported = take_reported();
        assert_eq!(reported.len(), 1);
        assert!(matches!(&reported[0], Diagnostic::Service { service, .. } if service == "hyprland"));
    }

    #[test]
    fn test_handle_events_from_reader() {
        let (hyprland, _) = setup();

        let input = "activewindow>>foot,fish\nactivewindowv2>>abc\n";
        assert_eq!(hyprland.handle_events(input.as_bytes()).unwrap(), 2);
        assert_eq!(hyprland.snapshot().active.client.address, "abc");
    }

    #[test]
    fn test_hyprctl_dispatch() {
        let (hyprland, ctl) = setup();

        hyprland.hyprctl("dispatch workspace 3");
        assert_eq!(ctl.dispatched(), vec!["dispatch workspace 3"]);
    }
}
