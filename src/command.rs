//! Commands attached to widget events.
//!
//! An author gives either a shell template (`"pactl set-sink-volume @DEFAULT_SINK@ {}%"`)
//! or a callback. Templates go through an [`Executor`]; dispatch is
//! fire-and-forget, nothing waits for the process.

use std::cell::RefCell;
use std::fmt;
use std::process::{Command as Process, ExitStatus, Stdio};
use std::rc::Rc;
use std::thread::{self, JoinHandle};

use serde_json::Value;

use crate::engine::NodeId;

/// Placeholder replaced by the live value in templates.
pub const PLACEHOLDER: &str = "{}";

/// Callback form of a command: receives the owning node and event arguments.
pub type CommandCallback = Rc<dyn Fn(NodeId, &[Value])>;

// =============================================================================
// Command
// =============================================================================

#[derive(Clone)]
pub enum Command {
    /// Shell command line; `{}` is substituted where a value applies.
    Template(String),
    Callback(CommandCallback),
}

impl Command {
    pub fn callback(f: impl Fn(NodeId, &[Value]) + 'static) -> Self {
        Command::Callback(Rc::new(f))
    }

    /// An empty template does nothing when run.
    pub fn is_noop(&self) -> bool {
        matches!(self, Command::Template(t) if t.trim().is_empty())
    }

    /// Run with the event arguments. Templates run verbatim.
    pub fn run(&self, executor: &dyn Executor, node: NodeId, args: &[Value]) {
        match self {
            Command::Template(template) => {
                if !template.trim().is_empty() {
                    executor.execute(template);
                }
            }
            Command::Callback(callback) => callback(node, args),
        }
    }

    /// Run with a live value: templates get every `{}` replaced by `value`,
    /// callbacks receive the value appended to the arguments.
    pub fn run_with_value(&self, executor: &dyn Executor, node: NodeId, args: &[Value], value: &Value) {
        match self {
            Command::Template(template) => {
                if !template.trim().is_empty() {
                    executor.execute(&substitute(template, &display_value(value)));
                }
            }
            Command::Callback(callback) => {
                let mut with_value = args.to_vec();
                with_value.push(value.clone());
                callback(node, &with_value);
            }
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Command::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for Command {
    fn from(template: &str) -> Self {
        Command::Template(template.to_string())
    }
}

impl From<String> for Command {
    fn from(template: String) -> Self {
        Command::Template(template)
    }
}

/// Replace every placeholder in `template` with `value`.
pub fn substitute(template: &str, value: &str) -> String {
    template.replace(PLACEHOLDER, value)
}

/// Render a value for a command line: strings without quotes, whole numbers
/// without a fraction, the rest as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

// =============================================================================
// Executors
// =============================================================================

/// Runs command lines on behalf of widgets.
pub trait Executor {
    fn execute(&self, command_line: &str);
}

/// Spawn `process` and reap it from a detached thread so no zombie is left.
///
/// A non-zero exit is logged. The handle yields the exit status and may be
/// dropped; the thread finishes on its own.
pub fn spawn_reaped(process: &mut Process, label: &str) -> Option<JoinHandle<Option<ExitStatus>>> {
    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(command = label, error = %err, "failed to spawn command");
            return None;
        }
    };
    let label = label.to_string();
    let reaper = thread::Builder::new().name("reaper".into()).spawn(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                tracing::warn!(command = %label, %status, "command exited with failure");
            }
            Some(status)
        }
        Err(err) => {
            tracing::warn!(command = %label, error = %err, "cannot wait for command");
            None
        }
    });
    match reaper {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "cannot start reaper thread");
            None
        }
    }
}

/// Spawns `sh -c <command>` and does not wait for it.
#[derive(Clone, Debug, Default)]
pub struct ShellExecutor;

impl Executor for ShellExecutor {
    fn execute(&self, command_line: &str) {
        tracing::debug!(command = command_line, "spawning command");
        let mut process = Process::new("sh");
        process
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        spawn_reaped(&mut process, command_line);
    }
}

/// Records command lines instead of running them.
#[derive(Clone, Debug, Default)]
pub struct CapturingExecutor {
    commands: Rc<RefCell<Vec<String>>>,
}

impl CapturingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}

impl Executor for CapturingExecutor {
    fn execute(&self, command_line: &str) {
        self.commands.borrow_mut().push(command_line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{allocate, reset_registry};
    use crate::types::NodeKind;
    use std::cell::Cell;

    #[test]
    fn test_template_substitution() {
        reset_registry();
        let node = allocate(NodeKind::Slider);
        let executor = CapturingExecutor::new();

        let command = Command::from("pactl set-sink-volume @DEFAULT_SINK@ {}%");
        command.run_with_value(&executor, node, &[], &Value::from(40));

        assert_eq!(executor.commands(), vec!["pactl set-sink-volume @DEFAULT_SINK@ 40%"]);
    }

    #[test]
    fn test_string_values_are_unquoted() {
        assert_eq!(display_value(&Value::from("hi")), "hi");
        assert_eq!(display_value(&Value::from(true)), "true");
        assert_eq!(display_value(&Value::from(55.0)), "55");
        assert_eq!(display_value(&Value::from(0.25)), "0.25");
    }

    #[test]
    fn test_empty_template_is_noop() {
        reset_registry();
        let node = allocate(NodeKind::Button);
        let executor = CapturingExecutor::new();

        let command = Command::from("  ");
        assert!(command.is_noop());
        command.run(&executor, node, &[]);
        assert!(executor.commands().is_empty());
    }

    #[test]
    fn test_callback_receives_value() {
        reset_registry();
        let node = allocate(NodeKind::Switch);
        let executor = CapturingExecutor::new();

        let seen = Rc::new(Cell::new(false));
        let s = seen.clone();
        let command = Command::callback(move |_, args| {
            s.set(args.last() == Some(&Value::from(true)));
        });
        command.run_with_value(&executor, node, &[], &Value::from(true));

        assert!(seen.get());
        assert!(executor.commands().is_empty());
    }

    #[test]
    fn test_spawned_process_is_reaped() {
        let mut process = Process::new("sh");
        process.arg("-c").arg("exit 3");

        let reaper = spawn_reaped(&mut process, "exit 3").unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_missing_binary_is_not_fatal() {
        let mut process = Process::new("spark-shell-no-such-binary");
        assert!(spawn_reaped(&mut process, "spark-shell-no-such-binary").is_none());
    }
}
