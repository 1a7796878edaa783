//! Applications service - installed desktop applications.
//!
//! Entries come from `.desktop` files under the XDG application
//! directories. Each entry carries a launch frequency; [`Applications::query`]
//! returns matches most-launched first. Frequencies can be persisted as a
//! JSON map from desktop id to count.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{Connectable, Service, ServiceError};
use crate::engine::{Cleanup, NodeId};
use crate::spec::SignalCallback;

const FREQUENTS_FILE: &str = "apps_frequency.json";

// =============================================================================
// Application
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub name: String,
    /// Desktop file id, e.g. `org.mozilla.firefox.desktop`.
    pub desktop: String,
    pub description: String,
    pub wm_class: String,
    pub executable: String,
    pub icon_name: String,
    pub frequency: u32,
}

fn field_matches(field: &str, term: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    term.is_empty() || field.to_lowercase().contains(&term.to_lowercase())
}

impl Application {
    /// Case-insensitive substring match over name, desktop id, executable
    /// and description. An empty term matches any entry with a non-empty field.
    pub fn matches(&self, term: &str) -> bool {
        [&self.name, &self.desktop, &self.executable, &self.description]
            .into_iter()
            .any(|field| field_matches(field, term))
    }

    /// Parse the `[Desktop Entry]` group of a desktop file.
    ///
    /// Returns `None` for entries that should not be listed (hidden,
    /// `NoDisplay`, non-application types, no name).
    pub fn from_desktop_entry(desktop: &str, contents: &str) -> Option<Self> {
        let mut app = Application {
            desktop: desktop.to_string(),
            ..Default::default()
        };
        let mut in_entry = false;

        for line in contents.lines().map(str::trim) {
            if line.starts_with('[') {
                in_entry = line == "[Desktop Entry]";
                continue;
            }
            if !in_entry || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Name" => app.name = value.to_string(),
                "Comment" => app.description = value.to_string(),
                "Exec" => app.executable = value.to_string(),
                "Icon" => app.icon_name = value.to_string(),
                "StartupWMClass" => app.wm_class = value.to_string(),
                "NoDisplay" | "Hidden" if value == "true" => return None,
                "Type" if value != "Application" => return None,
                _ => {}
            }
        }

        (!app.name.is_empty()).then_some(app)
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationsState {
    pub list: Vec<Application>,
}

impl ApplicationsState {
    /// Matching entries, most frequently launched first. Ties keep list order.
    pub fn query(&self, term: &str) -> Vec<Application> {
        let mut matches: Vec<Application> = self.list.iter().filter(|app| app.matches(term)).cloned().collect();
        matches.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        matches
    }
}

#[derive(Clone, Debug)]
pub struct Applications {
    service: Service<ApplicationsState>,
}

impl Applications {
    pub fn new(list: Vec<Application>) -> Self {
        Self {
            service: Service::new("applications", ApplicationsState { list }),
        }
    }

    /// Load every readable directory, logging the ones that fail.
    pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut list: Vec<Application> = Vec::new();
        for dir in dirs {
            let dir = dir.as_ref();
            match load_dir(dir) {
                Ok(apps) => {
                    tracing::debug!(dir = %dir.display(), count = apps.len(), "loaded applications");
                    for app in apps {
                        if !list.iter().any(|known| known.desktop == app.desktop) {
                            list.push(app);
                        }
                    }
                }
                Err(err) => tracing::warn!(dir = %dir.display(), error = %err, "cannot load applications"),
            }
        }
        Self::new(list)
    }

    /// Scan [`default_dirs`] and restore frequencies from
    /// [`default_frequents_path`] when that file exists.
    pub fn from_system() -> Self {
        let apps = Self::scan(&default_dirs());
        if let Some(path) = default_frequents_path().filter(|path| path.exists()) {
            if let Err(err) = apps.load_frequents(&path) {
                tracing::warn!(error = %err, "cannot restore application frequencies");
            }
        }
        apps
    }

    /// Persist frequencies to [`default_frequents_path`].
    pub fn save_default_frequents(&self) -> Result<(), ServiceError> {
        match default_frequents_path() {
            Some(path) => self.save_frequents(&path),
            None => {
                tracing::warn!("no cache directory, application frequencies not saved");
                Ok(())
            }
        }
    }

    pub fn service(&self) -> &Service<ApplicationsState> {
        &self.service
    }

    pub fn snapshot(&self) -> Rc<ApplicationsState> {
        self.service.snapshot()
    }

    pub fn query(&self, term: &str) -> Vec<Application> {
        self.service.snapshot().query(term)
    }

    pub fn connect(&self, node: NodeId, callback: impl Fn(NodeId, &ApplicationsState) + 'static) {
        self.service.connect(node, callback);
    }

    /// Replace the list, keeping known launch frequencies.
    pub fn reload(&self, list: Vec<Application>) {
        let frequents = self.frequents();
        self.service.set(ApplicationsState {
            list: list
                .into_iter()
                .map(|mut app| {
                    app.frequency = frequents.get(&app.desktop).copied().unwrap_or(app.frequency);
                    app
                })
                .collect(),
        });
    }

    /// Count one launch of `desktop`.
    pub fn launched(&self, desktop: &str) {
        self.service.update(|state| {
            if let Some(app) = state.list.iter_mut().find(|app| app.desktop == desktop) {
                app.frequency += 1;
            }
        });
    }

    /// Launch counts by desktop id, for entries launched at least once.
    pub fn frequents(&self) -> HashMap<String, u32> {
        self.service
            .snapshot()
            .list
            .iter()
            .filter(|app| app.frequency > 0)
            .map(|app| (app.desktop.clone(), app.frequency))
            .collect()
    }

    pub fn load_frequents(&self, path: &Path) -> Result<(), ServiceError> {
        let text = fs::read_to_string(path).map_err(|source| ServiceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let frequents: HashMap<String, u32> = serde_json::from_str(&text).map_err(|source| ServiceError::Parse {
            command: path.display().to_string(),
            source,
        })?;

        self.service.update(|state| {
            for app in &mut state.list {
                if let Some(count) = frequents.get(&app.desktop) {
                    app.frequency = *count;
                }
            }
        });
        Ok(())
    }

    pub fn save_frequents(&self, path: &Path) -> Result<(), ServiceError> {
        let io_error = |source| ServiceError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(&self.frequents()).map_err(|source| ServiceError::Parse {
            command: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(io_error)
    }
}

impl Connectable for Applications {
    fn connect_widget(&self, node: NodeId, callback: SignalCallback, event: Option<&str>) -> Cleanup {
        self.service.connect_widget(node, callback, event)
    }
}

/// Parse every `.desktop` file below `dir`.
///
/// Ids follow the XDG rule: the path relative to `dir` with `/` replaced by `-`.
/// Files that cannot be read are logged and skipped; only an unreadable `dir`
/// itself is an error. Invalid UTF-8 is replaced, not rejected.
pub fn load_dir(dir: &Path) -> Result<Vec<Application>, ServiceError> {
    let mut apps = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(ServiceError::Io {
                    path: dir.display().to_string(),
                    source: err.into(),
                });
            }
            Err(err) => {
                tracing::warn!(path = ?err.path(), error = %err, "skipping application entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "desktop") {
            continue;
        }

        let desktop = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('/', "-");
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read desktop file");
                continue;
            }
        };
        if let Some(app) = Application::from_desktop_entry(&desktop, &String::from_utf8_lossy(&bytes)) {
            apps.push(app);
        }
    }
    Ok(apps)
}

/// XDG application directories, user data dir first.
///
/// `$XDG_DATA_DIRS` defaults to `/usr/local/share:/usr/share`.
pub fn default_dirs() -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = dirs::data_dir().map(|data| data.join("applications")).into_iter().collect();
    let system = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    found.extend(
        system
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(|dir| Path::new(dir).join("applications")),
    );
    found
}

/// Where launch frequencies are kept: `<cache dir>/spark-shell/apps/apps_frequency.json`.
pub fn default_frequents_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|cache| cache.join("spark-shell").join("apps").join(FREQUENTS_FILE))
}
