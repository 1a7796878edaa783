//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! base-icon-size = 20
//! log-filter = "spark_shell=debug"
//! icon-dirs = ["/usr/share/icons/hicolor", "~/.local/share/icons"]
//!
//! [[widgets]]
//! type = "hyprland/workspaces"
//! fixed = 5
//! ```
//!
//! Missing keys take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Pixel size of icons that do not set `size`.
    pub base_icon_size: u32,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Directories indexed for icon lookup. `~` expands to the home directory.
    pub icon_dirs: Vec<PathBuf>,
    /// Widget specs as data, resolved with `Resolver::resolve_value`.
    pub widgets: Vec<Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_icon_size: 16,
            log_filter: "info".to_string(),
            icon_dirs: Vec::new(),
            widgets: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = toml::from_str(text)?;
        config.icon_dirs = config.icon_dirs.iter().map(|dir| expand_home(dir)).collect();
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), widgets = config.widgets.len(), "loaded config");
        Ok(config)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
