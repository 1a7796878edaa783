//! Icon lookup.
//!
//! Renderers only need to know whether a name resolves to a real icon.
//! [`IconIndex`] answers that from icon directories on disk (an XDG icon
//! theme tree or a flat pixmaps folder); [`IconSet`] is an in-memory set for
//! embedders that already know their icons.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

const ICON_EXTENSIONS: &[&str] = &["png", "svg", "xpm"];

/// Answers whether an icon name exists.
pub trait IconTheme {
    fn has_icon(&self, name: &str) -> bool;
}

// =============================================================================
// In-memory set
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct IconSet {
    names: HashSet<String>,
}

impl IconSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}

impl IconTheme for IconSet {
    fn has_icon(&self, name: &str) -> bool {
        !name.is_empty() && self.names.contains(name)
    }
}

// =============================================================================
// Directory index
// =============================================================================

/// Icon names found under a set of directories, keyed by file stem.
#[derive(Clone, Debug, Default)]
pub struct IconIndex {
    icons: HashMap<String, PathBuf>,
}

impl IconIndex {
    /// Index every directory, logging the ones that cannot be read.
    pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut index = Self::default();
        for dir in dirs {
            let dir = dir.as_ref();
            match index.add_dir(dir) {
                Ok(count) => tracing::debug!(dir = %dir.display(), count, "indexed icons"),
                Err(err) => tracing::warn!(dir = %dir.display(), error = %err, "cannot index icon directory"),
            }
        }
        index
    }

    /// Add the icons below `dir`. Entries are visited in file-name order and
    /// the first path seen for a name wins. Unreadable entries and broken
    /// links are skipped; only an unreadable `dir` itself is an error.
    pub fn add_dir(&mut self, dir: &Path) -> Result<usize, walkdir::Error> {
        let mut added = 0;
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err),
                Err(err) => {
                    tracing::warn!(path = ?err.path(), error = %err, "skipping icon entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let is_icon = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_icon && !self.icons.contains_key(stem) {
                self.icons.insert(stem.to_string(), path.to_path_buf());
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.icons.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl IconTheme for IconIndex {
    fn has_icon(&self, name: &str) -> bool {
        self.icons.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_icon_set() {
        let set = IconSet::new(["firefox", "kitty"]);
        assert!(set.has_icon("firefox"));
        assert!(!set.has_icon("Firefox"));
        assert!(!set.has_icon(""));
    }

    #[test]
    fn test_index_scans_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let apps = dir.path().join("hicolor/48x48/apps");
        fs::create_dir_all(&apps).unwrap();
        fs::write(apps.join("firefox.png"), b"").unwrap();
        fs::write(apps.join("audio-volume-high-symbolic.svg"), b"").unwrap();
        fs::write(apps.join("README.txt"), b"").unwrap();

        let index = IconIndex::scan(&[dir.path()]);

        assert_eq!(index.len(), 2);
        assert!(index.has_icon("firefox"));
        assert!(index.has_icon("audio-volume-high-symbolic"));
        assert!(!index.has_icon("README"));
        assert_eq!(index.path("firefox"), Some(apps.join("firefox.png").as_path()));
    }

    #[test]
    fn test_missing_dir_is_skipped() {
        let index = IconIndex::scan(&[Path::new("/nonexistent/icons")]);
        assert!(index.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_does_not_stop_scan() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("icon{i}.svg")), b"").unwrap();
        }
        std::os::unix::fs::symlink(dir.path().join("gone.svg"), dir.path().join("broken.svg")).unwrap();

        let mut index = IconIndex::default();
        let added = index.add_dir(dir.path()).unwrap();

        assert_eq!(added, 50);
        assert_eq!(index.len(), 50);
        assert!(!index.has_icon("broken"));
    }

    #[test]
    fn test_first_theme_in_name_order_wins() {
        let dir = tempfile::tempdir().unwrap();
        let later = dir.path().join("b-theme");
        let earlier = dir.path().join("a-theme");
        fs::create_dir_all(&later).unwrap();
        fs::create_dir_all(&earlier).unwrap();
        fs::write(later.join("kitty.svg"), b"").unwrap();
        fs::write(earlier.join("kitty.png"), b"").unwrap();

        let index = IconIndex::scan(&[dir.path()]);

        assert_eq!(index.path("kitty"), Some(earlier.join("kitty.png").as_path()));
    }
}
