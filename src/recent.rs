//! Most-recently-used file list.

use crate::error::Result;
use crate::settings::SettingsStore;
use std::path::{Path, PathBuf};

/// Settings key the list is stored under.
pub const RECENT_FILES_KEY: &str = "recentFiles";
pub const RECENT_CAPACITY: usize = 5;

/// Ordered most-recent-first, no duplicates, at most [`RECENT_CAPACITY`] entries.
/// Every mutation writes the full list back to the store.
pub struct RecentFiles {
    store: Box<dyn SettingsStore>,
    entries: Vec<PathBuf>,
}

impl RecentFiles {
    /// Read the stored list. Malformed entries are skipped.
    pub fn load(store: Box<dyn SettingsStore>) -> Self {
        let mut entries: Vec<PathBuf> = Vec::new();
        if let Some(toml::Value::Array(items)) = store.get(RECENT_FILES_KEY) {
            for item in items {
                if let toml::Value::String(s) = item {
                    let p = PathBuf::from(s);
                    if !entries.contains(&p) {
                        entries.push(p);
                    }
                }
            }
        }
        entries.truncate(RECENT_CAPACITY);
        Self { store, entries }
    }

    pub fn list(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Move `path` to the front, dropping the oldest entry past capacity.
    pub fn add(&mut self, path: &Path) -> Result<()> {
        self.entries.retain(|p| p != path);
        self.entries.insert(0, path.to_path_buf());
        self.entries.truncate(RECENT_CAPACITY);
        self.persist()
    }

    pub fn remove(&mut self, path: &Path) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|p| p != path);
        if self.entries.len() == before {
            return Ok(());
        }
        self.persist()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    fn persist(&mut self) -> Result<()> {
        let value = toml::Value::Array(
            self.entries
                .iter()
                .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
                .collect(),
        );
        self.store.set(RECENT_FILES_KEY, value)?;
        tracing::debug!(target: "recent", count = self.entries.len(), "recent files saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn stored(store: &MemorySettings) -> Vec<String> {
        match store.get(RECENT_FILES_KEY) {
            Some(toml::Value::Array(items)) => {
                items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
            }
            _ => Vec::new(),
        }
    }

    #[test]
    fn bounded_most_recent_first_without_duplicates() {
        let store = MemorySettings::new();
        let mut recent = RecentFiles::load(Box::new(store.clone()));
        for name in ["a", "b", "c", "d", "e", "f", "g"] {
            recent.add(Path::new(name)).unwrap();
        }
        assert_eq!(recent.list().len(), RECENT_CAPACITY);
        assert_eq!(recent.list()[0], PathBuf::from("g"));

        recent.add(Path::new("e")).unwrap();
        let names: Vec<_> = recent.list().iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["e", "g", "f", "d", "c"]);
        assert_eq!(stored(&store), names);
    }

    #[test]
    fn remove_and_clear_persist() {
        let store = MemorySettings::new();
        let mut recent = RecentFiles::load(Box::new(store.clone()));
        recent.add(Path::new("x")).unwrap();
        recent.add(Path::new("y")).unwrap();
        recent.remove(Path::new("x")).unwrap();
        assert_eq!(stored(&store), ["y"]);

        recent.clear().unwrap();
        assert!(recent.list().is_empty());
        assert!(stored(&store).is_empty());
        assert!(RecentFiles::load(Box::new(store)).list().is_empty());
    }

    #[test]
    fn load_skips_junk_and_duplicates() {
        let mut store = MemorySettings::new();
        store
            .set(
                RECENT_FILES_KEY,
                toml::Value::Array(vec![
                    toml::Value::String("a".into()),
                    toml::Value::Integer(3),
                    toml::Value::String("a".into()),
                    toml::Value::String("b".into()),
                ]),
            )
            .unwrap();
        let recent = RecentFiles::load(Box::new(store));
        assert_eq!(recent.list(), [PathBuf::from("a"), PathBuf::from("b")]);
    }
}
