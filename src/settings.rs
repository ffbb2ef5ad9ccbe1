//! Small key/value persistence for state that outlives a session.

use crate::error::{Error, Result};
use crate::saver::write_atomically;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Where persisted values live. Injected so the core never knows about files or dirs.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<toml::Value>;
    fn set(&mut self, key: &str, value: toml::Value) -> Result<()>;
}

/// A TOML table on disk.
///
/// Every write re-reads the file, replaces one key and writes the whole table back, so keys
/// written by another running instance are not clobbered.
pub struct TomlSettings {
    path: PathBuf,
    table: toml::Table,
}

impl TomlSettings {
    /// Open `path`. A missing or unreadable file starts out empty.
    pub fn open(path: PathBuf) -> Self {
        let table = read_table(&path).unwrap_or_else(|e| {
            tracing::warn!(target: "settings", path = %path.display(), error = %e, "ignoring settings file");
            toml::Table::new()
        });
        Self { path, table }
    }
}

fn read_table(path: &Path) -> Result<toml::Table> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .parse::<toml::Table>()
            .map_err(|e| Error::Settings { message: format!("{}: {e}", path.display()) }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(toml::Table::new()),
        Err(e) => Err(Error::from_io(path, e)),
    }
}

impl SettingsStore for TomlSettings {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.table.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: toml::Value) -> Result<()> {
        let mut table = read_table(&self.path).unwrap_or_else(|_| self.table.clone());
        table.insert(key.to_string(), value);
        let text = toml::to_string(&table).map_err(|e| Error::Settings { message: e.to_string() })?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::from_io(dir, e))?;
        }
        write_atomically(&self.path, text.as_bytes())?;
        tracing::debug!(target: "settings", key, path = %self.path.display(), "settings written");
        self.table = table;
        Ok(())
    }
}

/// In-memory store. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemorySettings {
    values: Arc<Mutex<HashMap<String, toml::Value>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<toml::Value> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&mut self, key: &str, value: toml::Value) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_settings_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.toml");
        let mut s = TomlSettings::open(path.clone());
        assert!(s.get("answer").is_none());
        s.set("answer", toml::Value::Integer(42)).unwrap();

        let reopened = TomlSettings::open(path);
        assert_eq!(reopened.get("answer"), Some(toml::Value::Integer(42)));
    }

    #[test]
    fn writes_keep_keys_added_by_someone_else() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut a = TomlSettings::open(path.clone());
        let mut b = TomlSettings::open(path.clone());
        a.set("a", toml::Value::Boolean(true)).unwrap();
        b.set("b", toml::Value::Boolean(false)).unwrap();

        let merged = TomlSettings::open(path);
        assert_eq!(merged.get("a"), Some(toml::Value::Boolean(true)));
        assert_eq!(merged.get("b"), Some(toml::Value::Boolean(false)));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(TomlSettings::open(path).get("anything").is_none());
    }

    #[test]
    fn memory_clones_share_storage() {
        let mut a = MemorySettings::new();
        let b = a.clone();
        a.set("k", toml::Value::String("v".into())).unwrap();
        assert_eq!(b.get("k"), Some(toml::Value::String("v".into())));
    }
}
