//! Command registry: named actions reachable by key chord or from the command palette.

use crate::editor::Editor;
use crate::utils::levenshtein_distance;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// A user-invokable action.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub key: Option<String>, // canonical string e.g. "Ctrl+S"
    pub run: fn(&mut Editor) -> Result<()>,
}

/// Registry of known commands + lookup tables for fast resolving.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    by_name: HashMap<String, usize>,
    keymap: HashMap<String, String>, // key -> command name
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a command. Names are case-insensitive.
    pub fn register(&mut self, cmd: Command) {
        let name_key = cmd.name.to_lowercase();
        if let Some(k) = cmd.key.as_ref() {
            self.keymap.insert(k.clone(), cmd.name.clone());
        }
        if let Some(&idx) = self.by_name.get(&name_key) {
            self.commands[idx] = cmd;
        } else {
            self.by_name.insert(name_key, self.commands.len());
            self.commands.push(cmd);
        }
    }

    /// Lookup a command by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Command> {
        let idx = *self.by_name.get(&name.to_lowercase())?;
        self.commands.get(idx)
    }

    /// Resolve a key chord like `"Ctrl+S"` to a command name.
    pub fn resolve_key(&self, key: &str) -> Option<String> {
        self.keymap.get(key).cloned()
    }

    /// Substring search over names and descriptions, for the palette.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Command> {
        let q = query.to_lowercase();
        let mut items: Vec<&Command> = self
            .commands
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&q) || c.description.to_lowercase().contains(&q))
            .collect();
        items.sort_by_key(|c| c.name.to_lowercase());
        items.truncate(limit);
        items
    }

    /// The closest command name, if it is close enough to be a plausible typo.
    pub fn suggest_command(&self, name: &str) -> Option<&Command> {
        let name = name.to_lowercase();
        let (dist, cmd) = self
            .commands
            .iter()
            .map(|c| (levenshtein_distance(&name, &c.name.to_lowercase()), c))
            .min_by_key(|(d, _)| *d)?;
        // Within roughly 40% of the longer word, and never stricter than 2 edits.
        let longest = name.chars().count().max(cmd.name.chars().count());
        let threshold = (longest * 2).div_ceil(5).max(2);
        (dist <= threshold).then_some(cmd)
    }
}

/// Convert a crossterm `KeyEvent` into a canonical string like `"Ctrl+S"`.
///
/// Canonical ordering: Ctrl, Alt, Shift + Key
pub fn canonical_key_string(key: &KeyEvent) -> String {
    let mut parts: Vec<String> = Vec::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl".into());
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt".into());
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift".into());
    }

    let key_name = match key.code {
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::F(n) => format!("F{n}"),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Tab => "Tab".into(),
        other => format!("{other:?}"),
    };
    parts.push(key_name);
    parts.join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Editor) -> Result<()> {
        Ok(())
    }

    fn registry() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        for (name, key) in [("save", Some("Ctrl+S")), ("save_as", Some("Alt+S")), ("replace_all", None)] {
            reg.register(Command {
                name: name.into(),
                description: format!("{name} command"),
                key: key.map(str::to_string),
                run: noop,
            });
        }
        reg
    }

    #[test]
    fn keys_and_names_resolve() {
        let reg = registry();
        assert_eq!(reg.resolve_key("Alt+S").as_deref(), Some("save_as"));
        assert!(reg.get("SAVE").is_some());
        assert_eq!(reg.search("save", 10).len(), 2);
    }

    #[test]
    fn typos_get_suggestions() {
        let reg = registry();
        assert_eq!(reg.suggest_command("sav").map(|c| c.name.as_str()), Some("save"));
        assert_eq!(reg.suggest_command("replace_al").map(|c| c.name.as_str()), Some("replace_all"));
        assert!(reg.suggest_command("xyzzyplugh").is_none());
    }

    #[test]
    fn canonical_strings() {
        let k = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(canonical_key_string(&k), "Ctrl+S");
        let k = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::ALT);
        assert_eq!(canonical_key_string(&k), "Alt+R");
        let k = KeyEvent::new(KeyCode::F(3), KeyModifiers::NONE);
        assert_eq!(canonical_key_string(&k), "F3");
    }
}
