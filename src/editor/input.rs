//! Input handling: keyboard, mouse, prompts and dialogs.

use crate::commands::canonical_key_string;
use crate::types::{Prompt, PromptKind};
use crate::utils::{char_to_byte_index, clamp_usize};
use super::dialogs::DialogAction;
use super::find::EMPTY_QUERY;
use super::Editor;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCROLL_LINES: usize = 3;

/// Entries of the directory named by `partial` whose names start with its last component.
/// Directories come first and end in `/`.
fn path_completions(partial: &str) -> Vec<String> {
    let path = Path::new(partial);
    let (dir, prefix) = if partial.is_empty() {
        (Path::new("."), "")
    } else if partial.ends_with(['/', '\\']) || path.is_dir() {
        (path, "")
    } else {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        (parent, path.file_name().and_then(|s| s.to_str()).unwrap_or(""))
    };
    let bare = dir == Path::new(".") && !partial.starts_with("./");

    let Ok(entries) = fs::read_dir(dir) else { return Vec::new() };
    let mut out: Vec<(bool, String)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(prefix) {
                return None;
            }
            let full = if bare { name } else { dir.join(&name).to_string_lossy().into_owned() };
            let is_dir = entry.path().is_dir();
            Some((is_dir, if is_dir { format!("{full}/") } else { full }))
        })
        .collect();
    out.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase())));
    out.into_iter().map(|(_, s)| s).collect()
}

/// Longest prefix shared by every string, cut on a char boundary.
fn common_prefix(strings: &[String]) -> String {
    let Some(first) = strings.first() else { return String::new() };
    let mut len = first.len();
    for s in &strings[1..] {
        len = first[..len]
            .char_indices()
            .zip(s.chars())
            .find(|((_, a), b)| a != b)
            .map_or(len.min(s.len()), |((i, _), _)| i);
    }
    first[..len].to_string()
}

impl Prompt {
    fn set_input(&mut self, input: String) {
        self.cursor = input.chars().count();
        self.input = input;
    }

    /// Tab / Shift+Tab in a path prompt. Returns a status line listing the candidates.
    fn complete_path(&mut self, backwards: bool) -> Option<String> {
        if self.completion_base != self.input {
            self.completions = path_completions(&self.input);
            self.completion_base = self.input.clone();
            self.completion_index = None;
        }
        match self.completions.len() {
            0 => return Some("No completions".to_string()),
            1 => {
                let only = self.completions[0].clone();
                self.set_input(only);
                self.completion_base = self.input.clone();
                self.completions = path_completions(&self.input);
                return None;
            }
            n => {
                let next = match self.completion_index {
                    None => {
                        let prefix = common_prefix(&self.completions);
                        if prefix.len() > self.input.len() {
                            self.set_input(prefix);
                            self.completion_base = self.input.clone();
                            self.completions = path_completions(&self.input);
                            None
                        } else {
                            Some(0)
                        }
                    }
                    Some(i) if backwards => Some((i + n - 1) % n),
                    Some(i) => Some((i + 1) % n),
                };
                if let Some(i) = next {
                    self.completion_index = Some(i);
                    let pick = self.completions[i].clone();
                    self.set_input(pick);
                    self.completion_base = self.input.clone();
                }
            }
        }
        let names: Vec<&str> = self
            .completions
            .iter()
            .map(|s| s.trim_end_matches('/').rsplit('/').next().unwrap_or(s))
            .take(8)
            .collect();
        let more = self.completions.len().saturating_sub(8);
        Some(if more > 0 { format!("{} (+{more} more)", names.join(" | ")) } else { names.join(" | ") })
    }

    /// Line-editing keys; anything else is ignored.
    fn edit(&mut self, key: KeyEvent) {
        let len = self.input.chars().count();
        match key.code {
            KeyCode::Backspace if self.cursor > 0 => {
                let at = char_to_byte_index(&self.input, self.cursor - 1);
                self.input.remove(at);
                self.cursor -= 1;
            }
            KeyCode::Delete if self.cursor < len => {
                let at = char_to_byte_index(&self.input, self.cursor);
                self.input.remove(at);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.cursor = 0;
            }
            KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                let at = char_to_byte_index(&self.input, self.cursor);
                self.input.insert(at, ch);
                self.cursor += 1;
            }
            _ => {}
        }
    }
}

impl Editor {
    /// Mouse wheel moves the cursor (Shift+wheel scrolls sideways when not wrapping).
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let sideways = mouse.modifiers.contains(KeyModifiers::SHIFT) && !self.word_wrap;
        let mut p = self.cursor;
        match mouse.kind {
            MouseEventKind::ScrollUp if sideways => p.x = p.x.saturating_sub(SCROLL_LINES),
            MouseEventKind::ScrollDown if sideways => p.x += SCROLL_LINES,
            MouseEventKind::ScrollLeft if !self.word_wrap => p.x = p.x.saturating_sub(SCROLL_LINES),
            MouseEventKind::ScrollRight if !self.word_wrap => p.x += SCROLL_LINES,
            MouseEventKind::ScrollUp => p.y = p.y.saturating_sub(SCROLL_LINES),
            MouseEventKind::ScrollDown => p.y += SCROLL_LINES,
            _ => return,
        }
        self.cursor = self.buf.clamp_pos(p);
        self.anchor = None;
        self.ensure_visible();
        self.mark_redraw();
    }

    /// Top-level key handler. Returns `Ok(true)` once the editor should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.show_help || self.show_stats {
            self.show_help = false;
            self.show_stats = false;
            self.mark_redraw();
            return Ok(false);
        }
        if self.dialog.is_some() {
            self.handle_dialog_key(key)?;
            return Ok(self.should_quit);
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key)?;
            return Ok(self.should_quit);
        }

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let plain = !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        if matches!(
            key.code,
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right
                | KeyCode::Home | KeyCode::End | KeyCode::PageUp | KeyCode::PageDown
        ) {
            self.move_cursor(key, shift);
            return Ok(false);
        }

        if let Some(name) = self.commands.resolve_key(&canonical_key_string(&key)) {
            self.run_command_by_name(&name)?;
            return Ok(self.should_quit);
        }

        match key.code {
            KeyCode::Esc => {
                if !self.cancel_import() {
                    self.clear_selection();
                }
            }
            KeyCode::Enter => self.replace_selection_or_insert("\n"),
            KeyCode::Tab => {
                let spaces = " ".repeat(self.tab_width);
                self.replace_selection_or_insert(&spaces);
            }
            KeyCode::Backspace => {
                let prev = self.buf.prev_pos(self.cursor);
                self.delete_selection_or(prev);
            }
            KeyCode::Delete => {
                let next = self.buf.next_pos(self.cursor);
                self.delete_selection_or(next);
            }
            KeyCode::Char(ch) if plain => self.replace_selection_or_insert(ch.encode_utf8(&mut [0; 4])),
            _ => return Ok(false),
        }
        self.ensure_visible();
        Ok(false)
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let recent_len = self.docs.recent().len();
        let Some(dialog) = self.dialog.as_mut() else { return Ok(()) };
        let action = dialog.handle_key(key, recent_len);
        self.mark_redraw();
        match action {
            DialogAction::None => {}
            DialogAction::Close => self.dialog = None,
            DialogAction::Guard(choice) => self.answer_unsaved(choice),
            DialogAction::Encoding(label) => self.save_with_encoding(label),
            DialogAction::CancelEncoding => self.encoding_cancelled(),
            DialogAction::OpenRecent(i) => self.open_recent(i),
            DialogAction::RemoveRecent(i) => self.remove_recent(i),
            DialogAction::ClearRecent => self.clear_recent()?,
        }
        Ok(())
    }

    /// Handle keys while a prompt is active.
    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        self.mark_redraw();
        let Some(prompt) = self.prompt.as_mut() else { return Ok(()) };
        match key.code {
            KeyCode::Esc => {
                let kind = prompt.kind;
                self.prompt = None;
                match kind {
                    PromptKind::SaveAs => self.save_as_cancelled(),
                    PromptKind::ReplaceWith { .. } => self.replace_query = None,
                    _ => {}
                }
            }
            KeyCode::Tab | KeyCode::BackTab if prompt.kind.completes_paths() => {
                if let Some(msg) = prompt.complete_path(key.code == KeyCode::BackTab) {
                    self.set_status(msg, Duration::from_secs(3));
                }
            }
            KeyCode::Enter => {
                let kind = prompt.kind;
                let input = std::mem::take(&mut prompt.input);
                self.prompt = None;
                self.submit_prompt(kind, input)?;
            }
            _ => prompt.edit(key),
        }
        Ok(())
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) -> Result<()> {
        match kind {
            PromptKind::Open => {
                let path = input.trim();
                if !path.is_empty() {
                    self.open_path(PathBuf::from(path));
                }
            }
            PromptKind::SaveAs => {
                let path = input.trim();
                if path.is_empty() {
                    self.save_as_cancelled();
                } else {
                    self.save_to_path(PathBuf::from(path));
                }
            }
            PromptKind::Find => {
                self.find_next(&input);
            }
            PromptKind::Replace { all } => {
                if input.is_empty() {
                    self.set_status(EMPTY_QUERY, Duration::from_secs(3));
                } else {
                    self.replace_query = Some(input);
                    let with = self.last_replace.clone().unwrap_or_default();
                    self.open_prompt(PromptKind::ReplaceWith { all }, with);
                }
            }
            PromptKind::ReplaceWith { all } => {
                let query = self.replace_query.take().unwrap_or_default();
                if all {
                    self.replace_all(&query, &input);
                } else {
                    self.replace_next(&query, &input);
                }
            }
            PromptKind::ImportUrl => self.import_url(&input),
            PromptKind::GotoLine => {
                let n: isize = input.trim().parse().unwrap_or(1);
                let y = clamp_usize(n.saturating_sub(1), 0, self.buf.line_count() - 1);
                self.cursor = self.buf.clamp_pos(crate::types::Pos { y, x: self.cursor.x });
                self.anchor = None;
                self.ensure_visible();
            }
            PromptKind::Command => {
                let cmd = input.trim().trim_start_matches(':');
                let cmd = match cmd {
                    "w" => "save",
                    "q" => "quit",
                    other => other,
                };
                if !cmd.is_empty() {
                    self.run_command_by_name(cmd)?;
                }
            }
        }
        Ok(())
    }
}
