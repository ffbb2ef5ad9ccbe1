//! Editor: the terminal shell around a [`DocumentState`].
//!
//! The editor owns the text buffer, cursor, prompts and dialogs. Anything that replaces,
//! writes or imports the document is delegated to [`DocumentState`], whose [`Step`]s are
//! applied in [`Editor::apply_step`].

mod builtin_commands;
mod clipboard;
pub mod dialogs;
mod file_ops;
pub mod find;
mod input;
mod movement;
mod render;
mod screens;
pub mod theme;
mod undo;

use crate::buffer::Buffer;
use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::document::{DocumentState, Step};
use crate::types::{EditOperation, LineEnding, Pos, Prompt, PromptKind, StatusMsg, UndoEntry};
use crate::utils::{digits, format_bytes};
use dialogs::Dialog;
use std::cmp::max;
use std::time::{Duration, Instant};
use theme::Theme;
use unicode_width::UnicodeWidthChar;

pub use builtin_commands::register_builtin_commands;

/// Long enough to outlast any background task; cleared when the task reports back.
const BUSY_TTL: Duration = Duration::from_secs(600);

/// The top-level application state.
pub struct Editor {
    /// The text being edited.
    pub buf: Buffer,
    pub cursor: Pos,
    /// Selection anchor; the selection runs from here to `cursor`.
    pub anchor: Option<Pos>,
    pub scroll_y: usize,
    pub scroll_x: usize,
    /// Path, encoding, modified flag, recent files and background work.
    pub docs: DocumentState,
    pub(crate) prompt: Option<Prompt>,
    pub(crate) dialog: Option<Dialog>,
    pub(crate) status: Option<StatusMsg>,
    pub(crate) undo: Vec<UndoEntry>,
    pub(crate) redo: Vec<UndoEntry>,
    /// Opened on first use; `None` until then or if the platform has no clipboard.
    pub(crate) clipboard: Option<arboard::Clipboard>,
    pub(crate) commands: CommandRegistry,
    pub(crate) last_find: Option<String>,
    pub(crate) last_replace: Option<String>,
    /// Text entered in the first half of a replace prompt.
    pub(crate) replace_query: Option<String>,
    pub(crate) needs_redraw: bool,
    pub(crate) theme: Theme,
    pub(crate) tab_width: usize,
    /// Terminal size as of the last resize or render.
    pub(crate) screen: (u16, u16),
    /// Last title sent to the terminal.
    pub(crate) title: String,
    pub word_wrap: bool,
    pub show_help: bool,
    pub show_stats: bool,
    pub should_quit: bool,
}

impl Editor {
    /// Create an editor with an empty, unnamed document. Touches no terminal state.
    pub fn new(docs: DocumentState, config: &Config, theme: Theme) -> Self {
        let mut commands = CommandRegistry::new();
        register_builtin_commands(&mut commands);

        let mut ed = Self {
            buf: Buffer::new(),
            cursor: Pos::default(),
            anchor: None,
            scroll_y: 0,
            scroll_x: 0,
            docs,
            prompt: None,
            dialog: None,
            status: None,
            undo: vec![],
            redo: vec![],
            clipboard: None,
            commands,
            last_find: None,
            last_replace: None,
            replace_query: None,
            needs_redraw: true,
            theme,
            tab_width: config.tab_width(),
            screen: (80, 24),
            title: String::new(),
            word_wrap: config.editor.word_wrap,
            show_help: false,
            show_stats: false,
            should_quit: false,
        };
        ed.set_status("Ctrl+P commands | Ctrl+S save | F1 help | Ctrl+Q quit", Duration::from_secs(4));
        ed
    }

    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Toggle word wrapping.
    pub fn toggle_word_wrap(&mut self) {
        self.word_wrap = !self.word_wrap;
        if self.word_wrap {
            self.scroll_x = 0;
        }
        self.set_status(format!("Word wrap: {}", if self.word_wrap { "on" } else { "off" }), Duration::from_secs(2));
        self.ensure_visible();
        self.mark_redraw();
    }

    /// Switch between LF and CRLF for the next save.
    pub fn toggle_line_ending(&mut self) {
        self.buf.line_ending = match self.buf.line_ending {
            LineEnding::LF => LineEnding::CRLF,
            LineEnding::CRLF | LineEnding::Mixed => LineEnding::LF,
        };
        self.docs.mark_modified();
        self.set_status(format!("Line endings: {}", self.buf.line_ending.name()), Duration::from_secs(2));
    }

    /// Periodic work: expire the status message and apply finished background tasks.
    pub fn tick(&mut self) {
        if let Some(st) = &self.status {
            if Instant::now() >= st.until {
                self.status = None;
                self.mark_redraw();
            }
        }
        for step in self.docs.poll() {
            self.apply_step(step);
        }
    }

    /// Called when the terminal is resized.
    pub fn on_resize(&mut self, width: u16, height: u16) {
        self.screen = (width, height);
        self.ensure_visible();
        self.mark_redraw();
    }

    /// Show a message in the status bar.
    pub fn set_status(&mut self, msg: impl Into<String>, ttl: Duration) {
        self.status = Some(StatusMsg { text: msg.into(), until: Instant::now() + ttl });
        self.mark_redraw();
    }

    /// The current status message, if it has not expired yet.
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub(crate) fn open_prompt(&mut self, kind: PromptKind, initial: impl Into<String>) {
        self.prompt = Some(Prompt::new(kind, initial));
        self.mark_redraw();
    }

    /// Carry out what the document layer asked for.
    pub fn apply_step(&mut self, step: Step) {
        match step {
            Step::Idle => {}
            Step::Busy { message } => self.set_status(message, BUSY_TTL),
            Step::Progress { bytes_read, total } => {
                let pct = if total == 0 { 100 } else { bytes_read.saturating_mul(100) / total };
                self.set_status(format!("Loading... {pct}% of {}", format_bytes(total)), BUSY_TTL);
            }
            Step::Confirm => {
                self.prompt = None;
                self.dialog = Some(Dialog::Unsaved);
            }
            Step::AskPath => {
                self.dialog = None;
                self.open_prompt(PromptKind::SaveAs, "");
            }
            Step::AskEncoding { encoding } => {
                self.set_status(format!("Cannot save as {encoding}"), Duration::from_secs(3));
                self.dialog = Some(Dialog::Encoding { failed: encoding, selected: 0 });
            }
            Step::Reset => {
                self.replace_buffer(Buffer::new());
                self.set_status("New document.", Duration::from_secs(2));
            }
            Step::Loaded { text } => {
                self.replace_buffer(Buffer::from_string(&text));
                let name = self.docs.document().display_name();
                self.set_status(format!("Opened: {name}"), Duration::from_secs(2));
            }
            Step::Saved { path } => self.set_status(format!("Saved: {}", path.display()), Duration::from_secs(2)),
            Step::Imported { text } => {
                let end = self.buf.end_pos();
                let deleted_text = self.buf.get_range(Pos::default(), end);
                let chars = text.chars().count();
                self.apply_edits(vec![
                    EditOperation::Delete { start: Pos::default(), end, deleted_text },
                    EditOperation::Insert { pos: Pos::default(), text },
                ]);
                self.cursor = Pos::default();
                self.ensure_visible();
                self.set_status(format!("Imported {chars} characters."), Duration::from_secs(3));
            }
            Step::Failed { message } => self.set_status(message, Duration::from_secs(5)),
            Step::Quit => self.should_quit = true,
        }
        self.mark_redraw();
    }

    /// Swap in a new buffer and start from the top with no history.
    fn replace_buffer(&mut self, buf: Buffer) {
        self.buf = buf;
        self.cursor = Pos::default();
        self.anchor = None;
        self.scroll_y = 0;
        self.scroll_x = 0;
        self.clear_history();
        self.mark_redraw();
    }

    /// `Scratchpad - <file name>`, or `Scratchpad - Unnamed`.
    pub fn window_title(&self) -> String {
        format!("Scratchpad - {}", visible(&self.docs.document().display_name()))
    }

    /// The status line: position, size, encoding and a `*` while modified.
    pub fn status_line(&self) -> String {
        let doc = self.docs.document();
        let asterisk = if doc.modified { "*" } else { "" };
        format!(
            "Line: {} | Column: {} | Characters: {} | Encoding: {} {}",
            self.cursor.y + 1,
            self.cursor.x + 1,
            self.buf.len_chars(),
            doc.encoding.label(),
            asterisk
        )
    }

    /// Return the normalized selection range.
    pub fn selection_range(&self) -> Option<(Pos, Pos)> {
        let a = self.anchor?;
        if a == self.cursor {
            None
        } else if a <= self.cursor {
            Some((a, self.cursor))
        } else {
            Some((self.cursor, a))
        }
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
        self.mark_redraw();
    }

    pub fn select_all(&mut self) {
        self.anchor = Some(Pos::default());
        self.cursor = self.buf.end_pos();
        self.ensure_visible();
        self.mark_redraw();
    }

    /// The selected text, or an empty string.
    pub fn selected_text(&self) -> String {
        self.selection_range().map(|(a, b)| self.buf.get_range(a, b)).unwrap_or_default()
    }

    /// Rows available for text: the screen minus the status bar and an open prompt.
    pub(crate) fn editor_height(&self) -> usize {
        let prompt_lines = usize::from(self.prompt.is_some());
        usize::from(self.screen.1).saturating_sub(prompt_lines + 1)
    }

    pub(crate) fn gutter_width(&self) -> usize {
        max(2, digits(self.buf.line_count())) + 2
    }

    /// Update scroll so the cursor is visible.
    pub fn ensure_visible(&mut self) {
        let width = usize::from(self.screen.0);
        let editor_h = self.editor_height().max(1);
        let old = (self.scroll_y, self.scroll_x);

        if self.word_wrap {
            self.ensure_visible_wrapped(width, editor_h);
        } else {
            self.ensure_visible_normal(width, editor_h);
        }

        if old != (self.scroll_y, self.scroll_x) {
            self.mark_redraw();
        }
    }

    fn ensure_visible_wrapped(&mut self, width: usize, editor_h: usize) {
        let avail = width.saturating_sub(self.gutter_width()).max(1);
        let mut cursor_screen_row = 0;
        for y in 0..self.cursor.y {
            cursor_screen_row += wrap_segments(&self.buf.line(y), avail, self.tab_width).len();
        }
        let segments = wrap_segments(&self.buf.line(self.cursor.y), avail, self.tab_width);
        cursor_screen_row += segments.iter().rposition(|&s| s <= self.cursor.x).unwrap_or(0);

        if cursor_screen_row < self.scroll_y {
            self.scroll_y = cursor_screen_row;
        } else if cursor_screen_row >= self.scroll_y + editor_h {
            self.scroll_y = cursor_screen_row + 1 - editor_h;
        }
        self.scroll_x = 0;
    }

    fn ensure_visible_normal(&mut self, width: usize, editor_h: usize) {
        if self.cursor.y < self.scroll_y {
            self.scroll_y = self.cursor.y;
        } else if self.cursor.y >= self.scroll_y + editor_h {
            self.scroll_y = self.cursor.y + 1 - editor_h;
        }

        let avail = width.saturating_sub(self.gutter_width()).saturating_sub(1).max(1);
        let line = self.buf.line(self.cursor.y);
        let col_of = |n: usize| -> usize { line.chars().take(n).map(|c| char_width(c, self.tab_width)).sum() };
        let cursor_col = col_of(self.cursor.x);
        let scroll_col = col_of(self.scroll_x);

        if cursor_col < scroll_col {
            self.scroll_x = self.cursor.x;
        } else if cursor_col >= scroll_col + avail {
            let target_col = cursor_col + 1 - avail;
            let mut col = 0;
            let mut new_scroll_x = self.cursor.x;
            for (i, ch) in line.chars().enumerate() {
                if col >= target_col {
                    new_scroll_x = i;
                    break;
                }
                col += char_width(ch, self.tab_width);
            }
            self.scroll_x = new_scroll_x;
        }
    }

    /// Run a command by name. Unknown names get a "did you mean" hint.
    pub fn run_command_by_name(&mut self, name: &str) -> anyhow::Result<()> {
        let name = name.trim();
        let Some(cmd) = self.commands.get(name).cloned() else {
            let mut msg = format!("Unknown command: '{name}'");
            if let Some(suggestion) = self.commands.suggest_command(name) {
                msg.push_str(&format!(". Did you mean '{}'?", suggestion.name));
            }
            self.set_status(msg, Duration::from_secs(3));
            return Ok(());
        };
        tracing::debug!(target: "editor", command = cmd.name.as_str(), "run command");
        (cmd.run)(self)?;
        self.mark_redraw();
        Ok(())
    }
}

/// Columns `ch` takes on screen, matching what [`push_glyph`] draws for it.
pub(crate) fn char_width(ch: char, tab_width: usize) -> usize {
    match ch {
        '\t' => tab_width.max(1),
        '\x7f' => 2,
        c if u32::from(c) < 0x20 => 2,
        c if c.is_control() => 1,
        c => UnicodeWidthChar::width(c).unwrap_or(1),
    }
}

/// Append what the terminal should show for `ch`. Control characters never reach the
/// terminal: tabs become spaces, C0 controls caret notation (`^[`), the rest U+FFFD.
pub(crate) fn push_glyph(out: &mut String, ch: char, tab_width: usize) {
    match ch {
        '\t' => out.extend(std::iter::repeat(' ').take(tab_width.max(1))),
        '\x7f' => out.push_str("^?"),
        c if u32::from(c) < 0x20 => {
            out.push('^');
            out.push(char::from_u32(u32::from(c) + 0x40).unwrap_or('?'));
        }
        c if c.is_control() => out.push('\u{FFFD}'),
        c => out.push(c),
    }
}

/// `s` made safe to print: file names, URLs and messages can carry control characters.
pub(crate) fn visible(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        push_glyph(&mut out, ch, 1);
    }
    out
}

/// Char indices at which each wrapped row of `line` starts. Always at least one row.
pub(crate) fn wrap_segments(line: &str, avail: usize, tab_width: usize) -> Vec<usize> {
    let mut segments = vec![0];
    let mut col = 0;
    for (i, ch) in line.chars().enumerate() {
        let w = char_width(ch, tab_width);
        if col + w > avail && col > 0 {
            segments.push(i);
            col = 0;
        }
        col += w;
    }
    segments
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    pub(crate) fn editor() -> Editor {
        let docs = DocumentState::new(Box::new(MemorySettings::new()), Duration::from_secs(1));
        Editor::new(docs, &Config::default(), Theme::default())
    }

    /// An editor holding `text` as if it had just been loaded.
    pub(crate) fn editor_with(text: &str) -> Editor {
        let mut ed = editor();
        ed.apply_step(Step::Loaded { text: text.to_string() });
        ed
    }

    #[test]
    fn starts_unnamed_and_clean() {
        let ed = editor();
        assert_eq!(ed.window_title(), "Scratchpad - Unnamed");
        assert_eq!(ed.status_line(), "Line: 1 | Column: 1 | Characters: 0 | Encoding: UTF-8 ");
    }

    #[test]
    fn status_line_tracks_cursor_and_modified() {
        let mut ed = editor_with("ab\ncd");
        ed.cursor = Pos { y: 1, x: 1 };
        ed.replace_selection_or_insert("x");
        assert_eq!(ed.status_line(), "Line: 2 | Column: 3 | Characters: 6 | Encoding: UTF-8 *");
    }

    #[test]
    fn import_replaces_everything_and_undoes() {
        let mut ed = editor_with("old text");
        ed.apply_step(Step::Imported { text: "new\r\ncontent".to_string() });
        assert_eq!(ed.buf.to_string(), "new\ncontent");
        assert!(ed.docs.document().modified);
        ed.undo().unwrap();
        assert_eq!(ed.buf.to_string(), "old text");
    }

    #[test]
    fn loaded_text_resets_history() {
        let mut ed = editor_with("one");
        ed.replace_selection_or_insert("x");
        ed.apply_step(Step::Loaded { text: "two".to_string() });
        assert!(ed.undo.is_empty());
        assert_eq!(ed.cursor, Pos::default());
    }

    #[test]
    fn wrap_segments_split_on_width() {
        assert_eq!(wrap_segments("", 4, 4), vec![0]);
        assert_eq!(wrap_segments("abcdefghij", 4, 4), vec![0, 4, 8]);
        assert_eq!(wrap_segments("日本語", 4, 4), vec![0, 2]);
        assert_eq!(wrap_segments("a\tb", 4, 4), vec![0, 1, 2]);
    }

    #[test]
    fn control_characters_get_visible_glyphs() {
        let mut out = String::new();
        for ch in "a\tb\x1b[2J\x7f\u{85}".chars() {
            push_glyph(&mut out, ch, 4);
        }
        assert_eq!(out, "a    b^[[2J^?\u{FFFD}");
        assert_eq!(char_width('\t', 4), 4);
        assert_eq!(char_width('\x1b', 4), 2);
        assert_eq!(char_width('\u{85}', 4), 1);
        assert_eq!(visible("bad\x1b]0;name\x07.txt"), "bad^[]0;name^G.txt");
    }

    #[test]
    fn unknown_commands_suggest() {
        let mut ed = editor();
        ed.run_command_by_name("sve").unwrap();
        assert_eq!(ed.status_text(), Some("Unknown command: 'sve'. Did you mean 'save'?"));
    }
}
