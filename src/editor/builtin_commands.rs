//! Built-in command registration.

use crate::commands::{Command, CommandRegistry};
use crate::types::PromptKind;
use super::Editor;
use anyhow::Result;

fn command(name: &str, description: &str, key: Option<&str>, run: fn(&mut Editor) -> Result<()>) -> Command {
    Command {
        name: name.to_string(),
        description: description.to_string(),
        key: key.map(str::to_string),
        run,
    }
}

/// Register all built-in editor commands.
pub fn register_builtin_commands(reg: &mut CommandRegistry) {
    let builtins = [
        // document
        command("new", "New document (Ctrl+N)", Some("Ctrl+N"), Editor::cmd_new),
        command("open", "Open file (Ctrl+O)", Some("Ctrl+O"), Editor::cmd_open),
        command("save", "Save file (Ctrl+S)", Some("Ctrl+S"), Editor::cmd_save),
        command("save_as", "Save file as (Alt+S)", Some("Alt+S"), Editor::cmd_save_as),
        command("recent", "Recent files (Ctrl+E)", Some("Ctrl+E"), Editor::cmd_recent),
        command("clear_recent", "Clear the recent files list", None, Editor::clear_recent),
        command("import", "Import text from an https URL (Alt+I)", Some("Alt+I"), Editor::cmd_import),
        command("quit", "Quit (Ctrl+Q)", Some("Ctrl+Q"), Editor::cmd_quit),
        // search
        command("find", "Find (Ctrl+F)", Some("Ctrl+F"), |ed| {
            ed.open_find_prompt();
            Ok(())
        }),
        command("find_next", "Find next (F3)", Some("F3"), |ed| {
            ed.find_again();
            Ok(())
        }),
        command("replace", "Find and replace (Ctrl+R)", Some("Ctrl+R"), |ed| {
            ed.open_prompt(PromptKind::Replace { all: false }, ed.last_find.clone().unwrap_or_default());
            Ok(())
        }),
        command("replace_all", "Replace all occurrences (Alt+R)", Some("Alt+R"), |ed| {
            ed.open_prompt(PromptKind::Replace { all: true }, ed.last_find.clone().unwrap_or_default());
            Ok(())
        }),
        command("goto_line", "Go to line (Ctrl+G)", Some("Ctrl+G"), |ed| {
            ed.open_prompt(PromptKind::GotoLine, "");
            Ok(())
        }),
        // editing
        command("undo", "Undo (Ctrl+Z)", Some("Ctrl+Z"), Editor::undo),
        command("redo", "Redo (Ctrl+Y)", Some("Ctrl+Y"), Editor::redo),
        command("copy", "Copy selection (Ctrl+C)", Some("Ctrl+C"), Editor::copy),
        command("cut", "Cut selection (Ctrl+X)", Some("Ctrl+X"), Editor::cut),
        command("paste", "Paste clipboard (Ctrl+V)", Some("Ctrl+V"), Editor::paste),
        command("select_all", "Select entire buffer (Ctrl+A)", Some("Ctrl+A"), |ed| {
            ed.select_all();
            Ok(())
        }),
        command("eol", "Toggle line endings (LF/CRLF)", None, |ed| {
            ed.toggle_line_ending();
            Ok(())
        }),
        // view
        command("wrap", "Toggle word wrapping (Alt+W)", Some("Alt+W"), |ed| {
            ed.toggle_word_wrap();
            Ok(())
        }),
        command("command", "Command palette (Ctrl+P)", Some("Ctrl+P"), |ed| {
            ed.open_prompt(PromptKind::Command, "");
            Ok(())
        }),
        command("help", "Show help screen (F1)", Some("F1"), |ed| {
            ed.show_help = true;
            ed.mark_redraw();
            Ok(())
        }),
        command("stats", "Show document statistics (F2)", Some("F2"), |ed| {
            ed.show_stats = true;
            ed.mark_redraw();
            Ok(())
        }),
    ];
    for cmd in builtins {
        reg.register(cmd);
    }
}

impl Editor {
    pub(crate) fn open_find_prompt(&mut self) {
        self.open_prompt(PromptKind::Find, self.last_find.clone().unwrap_or_default());
    }
}
