//! Document commands: new, open, save, import and the recent-files list. Each forwards to
//! [`DocumentState`](crate::document::DocumentState) and applies the step it returns.

use crate::document::Step;
use crate::guard::GuardChoice;
use crate::types::PromptKind;
use super::dialogs::Dialog;
use super::Editor;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

impl Editor {
    /// Ctrl+N
    pub fn cmd_new(&mut self) -> Result<()> {
        let step = self.docs.new_document();
        self.apply_step(step);
        Ok(())
    }

    /// Ctrl+O: ask for a path, pre-filled with the current file's directory.
    pub fn cmd_open(&mut self) -> Result<()> {
        let initial = self
            .docs
            .document()
            .path
            .as_deref()
            .and_then(|p| p.parent())
            .map(|d| format!("{}/", d.display()))
            .unwrap_or_default();
        self.open_prompt(PromptKind::Open, initial);
        Ok(())
    }

    /// Open `path`, asking about unsaved changes first.
    pub fn open_path(&mut self, path: PathBuf) {
        if self.refuse_while_busy() {
            return;
        }
        let step = self.docs.open(path);
        self.apply_step(step);
    }

    /// Ctrl+S
    pub fn cmd_save(&mut self) -> Result<()> {
        if self.refuse_while_busy() {
            return Ok(());
        }
        let step = self.docs.save(&self.buf.to_string());
        self.apply_step(step);
        Ok(())
    }

    /// Alt+S
    pub fn cmd_save_as(&mut self) -> Result<()> {
        if self.refuse_while_busy() {
            return Ok(());
        }
        let initial = self.docs.document().path.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
        self.open_prompt(PromptKind::SaveAs, initial);
        Ok(())
    }

    pub fn save_to_path(&mut self, path: PathBuf) {
        let step = self.docs.save_as(path, &self.buf.to_string());
        self.apply_step(step);
    }

    /// The save-as prompt was dismissed without a path.
    pub(crate) fn save_as_cancelled(&mut self) {
        let step = self.docs.cancel_save_as();
        self.apply_step(step);
    }

    /// Ctrl+Q: quit, asking about unsaved changes first.
    pub fn cmd_quit(&mut self) -> Result<()> {
        let step = self.docs.quit();
        self.apply_step(step);
        Ok(())
    }

    /// Answer to the unsaved-changes dialog.
    pub fn answer_unsaved(&mut self, choice: GuardChoice) {
        self.dialog = None;
        let step = self.docs.choose(choice, &self.buf.to_string());
        self.apply_step(step);
    }

    /// Retry the failed save with `label`.
    pub fn save_with_encoding(&mut self, label: &str) {
        self.dialog = None;
        let step = self.docs.save_with_encoding(label, &self.buf.to_string());
        self.apply_step(step);
    }

    pub(crate) fn encoding_cancelled(&mut self) {
        self.dialog = None;
        let step = self.docs.cancel_encoding_prompt();
        self.apply_step(step);
        self.set_status("Save cancelled.", Duration::from_secs(2));
    }

    /// Alt+I: ask for an https URL.
    pub fn cmd_import(&mut self) -> Result<()> {
        if self.refuse_while_busy() {
            return Ok(());
        }
        self.open_prompt(PromptKind::ImportUrl, "https://");
        Ok(())
    }

    pub fn import_url(&mut self, url: &str) {
        let step = self.docs.import(url);
        self.apply_step(step);
    }

    /// Esc while an import is running.
    pub fn cancel_import(&mut self) -> bool {
        if self.docs.cancel_import() {
            self.set_status("Import cancelled.", Duration::from_secs(2));
            true
        } else {
            false
        }
    }

    /// Ctrl+E
    pub fn cmd_recent(&mut self) -> Result<()> {
        self.dialog = Some(Dialog::Recent { selected: 0 });
        self.mark_redraw();
        Ok(())
    }

    pub fn open_recent(&mut self, index: usize) {
        let Some(path) = self.docs.recent().get(index).cloned() else { return };
        self.dialog = None;
        if self.refuse_while_busy() {
            return;
        }
        let step = self.docs.open_recent(path);
        self.apply_step(step);
    }

    pub fn remove_recent(&mut self, index: usize) {
        let Some(path) = self.docs.recent().get(index).cloned() else { return };
        let step = self.docs.remove_recent(&path);
        self.apply_step(step);
        if let Some(Dialog::Recent { selected }) = &mut self.dialog {
            *selected = (*selected).min(self.docs.recent().len().saturating_sub(1));
        }
    }

    pub fn clear_recent(&mut self) -> Result<()> {
        let step = self.docs.clear_recent();
        let cleared = step == Step::Idle;
        self.apply_step(step);
        if let Some(Dialog::Recent { selected }) = &mut self.dialog {
            *selected = 0;
        }
        if cleared {
            self.set_status("Recent files cleared.", Duration::from_secs(2));
        }
        Ok(())
    }

    /// One background task at a time.
    fn refuse_while_busy(&mut self) -> bool {
        if self.docs.is_busy() {
            self.apply_step(Step::Failed { message: "Busy, please wait...".to_string() });
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::dialogs::Dialog;
    use crate::editor::tests::{editor, editor_with};
    use crate::guard::GuardChoice;
    use crate::types::PromptKind;
    use std::fs;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(10);

    fn settle(ed: &mut crate::editor::Editor) {
        for step in ed.docs.settle(WAIT) {
            ed.apply_step(step);
        }
    }

    #[test]
    fn quitting_a_clean_document_is_immediate() {
        let mut ed = editor();
        ed.cmd_quit().unwrap();
        assert!(ed.should_quit);
    }

    #[test]
    fn quitting_a_modified_document_asks_first() {
        let mut ed = editor_with("text");
        ed.replace_selection_or_insert("x");
        ed.cmd_quit().unwrap();
        assert!(!ed.should_quit);
        assert_eq!(ed.dialog, Some(Dialog::Unsaved));

        ed.answer_unsaved(GuardChoice::Cancel);
        assert!(!ed.should_quit);
        assert_eq!(ed.dialog, None);

        ed.cmd_quit().unwrap();
        ed.answer_unsaved(GuardChoice::Discard);
        assert!(ed.should_quit);
    }

    #[test]
    fn save_without_a_path_prompts() {
        let mut ed = editor();
        ed.cmd_save().unwrap();
        assert_eq!(ed.prompt.as_ref().map(|p| p.kind), Some(PromptKind::SaveAs));
    }

    #[test]
    fn save_then_open_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let mut ed = editor();
        ed.replace_selection_or_insert("héllo\nworld");
        ed.save_to_path(path.clone());
        settle(&mut ed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "héllo\nworld");
        assert!(!ed.docs.document().modified);
        assert_eq!(ed.window_title(), "Scratchpad - note.txt");

        ed.cmd_new().unwrap();
        assert_eq!(ed.buf.to_string(), "");
        ed.open_recent(0);
        settle(&mut ed);
        assert_eq!(ed.buf.to_string(), "héllo\nworld");
    }

    #[test]
    fn saving_an_unedited_mixed_line_ending_file_keeps_its_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, b"a\r\nb\nc").unwrap();
        let mut ed = editor();
        ed.open_path(path.clone());
        settle(&mut ed);
        ed.cmd_save().unwrap();
        settle(&mut ed);
        assert_eq!(fs::read(&path).unwrap(), b"a\r\nb\nc");
    }

    #[test]
    fn saving_from_the_quit_dialog_quits_after_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.txt");
        let mut ed = editor();
        ed.replace_selection_or_insert("keep me");
        ed.cmd_quit().unwrap();
        ed.answer_unsaved(GuardChoice::Save);
        assert_eq!(ed.prompt.as_ref().map(|p| p.kind), Some(PromptKind::SaveAs));
        ed.prompt = None;
        ed.save_to_path(path.clone());
        settle(&mut ed);
        assert!(ed.should_quit);
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }

    #[test]
    fn invalid_urls_never_start_a_fetch() {
        let mut ed = editor();
        ed.import_url("http://example.com");
        assert!(!ed.docs.is_busy());
        assert!(ed.status_text().is_some_and(|s| s.contains("HTTPS")));
        assert!(!ed.cancel_import());
    }
}
