//! Clipboard operations: copy, cut, paste.

use super::Editor;
use anyhow::Result;
use std::time::Duration;

impl Editor {
    /// The system clipboard, opened on first use.
    fn clipboard(&mut self) -> Option<&mut arboard::Clipboard> {
        if self.clipboard.is_none() {
            match arboard::Clipboard::new() {
                Ok(cb) => self.clipboard = Some(cb),
                Err(e) => tracing::warn!(target: "editor", error = %e, "clipboard unavailable"),
            }
        }
        self.clipboard.as_mut()
    }

    /// Copy the selection to the clipboard.
    pub fn copy(&mut self) -> Result<()> {
        let text = self.selected_text();
        if text.is_empty() {
            self.set_status("Nothing selected to copy.", Duration::from_secs(2));
            return Ok(());
        }
        let copied = self.clipboard().is_some_and(|cb| cb.set_text(text).is_ok());
        let msg = if copied { "Copied selection." } else { "Clipboard unavailable." };
        self.set_status(msg, Duration::from_secs(2));
        Ok(())
    }

    /// Copy the selection, then delete it.
    pub fn cut(&mut self) -> Result<()> {
        let text = self.selected_text();
        if text.is_empty() {
            self.set_status("Nothing selected to cut.", Duration::from_secs(2));
            return Ok(());
        }
        if !self.clipboard().is_some_and(|cb| cb.set_text(text).is_ok()) {
            self.set_status("Clipboard unavailable.", Duration::from_secs(2));
            return Ok(());
        }
        self.delete_selection_or(None);
        self.ensure_visible();
        self.set_status("Cut selection.", Duration::from_secs(2));
        Ok(())
    }

    /// Paste over the selection, or at the cursor.
    pub fn paste(&mut self) -> Result<()> {
        let Some(text) = self.clipboard().and_then(|cb| cb.get_text().ok()) else {
            self.set_status("Clipboard unavailable.", Duration::from_secs(2));
            return Ok(());
        };
        self.replace_selection_or_insert(&text);
        self.ensure_visible();
        self.set_status("Pasted.", Duration::from_secs(2));
        Ok(())
    }
}
