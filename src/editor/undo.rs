//! Edits and undo/redo. Every change to the buffer goes through `apply_edits`.

use crate::buffer::Buffer;
use crate::types::{EditOperation, Pos, UndoEntry};
use super::Editor;
use anyhow::Result;

const UNDO_CAP: usize = 1000;

/// Apply one operation; returns where the cursor lands after it.
fn apply(buf: &mut Buffer, op: &EditOperation) -> Pos {
    match op {
        EditOperation::Insert { pos, text } => buf.insert_str(*pos, text),
        EditOperation::Delete { start, end, .. } => buf.delete_range(*start, *end),
    }
}

/// The operation that cancels `op`.
fn invert(op: &EditOperation) -> EditOperation {
    match op {
        EditOperation::Insert { pos, text } => EditOperation::Delete {
            start: *pos,
            end: Buffer::calc_end_pos(*pos, text),
            deleted_text: text.clone(),
        },
        EditOperation::Delete { start, deleted_text, .. } => {
            EditOperation::Insert { pos: *start, text: deleted_text.clone() }
        }
    }
}

impl Editor {
    /// Apply `ops` in order as a single undoable step.
    pub fn apply_edits(&mut self, ops: Vec<EditOperation>) {
        if ops.is_empty() {
            return;
        }
        let cursor_before = self.cursor;
        let anchor_before = self.anchor;
        let mut cursor = self.cursor;
        for op in &ops {
            cursor = apply(&mut self.buf, op);
        }
        self.cursor = self.buf.clamp_pos(cursor);
        self.anchor = None;

        self.undo.push(UndoEntry { ops, cursor_before, anchor_before, cursor_after: self.cursor });
        if self.undo.len() > UNDO_CAP {
            self.undo.drain(0..(self.undo.len() - UNDO_CAP));
        }
        self.redo.clear();
        self.docs.mark_modified();
        self.mark_redraw();
    }

    /// Delete the selection, if any, then insert `text` at the cursor.
    pub fn replace_selection_or_insert(&mut self, text: &str) {
        let mut ops = Vec::with_capacity(2);
        let mut at = self.cursor;
        if let Some((a, b)) = self.selection_range() {
            ops.push(EditOperation::Delete { start: a, end: b, deleted_text: self.buf.get_range(a, b) });
            at = a;
        }
        if !text.is_empty() {
            ops.push(EditOperation::Insert { pos: at, text: text.to_string() });
        }
        self.apply_edits(ops);
    }

    /// Delete the selection, or the range from the cursor to `other` when nothing is selected.
    pub fn delete_selection_or(&mut self, other: Option<Pos>) {
        let range = self.selection_range().or_else(|| {
            let other = other?;
            Some(if other < self.cursor { (other, self.cursor) } else { (self.cursor, other) })
        });
        if let Some((a, b)) = range {
            let deleted_text = self.buf.get_range(a, b);
            self.apply_edits(vec![EditOperation::Delete { start: a, end: b, deleted_text }]);
        }
    }

    /// Undo the most recent step.
    pub fn undo(&mut self) -> Result<()> {
        let Some(entry) = self.undo.pop() else {
            self.set_status("Nothing to undo.", std::time::Duration::from_secs(2));
            return Ok(());
        };
        for op in entry.ops.iter().rev() {
            apply(&mut self.buf, &invert(op));
        }
        self.cursor = self.buf.clamp_pos(entry.cursor_before);
        self.anchor = entry.anchor_before;
        self.redo.push(entry);
        self.docs.mark_modified();
        self.mark_redraw();
        self.ensure_visible();
        Ok(())
    }

    /// Redo the most recently undone step.
    pub fn redo(&mut self) -> Result<()> {
        let Some(entry) = self.redo.pop() else {
            self.set_status("Nothing to redo.", std::time::Duration::from_secs(2));
            return Ok(());
        };
        for op in &entry.ops {
            apply(&mut self.buf, op);
        }
        self.cursor = self.buf.clamp_pos(entry.cursor_after);
        self.anchor = None;
        self.undo.push(entry);
        self.docs.mark_modified();
        self.mark_redraw();
        self.ensure_visible();
        Ok(())
    }

    /// Forget all history, e.g. after a different file was loaded.
    pub(crate) fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
