//! Find, replace and replace all.

use crate::types::{EditOperation, Pos};
use super::Editor;
use std::time::Duration;

pub const EMPTY_QUERY: &str = "Please enter text to find.";
pub const NOT_FOUND: &str = "No more occurrences found.";

impl Editor {
    /// Select the next occurrence of `query` after the cursor, wrapping around to the top.
    /// Returns whether a match was found.
    pub fn find_next(&mut self, query: &str) -> bool {
        if query.is_empty() {
            self.set_status(EMPTY_QUERY, Duration::from_secs(3));
            return false;
        }
        self.last_find = Some(query.to_string());

        let from = self.buf.pos_to_char_idx(self.cursor);
        let hit = self.buf.search_from(query, from).or_else(|| self.buf.search_from(query, 0));
        let Some(start) = hit else {
            self.set_status(NOT_FOUND, Duration::from_secs(3));
            return false;
        };
        self.select_chars(start, query.chars().count());
        true
    }

    /// F3: repeat the last search.
    pub fn find_again(&mut self) {
        match self.last_find.clone() {
            Some(q) => {
                self.find_next(&q);
            }
            None => self.open_find_prompt(),
        }
    }

    /// Replace the selected occurrence of `query` (or the next one) with `replacement`, then
    /// move on to the following occurrence.
    pub fn replace_next(&mut self, query: &str, replacement: &str) {
        if query.is_empty() {
            self.set_status(EMPTY_QUERY, Duration::from_secs(3));
            return;
        }
        self.last_find = Some(query.to_string());
        self.last_replace = Some(replacement.to_string());

        if self.selected_text() != query && !self.find_next(query) {
            return;
        }
        let Some((a, b)) = self.selection_range() else { return };
        self.apply_edits(vec![
            EditOperation::Delete { start: a, end: b, deleted_text: query.to_string() },
            EditOperation::Insert { pos: a, text: replacement.to_string() },
        ]);
        if self.buf.search_from(query, self.buf.pos_to_char_idx(self.cursor)).is_some() {
            self.find_next(query);
        } else {
            self.set_status("Replaced 1 occurrence.", Duration::from_secs(3));
        }
        self.ensure_visible();
    }

    /// Replace every occurrence as one undoable step. Returns how many were replaced.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> usize {
        if query.is_empty() {
            self.set_status(EMPTY_QUERY, Duration::from_secs(3));
            return 0;
        }
        self.last_find = Some(query.to_string());
        self.last_replace = Some(replacement.to_string());

        let hits = self.buf.find_all(query);
        if hits.is_empty() {
            self.set_status(NOT_FOUND, Duration::from_secs(3));
            return 0;
        }
        let len = query.chars().count();
        // Back to front, so earlier positions stay valid.
        let mut ops = Vec::with_capacity(hits.len() * 2);
        for &start in hits.iter().rev() {
            let a = self.buf.char_idx_to_pos(start);
            let b = self.buf.char_idx_to_pos(start + len);
            ops.push(EditOperation::Delete { start: a, end: b, deleted_text: query.to_string() });
            if !replacement.is_empty() {
                ops.push(EditOperation::Insert { pos: a, text: replacement.to_string() });
            }
        }
        self.apply_edits(ops);
        let n = hits.len();
        let noun = if n == 1 { "occurrence" } else { "occurrences" };
        self.set_status(format!("Replaced {n} {noun}."), Duration::from_secs(3));
        self.ensure_visible();
        n
    }

    /// Select `len` chars starting at char index `start`, cursor at the end.
    fn select_chars(&mut self, start: usize, len: usize) {
        let a: Pos = self.buf.char_idx_to_pos(start);
        self.anchor = Some(a);
        self.cursor = self.buf.char_idx_to_pos(start + len);
        self.ensure_visible();
        self.mark_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tests::editor_with;

    #[test]
    fn find_selects_and_wraps() {
        let mut ed = editor_with("one two\ntwo three");
        assert!(ed.find_next("two"));
        assert_eq!(ed.selected_text(), "two");
        assert_eq!(ed.cursor, Pos { y: 0, x: 7 });
        assert!(ed.find_next("two"));
        assert_eq!(ed.cursor, Pos { y: 1, x: 3 });
        assert!(ed.find_next("two"));
        assert_eq!(ed.cursor, Pos { y: 0, x: 7 });
    }

    #[test]
    fn find_reports_misses_and_empty_queries() {
        let mut ed = editor_with("abc");
        assert!(!ed.find_next("zzz"));
        assert_eq!(ed.status_text(), Some(NOT_FOUND));
        assert!(!ed.find_next(""));
        assert_eq!(ed.status_text(), Some(EMPTY_QUERY));
    }

    #[test]
    fn replace_walks_occurrences() {
        let mut ed = editor_with("cat cat cat");
        ed.replace_next("cat", "dog");
        assert_eq!(ed.buf.to_string(), "dog cat cat");
        assert_eq!(ed.selected_text(), "cat");
        ed.replace_next("cat", "dog");
        assert_eq!(ed.buf.to_string(), "dog dog cat");
        assert!(ed.docs.document().modified);
    }

    #[test]
    fn replace_all_is_a_single_undo_step() {
        let mut ed = editor_with("a-b-c\n-d");
        assert_eq!(ed.replace_all("-", "+="), 3);
        assert_eq!(ed.buf.to_string(), "a+=b+=c\n+=d");
        ed.undo().unwrap();
        assert_eq!(ed.buf.to_string(), "a-b-c\n-d");
        ed.redo().unwrap();
        assert_eq!(ed.buf.to_string(), "a+=b+=c\n+=d");
    }

    #[test]
    fn replace_all_with_nothing_deletes() {
        let mut ed = editor_with("x1x2x");
        assert_eq!(ed.replace_all("x", ""), 3);
        assert_eq!(ed.buf.to_string(), "12");
        assert_eq!(ed.replace_all("x", "y"), 0);
        assert_eq!(ed.status_text(), Some(NOT_FOUND));
    }
}
