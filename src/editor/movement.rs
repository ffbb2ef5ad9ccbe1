//! Cursor movement.

use crate::types::Pos;
use super::Editor;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cmp::min;

/// Word-boundary classes for Ctrl+arrow jumps.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Space,
    Word,
    Punct,
}

fn class_of(ch: char) -> CharClass {
    if ch.is_whitespace() {
        CharClass::Space
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

impl Editor {
    /// Move the cursor in response to a movement key. With `selecting` (Shift held) the
    /// selection is started or extended, otherwise it is dropped.
    pub fn move_cursor(&mut self, key: KeyEvent, selecting: bool) {
        if selecting && self.anchor.is_none() {
            self.anchor = Some(self.cursor);
        }
        if !selecting {
            self.anchor = None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = self.editor_height().saturating_sub(1).max(1);
        let last_line = self.buf.line_count() - 1;
        let mut p = self.cursor;

        match key.code {
            KeyCode::Left if ctrl => p = self.prev_word_start(p),
            KeyCode::Right if ctrl => p = self.next_word_start(p),
            KeyCode::Left => p = self.buf.prev_pos(p).unwrap_or(p),
            KeyCode::Right => p = self.buf.next_pos(p).unwrap_or(p),
            KeyCode::Up => p.y = p.y.saturating_sub(1),
            KeyCode::Down => p.y = min(p.y + 1, last_line),
            KeyCode::PageUp => p.y = p.y.saturating_sub(page),
            KeyCode::PageDown => p.y = min(p.y + page, last_line),
            KeyCode::Home if ctrl => p = Pos::default(),
            KeyCode::End if ctrl => p = self.buf.end_pos(),
            KeyCode::Home => p.x = 0,
            KeyCode::End => p.x = self.buf.line_len_chars(p.y),
            _ => {}
        }

        self.cursor = self.buf.clamp_pos(p);
        self.ensure_visible();
        self.mark_redraw();
    }

    /// Start of the next word or punctuation run; the next line's start at end of line.
    fn next_word_start(&self, p: Pos) -> Pos {
        let chars: Vec<char> = self.buf.line(p.y).chars().collect();
        if p.x >= chars.len() {
            return self.buf.next_pos(p).unwrap_or(p);
        }
        let first = class_of(chars[p.x]);
        let mut i = p.x + 1;
        if first == CharClass::Word {
            while i < chars.len() && class_of(chars[i]) == CharClass::Word {
                i += 1;
            }
        }
        while i < chars.len() && class_of(chars[i]) == CharClass::Space {
            i += 1;
        }
        Pos { y: p.y, x: i }
    }

    /// Start of the word (or punctuation char) before `p`; the previous line's end at column 0.
    fn prev_word_start(&self, p: Pos) -> Pos {
        if p.x == 0 {
            return self.buf.prev_pos(p).unwrap_or(p);
        }
        let chars: Vec<char> = self.buf.line(p.y).chars().collect();
        let mut i = min(p.x, chars.len());
        while i > 0 && class_of(chars[i - 1]) == CharClass::Space {
            i -= 1;
        }
        if i > 0 && class_of(chars[i - 1]) == CharClass::Word {
            while i > 0 && class_of(chars[i - 1]) == CharClass::Word {
                i -= 1;
            }
        } else {
            i = i.saturating_sub(1);
        }
        Pos { y: p.y, x: i }
    }
}
