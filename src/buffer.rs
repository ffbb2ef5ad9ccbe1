//! The text being edited, stored in a rope so large files stay cheap to edit.
//!
//! Only `\n` separates lines. A file that uses CRLF throughout is stored with `\n` and
//! converted back when serialised; a file that mixes both is stored and written verbatim.

use crate::types::{LineEnding, Pos};
use crate::utils::byte_to_char_index;
use ropey::Rope;
use std::borrow::Cow;
use std::fmt;

pub struct Buffer {
    pub text: Rope,
    /// Line ending used when the buffer is written out.
    pub line_ending: LineEnding,
}

impl Buffer {
    /// An empty buffer (one empty line, LF).
    pub fn new() -> Self {
        Self { text: Rope::new(), line_ending: LineEnding::LF }
    }

    /// Build a buffer from decoded file text, detecting its line ending.
    pub fn from_string(s: &str) -> Self {
        let crlf = s.matches("\r\n").count();
        if crlf == 0 {
            return Self { text: Rope::from_str(s), line_ending: LineEnding::LF };
        }
        if crlf == s.matches('\n').count() {
            return Self { text: Rope::from_str(&s.replace("\r\n", "\n")), line_ending: LineEnding::CRLF };
        }
        Self { text: Rope::from_str(s), line_ending: LineEnding::Mixed }
    }

    /// Total characters, line breaks included.
    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    /// Find `query` at or after `start_char_idx`. Returns the char index of the match.
    pub fn search_from(&self, query: &str, start_char_idx: usize) -> Option<usize> {
        if query.is_empty() || start_char_idx >= self.text.len_chars() {
            return None;
        }
        let hay: String = self.text.slice(start_char_idx..).chars().collect();
        let byte = hay.find(query)?;
        Some(start_char_idx + byte_to_char_index(&hay, byte))
    }

    /// Char indices of every non-overlapping occurrence of `query`, in order.
    pub fn find_all(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return Vec::new();
        }
        let hay: String = self.text.chars().collect();
        let mut out = Vec::new();
        let mut chars_before = 0;
        let mut last_byte = 0;
        for (byte, _) in hay.match_indices(query) {
            chars_before += hay[last_byte..byte].chars().count();
            last_byte = byte;
            out.push(chars_before);
        }
        out
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines().max(1)
    }

    /// Characters on line `y`, not counting the line break.
    pub fn line_len_chars(&self, y: usize) -> usize {
        if y >= self.text.len_lines() {
            return 0;
        }
        let line = self.text.line(y);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' { len - 1 } else { len }
    }

    /// Text of line `y` without its line break.
    pub fn line(&self, y: usize) -> Cow<'_, str> {
        if y >= self.text.len_lines() {
            return Cow::Borrowed("");
        }
        let line = self.text.line(y);
        match line.as_str() {
            Some(s) => Cow::Borrowed(s.strip_suffix('\n').unwrap_or(s)),
            None => {
                let s: String = line.chars().collect();
                Cow::Owned(s.strip_suffix('\n').unwrap_or(&s).to_string())
            }
        }
    }

    /// Clamp a position to a valid line and a valid column within that line.
    pub fn clamp_pos(&self, mut p: Pos) -> Pos {
        p.y = p.y.min(self.line_count() - 1);
        p.x = p.x.min(self.line_len_chars(p.y));
        p
    }

    pub fn pos_to_char_idx(&self, p: Pos) -> usize {
        if p.y >= self.text.len_lines() {
            return self.text.len_chars();
        }
        self.text.line_to_char(p.y) + p.x.min(self.line_len_chars(p.y))
    }

    pub fn char_idx_to_pos(&self, char_idx: usize) -> Pos {
        let char_idx = char_idx.min(self.text.len_chars());
        let y = self.text.char_to_line(char_idx);
        Pos { y, x: char_idx - self.text.line_to_char(y) }
    }

    /// The position just before `p`: one char left, or the end of the previous line.
    pub fn prev_pos(&self, p: Pos) -> Option<Pos> {
        if p.x > 0 {
            Some(Pos { y: p.y, x: p.x - 1 })
        } else if p.y > 0 {
            Some(Pos { y: p.y - 1, x: self.line_len_chars(p.y - 1) })
        } else {
            None
        }
    }

    /// The position just after `p`: one char right, or the start of the next line.
    pub fn next_pos(&self, p: Pos) -> Option<Pos> {
        if p.x < self.line_len_chars(p.y) {
            Some(Pos { y: p.y, x: p.x + 1 })
        } else if p.y + 1 < self.line_count() {
            Some(Pos { y: p.y + 1, x: 0 })
        } else {
            None
        }
    }

    /// Extract a range of text as a string.
    pub fn get_range(&self, start: Pos, end: Pos) -> String {
        let (a, b) = if start <= end { (start, end) } else { (end, start) };
        let (i, j) = (self.pos_to_char_idx(a), self.pos_to_char_idx(b));
        self.text.slice(i..j).chars().collect()
    }

    /// Delete a range and return the start of it (the new cursor position).
    pub fn delete_range(&mut self, start: Pos, end: Pos) -> Pos {
        let (a, b) = if start <= end { (start, end) } else { (end, start) };
        let (i, j) = (self.pos_to_char_idx(a), self.pos_to_char_idx(b));
        if i < j {
            self.text.remove(i..j);
        }
        a
    }

    /// Insert a string (which may contain newlines) and return the position after it.
    pub fn insert_str(&mut self, p: Pos, text: &str) -> Pos {
        let normalized = text.replace("\r\n", "\n");
        let idx = self.pos_to_char_idx(p);
        self.text.insert(idx, &normalized);
        self.char_idx_to_pos(idx + normalized.chars().count())
    }

    /// Where the cursor would end up if `text` was inserted at `p`.
    pub fn calc_end_pos(p: Pos, text: &str) -> Pos {
        let normalized = text.replace("\r\n", "\n");
        match normalized.rsplit_once('\n') {
            None => Pos { y: p.y, x: p.x + normalized.chars().count() },
            Some((_, last)) => Pos {
                y: p.y + normalized.matches('\n').count(),
                x: last.chars().count(),
            },
        }
    }

    /// End of the document.
    pub fn end_pos(&self) -> Pos {
        let y = self.line_count() - 1;
        Pos { y, x: self.line_len_chars(y) }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialises with the buffer's line ending, ready to be encoded and saved.
///
/// LF and CRLF write every break (`\n` or `\r\n`) as that ending; a lone `\r` is kept.
impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eol = match self.line_ending {
            LineEnding::Mixed => {
                for chunk in self.text.chunks() {
                    f.write_str(chunk)?;
                }
                return Ok(());
            }
            LineEnding::LF => "\n",
            LineEnding::CRLF => "\r\n",
        };
        // A `\r` may end one chunk with its `\n` starting the next.
        let mut pending_cr = false;
        for chunk in self.text.chunks() {
            let mut rest = chunk;
            while let Some(i) = rest.find(['\r', '\n']) {
                let (before, tail) = rest.split_at(i);
                if pending_cr && !before.is_empty() {
                    f.write_str("\r")?;
                    pending_cr = false;
                }
                f.write_str(before)?;
                if tail.starts_with('\n') {
                    pending_cr = false;
                    f.write_str(eol)?;
                } else {
                    if pending_cr {
                        f.write_str("\r")?;
                    }
                    pending_cr = true;
                }
                rest = &tail[1..];
            }
            if !rest.is_empty() {
                if pending_cr {
                    f.write_str("\r")?;
                    pending_cr = false;
                }
                f.write_str(rest)?;
            }
        }
        if pending_cr {
            f.write_str("\r")?;
        }
        Ok(())
    }
}
