//! Rendering: drawing the editor UI to the terminal.

use crate::types::{Pos, PromptKind};
use super::{char_width, push_glyph, visible, wrap_segments, Editor};
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::Write;

/// One screen row of text: which line, and which chars of it.
struct Row {
    line: usize,
    start: usize,
    /// Exclusive; `None` runs to the edge of the screen.
    end: Option<usize>,
    first: bool,
}

impl Editor {
    /// Render the entire UI if anything changed since the last call.
    pub fn render<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let title = self.window_title();
        if title != self.title {
            out.queue(terminal::SetTitle(&title))?;
            self.title = title;
        }
        if !self.needs_redraw {
            return Ok(());
        }
        self.needs_redraw = false;

        if self.show_help {
            return self.render_help(out);
        }
        if self.show_stats {
            return self.render_stats(out);
        }

        let width = usize::from(self.screen.0);
        let height = usize::from(self.screen.1);
        let editor_h = self.editor_height();
        let gutter = self.gutter_width();

        out.queue(cursor::Hide)?;
        out.queue(style::ResetColor)?;

        let rows = self.visible_rows(width.saturating_sub(gutter), editor_h);
        for r in 0..editor_h {
            out.queue(cursor::MoveTo(0, r as u16))?;
            out.queue(terminal::Clear(ClearType::CurrentLine))?;
            match rows.get(r) {
                Some(row) => self.render_row(out, row, width.saturating_sub(1), gutter)?,
                None => {
                    out.queue(style::SetForegroundColor(self.theme.gutter))?;
                    out.queue(style::Print("~"))?;
                    out.queue(style::ResetColor)?;
                }
            }
            self.render_scroll_indicator(out, r, width, editor_h)?;
        }

        if self.prompt.is_some() {
            self.render_prompt(out, editor_h, width)?;
        }
        self.render_status_bar(out, height.saturating_sub(1), width)?;

        if let Some(dialog) = &self.dialog {
            let name = self.docs.document().display_name();
            dialog.render(out, &self.theme, &name, self.docs.recent(), (width, height))?;
            out.flush()?;
            return Ok(());
        }

        let (x, y) = match &self.prompt {
            Some(p) => {
                let typed: usize = p.input.chars().take(p.cursor).map(|c| char_width(c, 1)).sum();
                (p.kind.label().len() + typed, editor_h)
            }
            None => self.cursor_screen_pos(&rows, gutter),
        };
        out.queue(cursor::MoveTo(x.min(width.saturating_sub(1)) as u16, y as u16))?;
        out.queue(cursor::Show)?;
        out.flush()?;
        Ok(())
    }

    /// The rows on screen, top to bottom.
    fn visible_rows(&self, avail: usize, editor_h: usize) -> Vec<Row> {
        let mut rows = Vec::with_capacity(editor_h);
        if !self.word_wrap {
            for line in self.scroll_y..self.buf.line_count().min(self.scroll_y + editor_h) {
                rows.push(Row { line, start: self.scroll_x, end: None, first: true });
            }
            return rows;
        }
        let mut screen_row = 0;
        for line in 0..self.buf.line_count() {
            let text = self.buf.line(line);
            let segments = wrap_segments(&text, avail.max(1), self.tab_width);
            for (i, &start) in segments.iter().enumerate() {
                if screen_row >= self.scroll_y {
                    rows.push(Row { line, start, end: segments.get(i + 1).copied(), first: i == 0 });
                    if rows.len() == editor_h {
                        return rows;
                    }
                }
                screen_row += 1;
            }
        }
        rows
    }

    fn render_row<W: Write>(&self, out: &mut W, row: &Row, width: usize, gutter: usize) -> Result<()> {
        let current = row.line == self.cursor.y;
        let bg = if current { self.theme.current_line } else { self.theme.background };
        let avail = width.saturating_sub(gutter);

        out.queue(style::SetBackgroundColor(bg))?;
        out.queue(style::SetForegroundColor(self.theme.gutter))?;
        let number = if row.first { (row.line + 1).to_string() } else { String::new() };
        out.queue(style::Print(format!("{number:>w$}│ ", w = gutter - 2)))?;

        let sel = self.selection_range();
        let text = self.buf.line(row.line);
        let mut used = 0;
        let mut in_selection = false;
        out.queue(style::SetForegroundColor(self.theme.text))?;
        for (i, ch) in text.chars().enumerate().skip(row.start) {
            if row.end.is_some_and(|end| i >= end) {
                break;
            }
            let w = char_width(ch, self.tab_width);
            if used + w > avail {
                break;
            }
            let selected = is_selected(sel, Pos { y: row.line, x: i });
            if selected != in_selection {
                in_selection = selected;
                let (fg, bg) = if selected {
                    (self.theme.selection_fg, self.theme.selection_bg)
                } else {
                    (self.theme.text, bg)
                };
                out.queue(style::SetForegroundColor(fg))?;
                out.queue(style::SetBackgroundColor(bg))?;
            }
            let mut glyph = String::new();
            push_glyph(&mut glyph, ch, self.tab_width);
            out.queue(style::Print(glyph))?;
            used += w;
        }
        if in_selection {
            out.queue(style::SetForegroundColor(self.theme.text))?;
            out.queue(style::SetBackgroundColor(bg))?;
        }
        if current && used < avail {
            out.queue(style::Print(" ".repeat(avail - used)))?;
        }
        out.queue(style::ResetColor)?;
        Ok(())
    }

    /// A one-column scrollbar on the right edge, scaled to the line count.
    fn render_scroll_indicator<W: Write>(&self, out: &mut W, row: usize, width: usize, editor_h: usize) -> Result<()> {
        let total = self.buf.line_count().max(1);
        if total <= editor_h || width == 0 {
            return Ok(());
        }
        let thumb_size = (editor_h * editor_h / total).max(1);
        let thumb_start = self.cursor.y.min(total - 1) * editor_h / total;
        let thumb_start = thumb_start.min(editor_h - thumb_size);
        let on_thumb = (thumb_start..thumb_start + thumb_size).contains(&row);
        out.queue(cursor::MoveTo((width - 1) as u16, row as u16))?;
        out.queue(style::SetForegroundColor(if on_thumb { self.theme.status_bg } else { self.theme.gutter }))?;
        out.queue(style::Print(if on_thumb { "█" } else { "│" }))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }

    fn cursor_screen_pos(&self, rows: &[Row], gutter: usize) -> (usize, usize) {
        let y = rows
            .iter()
            .rposition(|r| r.line == self.cursor.y && r.start <= self.cursor.x)
            .unwrap_or(0);
        let start = rows.get(y).map_or(0, |r| r.start);
        let col: usize = self
            .buf
            .line(self.cursor.y)
            .chars()
            .skip(start)
            .take(self.cursor.x.saturating_sub(start))
            .map(|c| char_width(c, self.tab_width))
            .sum();
        (gutter + col, y)
    }

    fn render_prompt<W: Write>(&self, out: &mut W, prompt_y: usize, width: usize) -> Result<()> {
        let Some(p) = &self.prompt else { return Ok(()) };
        if p.kind == PromptKind::Command {
            let hits = self.commands.search(p.input.trim(), 10);
            let start_y = prompt_y.saturating_sub(hits.len());
            for (i, cmd) in hits.iter().enumerate() {
                out.queue(cursor::MoveTo(0, (start_y + i) as u16))?;
                out.queue(terminal::Clear(ClearType::CurrentLine))?;
                out.queue(style::SetBackgroundColor(Color::AnsiValue(235)))?;
                out.queue(style::SetForegroundColor(self.theme.prompt))?;
                let key = cmd.key.as_deref().map(|k| format!(" ({k})")).unwrap_or_default();
                let line = format!("  {:15} │ {:40}{key}", cmd.name, cmd.description);
                let padded: String = format!("{line:width$}").chars().take(width).collect();
                out.queue(style::Print(padded))?;
                out.queue(style::ResetColor)?;
            }
        }
        out.queue(cursor::MoveTo(0, prompt_y as u16))?;
        out.queue(terminal::Clear(ClearType::CurrentLine))?;
        out.queue(style::SetForegroundColor(self.theme.prompt))?;
        out.queue(style::Print(p.kind.label()))?;
        out.queue(style::ResetColor)?;
        out.queue(style::Print(visible(&p.input)))?;
        Ok(())
    }

    fn render_status_bar<W: Write>(&self, out: &mut W, status_y: usize, width: usize) -> Result<()> {
        out.queue(cursor::MoveTo(0, status_y as u16))?;
        out.queue(terminal::Clear(ClearType::CurrentLine))?;
        out.queue(style::SetForegroundColor(self.theme.status_fg))?;
        out.queue(style::SetBackgroundColor(self.theme.status_bg))?;

        let doc = self.docs.document();
        let path = doc.path.as_ref().map_or_else(|| "Unnamed".to_string(), |p| visible(&p.display().to_string()));
        let mut bar = format!(" {} | {path}", self.status_line().trim_end());
        if self.word_wrap {
            bar.push_str(" [WRAP]");
        }
        if let Some(msg) = self.status_text() {
            bar.push_str(" | ");
            bar.push_str(&visible(msg));
        }
        let bar: String = format!("{bar:width$}").chars().take(width).collect();
        out.queue(style::Print(bar))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }
}

fn is_selected(sel: Option<(Pos, Pos)>, p: Pos) -> bool {
    sel.is_some_and(|(a, b)| a <= p && p < b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tests::editor_with;

    fn draw(ed: &mut Editor) -> String {
        let mut out = Vec::new();
        ed.render(&mut out).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn draws_text_status_and_title() {
        let mut ed = editor_with("hello world");
        let screen = draw(&mut ed);
        assert!(screen.contains("hello world"));
        assert!(screen.contains("Line: 1 | Column: 1 | Characters: 11 | Encoding: UTF-8"));
        assert!(screen.contains("Scratchpad - Unnamed"));
        assert!(draw(&mut ed).is_empty());
    }

    #[test]
    fn wrapped_rows_cover_long_lines() {
        let mut ed = editor_with(&"x".repeat(200));
        ed.word_wrap = true;
        let avail = usize::from(ed.screen.0) - ed.gutter_width();
        let rows = ed.visible_rows(avail, 10);
        assert_eq!(rows.len(), 200_usize.div_ceil(avail));
        assert!(rows[0].first && !rows[1].first);
        ed.cursor = Pos { y: 0, x: 199 };
        assert_eq!(ed.cursor_screen_pos(&rows, ed.gutter_width()).1, rows.len() - 1);
    }

    #[test]
    fn escape_sequences_in_text_never_reach_the_terminal() {
        let mut ed = editor_with("evil\x1b]0;pwned\x07\tend");
        let screen = draw(&mut ed);
        assert!(!screen.contains("\x1b]0;pwned"));
        assert!(screen.contains("evil^[]0;pwned^G"));
        assert!(screen.contains(&format!("^G{}end", " ".repeat(ed.tab_width))));
    }

    #[test]
    fn cursor_after_a_tab_is_drawn_past_the_tab_stop() {
        let mut ed = editor_with("\tx");
        ed.cursor = Pos { y: 0, x: 1 };
        let rows = ed.visible_rows(60, 10);
        let gutter = ed.gutter_width();
        assert_eq!(ed.cursor_screen_pos(&rows, gutter), (gutter + ed.tab_width, 0));
    }

    #[test]
    fn selection_is_half_open() {
        let sel = Some((Pos { y: 0, x: 1 }, Pos { y: 1, x: 0 }));
        assert!(is_selected(sel, Pos { y: 0, x: 5 }));
        assert!(!is_selected(sel, Pos { y: 0, x: 0 }));
        assert!(!is_selected(sel, Pos { y: 1, x: 0 }));
    }
}
