//! Full-screen overlays: help screen, statistics screen.

use crate::types::DocumentStats;
use super::Editor;
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use std::io::Write;

const HELP: &[&str] = &[
    " SCRATCHPAD HELP ",
    "=================",
    "",
    " FILE:",
    "  Ctrl + N        New document",
    "  Ctrl + O        Open file (Tab completes paths)",
    "  Ctrl + E        Recent files",
    "  Ctrl + S        Save",
    "  Alt + S         Save as",
    "  Alt + I         Import text from an https URL (Esc cancels)",
    "",
    " EDITING:",
    "  Ctrl + Z / Y    Undo / Redo",
    "  Ctrl + C / X    Copy / Cut selection",
    "  Ctrl + V        Paste",
    "  Ctrl + A        Select all",
    "  Shift + Arrows  Select while moving",
    "  Ctrl + Arrows   Jump by word",
    "",
    " SEARCH:",
    "  Ctrl + F / F3   Find / Find next",
    "  Ctrl + R        Replace",
    "  Alt + R         Replace all",
    "  Ctrl + G        Go to line",
    "",
    " SYSTEM:",
    "  Ctrl + P        Command palette",
    "  Alt + W         Toggle word wrap",
    "  F2              Document statistics",
    "  Ctrl + Q        Quit (asks about unsaved changes)",
    "",
    " Press any key to close help...",
];

impl Editor {
    /// Calculate document statistics.
    pub fn calculate_stats(&self) -> DocumentStats {
        let mut word_count = 0;
        let mut histogram = vec![0; 10];
        for y in 0..self.buf.line_count() {
            let line = self.buf.line(y);
            word_count += line.split_whitespace().count();
            histogram[(line.chars().count() / 10).min(9)] += 1;
        }
        let encoding = self.docs.document().encoding;
        DocumentStats {
            line_count: self.buf.line_count(),
            word_count,
            char_count: self.buf.len_chars(),
            byte_count: encoding.encode(&self.buf.to_string()).ok().map(|b| b.len()),
            line_ending: self.buf.line_ending,
            encoding: encoding.label(),
            line_length_histogram: histogram,
        }
    }

    fn draw_centered<W: Write>(&self, out: &mut W, lines: &[String], bg: Color) -> Result<()> {
        let (width, height) = (usize::from(self.screen.0), usize::from(self.screen.1));
        out.queue(cursor::Hide)?;
        out.queue(style::SetBackgroundColor(bg))?;
        out.queue(style::SetForegroundColor(Color::White))?;
        out.queue(terminal::Clear(ClearType::All))?;
        let start_y = height.saturating_sub(lines.len()) / 2;
        for (i, line) in lines.iter().enumerate() {
            let x = width.saturating_sub(line.chars().count()) / 2;
            out.queue(cursor::MoveTo(x as u16, (start_y + i) as u16))?;
            out.queue(style::Print(line))?;
        }
        out.queue(style::ResetColor)?;
        out.flush()?;
        Ok(())
    }

    /// Render the document statistics screen.
    pub fn render_stats<W: Write>(&self, out: &mut W) -> Result<()> {
        let stats = self.calculate_stats();
        let size = stats
            .byte_count
            .map_or_else(|| format!("not representable in {}", stats.encoding), |n| format!("{n} bytes"));
        let mut lines = vec![
            " DOCUMENT STATISTICS ".to_string(),
            "=====================".to_string(),
            String::new(),
            format!("  Lines:       {}", stats.line_count),
            format!("  Words:       {}", stats.word_count),
            format!("  Characters:  {}", stats.char_count),
            format!("  File size:   {size}"),
            format!("  End of line: {}", stats.line_ending.name()),
            format!("  Encoding:    {}", stats.encoding),
            String::new(),
            " LINE LENGTH DISTRIBUTION: ".to_string(),
        ];
        let max_val = stats.line_length_histogram.iter().copied().max().unwrap_or(1).max(1);
        for (i, &count) in stats.line_length_histogram.iter().enumerate() {
            let label = if i == 9 { "90+  ".to_string() } else { format!("{:>2}-{:<2}", i * 10, i * 10 + 9) };
            let bar = "█".repeat(count * 30 / max_val);
            lines.push(format!("  {label} {bar:<30} ({count})"));
        }
        lines.push(String::new());
        lines.push(" Press any key to close... ".to_string());
        self.draw_centered(out, &lines, Color::DarkMagenta)
    }

    /// Render the help screen.
    pub fn render_help<W: Write>(&self, out: &mut W) -> Result<()> {
        let lines: Vec<String> = HELP.iter().map(|s| (*s).to_string()).collect();
        self.draw_centered(out, &lines, self.theme.dialog_bg)
    }
}
