//! Modal dialogs drawn over the text: unsaved changes, encoding choice and recent files.

use crate::encoding::SAVE_ENCODINGS;
use crate::guard::GuardChoice;
use super::theme::Theme;
use super::visible;
use anyhow::Result;
use crossterm::{
    cursor,
    event::{KeyCode, KeyEvent},
    style::{self, Attribute},
    QueueableCommand,
};
use std::io::Write;
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Save / Discard / Cancel for a modified document.
    Unsaved,
    /// The text could not be written as `failed`; pick one of the save encodings.
    Encoding { failed: String, selected: usize },
    Recent { selected: usize },
}

/// What a key press in a dialog asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    None,
    Close,
    Guard(GuardChoice),
    Encoding(&'static str),
    CancelEncoding,
    OpenRecent(usize),
    RemoveRecent(usize),
    ClearRecent,
}

fn step(selected: &mut usize, len: usize, up: bool) {
    if len == 0 {
        return;
    }
    *selected = if up { (*selected + len - 1) % len } else { (*selected + 1) % len };
}

impl Dialog {
    /// Interpret `key`. `recent_len` is the current length of the recent-files list.
    pub fn handle_key(&mut self, key: KeyEvent, recent_len: usize) -> DialogAction {
        match self {
            Self::Unsaved => match key.code {
                KeyCode::Char('s' | 'S') | KeyCode::Enter => DialogAction::Guard(GuardChoice::Save),
                KeyCode::Char('d' | 'D') => DialogAction::Guard(GuardChoice::Discard),
                KeyCode::Char('c' | 'C') | KeyCode::Esc => DialogAction::Guard(GuardChoice::Cancel),
                _ => DialogAction::None,
            },
            Self::Encoding { selected, .. } => match key.code {
                KeyCode::Up => {
                    step(selected, SAVE_ENCODINGS.len(), true);
                    DialogAction::None
                }
                KeyCode::Down => {
                    step(selected, SAVE_ENCODINGS.len(), false);
                    DialogAction::None
                }
                KeyCode::Enter => DialogAction::Encoding(SAVE_ENCODINGS[*selected % SAVE_ENCODINGS.len()]),
                KeyCode::Char(c @ '1'..='9') => {
                    let i = (c as usize) - ('1' as usize);
                    SAVE_ENCODINGS.get(i).copied().map_or(DialogAction::None, DialogAction::Encoding)
                }
                KeyCode::Esc => DialogAction::CancelEncoding,
                _ => DialogAction::None,
            },
            Self::Recent { selected } => match key.code {
                KeyCode::Up => {
                    step(selected, recent_len, true);
                    DialogAction::None
                }
                KeyCode::Down => {
                    step(selected, recent_len, false);
                    DialogAction::None
                }
                KeyCode::Enter if *selected < recent_len => DialogAction::OpenRecent(*selected),
                KeyCode::Char(c @ '1'..='9') => {
                    let i = (c as usize) - ('1' as usize);
                    if i < recent_len { DialogAction::OpenRecent(i) } else { DialogAction::None }
                }
                KeyCode::Delete if *selected < recent_len => DialogAction::RemoveRecent(*selected),
                KeyCode::Char('c' | 'C') if recent_len > 0 => DialogAction::ClearRecent,
                KeyCode::Esc => DialogAction::Close,
                _ => DialogAction::None,
            },
        }
    }

    /// Title, body lines and the index of the highlighted line, if any.
    fn content(&self, doc_name: &str, recent: &[PathBuf]) -> (String, Vec<String>, Option<usize>) {
        match self {
            Self::Unsaved => (
                "Unsaved changes".to_string(),
                vec![
                    format!("Save changes to {}?", visible(doc_name)),
                    String::new(),
                    "[S]ave   [D]iscard   [C]ancel".to_string(),
                ],
                None,
            ),
            Self::Encoding { failed, selected } => {
                let mut lines = vec![
                    format!("The text cannot be saved as {failed}."),
                    "Choose another encoding:".to_string(),
                    String::new(),
                ];
                lines.extend(SAVE_ENCODINGS.iter().enumerate().map(|(i, l)| format!("{}. {l}", i + 1)));
                lines.push(String::new());
                lines.push("Enter: save   Esc: cancel".to_string());
                ("Save encoding".to_string(), lines, Some(3 + selected))
            }
            Self::Recent { selected } => {
                let mut lines: Vec<String> = if recent.is_empty() {
                    vec!["No recent files.".to_string()]
                } else {
                    recent.iter().enumerate().map(|(i, p)| format!("{}. {}", i + 1, visible(&p.display().to_string()))).collect()
                };
                lines.push(String::new());
                lines.push("Enter: open   Del: remove   C: clear   Esc: close".to_string());
                let highlight = (!recent.is_empty()).then_some(*selected);
                ("Recent files".to_string(), lines, highlight)
            }
        }
    }

    /// Draw the dialog centered in a `width` x `height` screen.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        theme: &Theme,
        doc_name: &str,
        recent: &[PathBuf],
        (width, height): (usize, usize),
    ) -> Result<()> {
        let (title, lines, highlight) = self.content(doc_name, recent);
        let inner = lines
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()))
            .chain(std::iter::once(UnicodeWidthStr::width(title.as_str())))
            .max()
            .unwrap_or(0)
            .min(width.saturating_sub(6));
        let box_w = inner + 4;
        let box_h = lines.len() + 4;
        let x0 = width.saturating_sub(box_w) / 2;
        let y0 = height.saturating_sub(box_h) / 2;

        let fit = |s: &str| -> String {
            let mut used = 0;
            let mut out = String::new();
            for ch in s.chars() {
                let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1);
                if used + w > inner {
                    break;
                }
                used += w;
                out.push(ch);
            }
            out.push_str(&" ".repeat(inner - used));
            out
        };

        out.queue(style::SetBackgroundColor(theme.dialog_bg))?;
        out.queue(style::SetForegroundColor(theme.dialog_fg))?;
        let border = format!("+{}+", "-".repeat(box_w.saturating_sub(2)));
        out.queue(cursor::MoveTo(x0 as u16, y0 as u16))?;
        out.queue(style::Print(&border))?;
        out.queue(cursor::MoveTo(x0 as u16, (y0 + 1) as u16))?;
        out.queue(style::Print("| "))?;
        out.queue(style::SetAttribute(Attribute::Bold))?;
        out.queue(style::Print(fit(&title)))?;
        out.queue(style::SetAttribute(Attribute::NormalIntensity))?;
        out.queue(style::Print(" |"))?;
        for (i, line) in lines.iter().enumerate() {
            out.queue(cursor::MoveTo(x0 as u16, (y0 + 2 + i) as u16))?;
            out.queue(style::Print("| "))?;
            if highlight == Some(i) {
                out.queue(style::SetForegroundColor(theme.dialog_highlight))?;
                out.queue(style::SetAttribute(Attribute::Reverse))?;
                out.queue(style::Print(fit(line)))?;
                out.queue(style::SetAttribute(Attribute::NoReverse))?;
                out.queue(style::SetForegroundColor(theme.dialog_fg))?;
            } else {
                out.queue(style::Print(fit(line)))?;
            }
            out.queue(style::Print(" |"))?;
        }
        out.queue(cursor::MoveTo(x0 as u16, (y0 + 2 + lines.len()) as u16))?;
        out.queue(style::Print(format!("| {} |", " ".repeat(inner))))?;
        out.queue(cursor::MoveTo(x0 as u16, (y0 + 3 + lines.len()) as u16))?;
        out.queue(style::Print(&border))?;
        out.queue(style::ResetColor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn unsaved_dialog_maps_to_guard_choices() {
        let mut d = Dialog::Unsaved;
        assert_eq!(d.handle_key(key(KeyCode::Char('s')), 0), DialogAction::Guard(GuardChoice::Save));
        assert_eq!(d.handle_key(key(KeyCode::Char('d')), 0), DialogAction::Guard(GuardChoice::Discard));
        assert_eq!(d.handle_key(key(KeyCode::Esc), 0), DialogAction::Guard(GuardChoice::Cancel));
        assert_eq!(d.handle_key(key(KeyCode::Char('x')), 0), DialogAction::None);
    }

    #[test]
    fn encoding_dialog_cycles_and_picks() {
        let mut d = Dialog::Encoding { failed: "ISO-8859-1".into(), selected: 0 };
        d.handle_key(key(KeyCode::Up), 0);
        assert_eq!(d, Dialog::Encoding { failed: "ISO-8859-1".into(), selected: SAVE_ENCODINGS.len() - 1 });
        assert_eq!(d.handle_key(key(KeyCode::Enter), 0), DialogAction::Encoding("UTF-16"));
        assert_eq!(d.handle_key(key(KeyCode::Char('1')), 0), DialogAction::Encoding("UTF-8"));
        assert_eq!(d.handle_key(key(KeyCode::Char('9')), 0), DialogAction::None);
        assert_eq!(d.handle_key(key(KeyCode::Esc), 0), DialogAction::CancelEncoding);
    }

    #[test]
    fn recent_dialog_respects_list_length() {
        let mut d = Dialog::Recent { selected: 0 };
        assert_eq!(d.handle_key(key(KeyCode::Enter), 0), DialogAction::None);
        assert_eq!(d.handle_key(key(KeyCode::Char('c')), 0), DialogAction::None);
        d.handle_key(key(KeyCode::Down), 3);
        assert_eq!(d.handle_key(key(KeyCode::Enter), 3), DialogAction::OpenRecent(1));
        assert_eq!(d.handle_key(key(KeyCode::Delete), 3), DialogAction::RemoveRecent(1));
        assert_eq!(d.handle_key(key(KeyCode::Char('3')), 3), DialogAction::OpenRecent(2));
        assert_eq!(d.handle_key(key(KeyCode::Esc), 3), DialogAction::Close);
    }

    #[test]
    fn renders_into_any_writer() {
        let mut out = Vec::new();
        let recent = vec![PathBuf::from("/tmp/a.txt")];
        Dialog::Recent { selected: 0 }
            .render(&mut out, &Theme::default(), "a.txt", &recent, (80, 24))
            .unwrap();
        assert!(String::from_utf8_lossy(&out).contains("/tmp/a.txt"));
    }
}
