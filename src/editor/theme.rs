//! Colours for the editor, read from a small TOML stylesheet.

use crossterm::style::Color;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub text: Color,
    pub background: Color,
    pub gutter: Color,
    pub current_line: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub status_fg: Color,
    pub status_bg: Color,
    pub prompt: Color,
    pub dialog_fg: Color,
    pub dialog_bg: Color,
    pub dialog_highlight: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Reset,
            background: Color::Reset,
            gutter: Color::DarkGrey,
            current_line: Color::DarkBlue,
            selection_fg: Color::Black,
            selection_bg: Color::Grey,
            status_fg: Color::Black,
            status_bg: Color::White,
            prompt: Color::Yellow,
            dialog_fg: Color::White,
            dialog_bg: Color::DarkBlue,
            dialog_highlight: Color::Yellow,
        }
    }
}

#[derive(Deserialize, Default)]
struct Stylesheet {
    #[serde(default)]
    colors: HashMap<String, String>,
}

impl Theme {
    /// Build a theme from stylesheet text. Anything missing or unreadable keeps its default.
    pub fn from_stylesheet(text: &str) -> Self {
        let sheet: Stylesheet = match toml::from_str(text) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(target: "settings", error = %e, "invalid stylesheet, using default colours");
                return Self::default();
            }
        };
        let mut theme = Self::default();
        for (key, value) in &sheet.colors {
            let Some(color) = parse_color(value) else {
                tracing::warn!(target: "settings", key = key.as_str(), value = value.as_str(), "unknown colour");
                continue;
            };
            let slot = match key.as_str() {
                "text" => &mut theme.text,
                "background" => &mut theme.background,
                "gutter" => &mut theme.gutter,
                "current_line" => &mut theme.current_line,
                "selection_fg" => &mut theme.selection_fg,
                "selection_bg" => &mut theme.selection_bg,
                "status_fg" => &mut theme.status_fg,
                "status_bg" => &mut theme.status_bg,
                "prompt" => &mut theme.prompt,
                "dialog_fg" => &mut theme.dialog_fg,
                "dialog_bg" => &mut theme.dialog_bg,
                "dialog_highlight" => &mut theme.dialog_highlight,
                _ => continue,
            };
            *slot = color;
        }
        theme
    }
}

/// `"reset"`, a crossterm colour name in snake case, or `#rrggbb`.
fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb { r: channel(0)?, g: channel(2)?, b: channel(4)? });
    }
    let color = match s.replace(['-', ' '], "_").as_str() {
        "reset" => Color::Reset,
        "black" => Color::Black,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        "red" => Color::Red,
        "dark_red" => Color::DarkRed,
        "green" => Color::Green,
        "dark_green" => Color::DarkGreen,
        "yellow" => Color::Yellow,
        "dark_yellow" => Color::DarkYellow,
        "blue" => Color::Blue,
        "dark_blue" => Color::DarkBlue,
        "magenta" => Color::Magenta,
        "dark_magenta" => Color::DarkMagenta,
        "cyan" => Color::Cyan,
        "dark_cyan" => Color::DarkCyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BUNDLED_STYLE;

    #[test]
    fn bundled_stylesheet_matches_defaults() {
        assert_eq!(Theme::from_stylesheet(BUNDLED_STYLE), Theme::default());
    }

    #[test]
    fn overrides_and_bad_values() {
        let theme = Theme::from_stylesheet(
            "[colors]\nstatus_bg = \"#102030\"\nprompt = \"Dark-Cyan\"\ngutter = \"chartreuse\"\n",
        );
        assert_eq!(theme.status_bg, Color::Rgb { r: 0x10, g: 0x20, b: 0x30 });
        assert_eq!(theme.prompt, Color::DarkCyan);
        assert_eq!(theme.gutter, Theme::default().gutter);
    }

    #[test]
    fn broken_toml_falls_back() {
        assert_eq!(Theme::from_stylesheet("[colors"), Theme::default());
        assert_eq!(parse_color("#12345"), None);
    }
}
