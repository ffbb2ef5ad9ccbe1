//! Common types used throughout the editor shell.

use std::time::Instant;

/// A position in the document.
///
/// - `y`: line index (0-based)
/// - `x`: **char index** within that line (0-based). This is *not* a byte index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Pos {
    pub y: usize,
    pub x: usize,
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// An atomic edit, stored in the order it was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOperation {
    Insert { pos: Pos, text: String },
    /// `deleted_text` is kept so undo can put it back.
    Delete { start: Pos, end: Pos, deleted_text: String },
}

/// One undoable step. Several operations (e.g. typing over a selection, replace all) undo
/// together.
#[derive(Clone, Debug)]
pub struct UndoEntry {
    pub ops: Vec<EditOperation>,
    pub cursor_before: Pos,
    pub anchor_before: Option<Pos>,
    pub cursor_after: Pos,
}

/// What the bottom-line prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
    Find,
    /// First half of find/replace: the text to look for.
    Replace { all: bool },
    /// Second half: the replacement for the previously entered text.
    ReplaceWith { all: bool },
    ImportUrl,
    Command,
    GotoLine,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open: ",
            Self::SaveAs => "Save as: ",
            Self::Find => "Find: ",
            Self::Replace { all: false } => "Replace: ",
            Self::Replace { all: true } => "Replace all: ",
            Self::ReplaceWith { .. } => "Replace with: ",
            Self::ImportUrl => "Import from URL: ",
            Self::Command => "Command: ",
            Self::GotoLine => "Goto line: ",
        }
    }

    /// Prompts that take a file path get Tab completion.
    pub fn completes_paths(self) -> bool {
        matches!(self, Self::Open | Self::SaveAs)
    }
}

/// Prompt state (what the user is typing at the bottom).
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    pub cursor: usize, // char index in input
    /// Tab-completion candidates for `completion_base`.
    pub completions: Vec<String>,
    pub completion_base: String,
    pub completion_index: Option<usize>,
}

impl Prompt {
    /// Create a new prompt pre-filled with `initial`.
    pub fn new(kind: PromptKind, initial: impl Into<String>) -> Self {
        let input = initial.into();
        let cursor = input.chars().count();
        Self {
            kind,
            input,
            cursor,
            completions: Vec::new(),
            completion_base: String::new(),
            completion_index: None,
        }
    }
}

/// Short-lived status message shown in the status bar.
#[derive(Clone)]
pub struct StatusMsg {
    pub text: String,
    pub until: Instant,
}

/// The character sequence used to separate lines in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    LF,
    CRLF,
    /// Both kinds in one file. The text is kept exactly as loaded.
    Mixed,
}

impl LineEnding {
    pub fn name(self) -> &'static str {
        match self {
            Self::LF => "Unix (LF)",
            Self::CRLF => "Windows (CRLF)",
            Self::Mixed => "Mixed (LF and CRLF)",
        }
    }
}

/// Statistics about the current document.
pub struct DocumentStats {
    pub line_count: usize,
    pub word_count: usize,
    pub char_count: usize,
    /// Size once written in the document's encoding, if it can be encoded.
    pub byte_count: Option<usize>,
    pub line_ending: LineEnding,
    pub encoding: &'static str,
    /// Distribution of line lengths for the "chart"
    pub line_length_histogram: Vec<usize>,
}
