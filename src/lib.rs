//! Scratchpad: a small plain-text editor for the terminal.
//!
//! ## Reading guide
//! - **`document::DocumentState`** owns the document's path, encoding and modified flag, the
//!   close guard and the recent-files list. It never touches the terminal; it returns
//!   [`document::Step`]s for the shell to act on.
//! - **`loader` / `saver` / `web`** do the disk and network work on background threads and
//!   report back through **`worker`** events.
//! - **`detect` / `encoding`** guess a file's encoding from a streamed prefix and convert text
//!   to and from bytes.
//! - **`editor::Editor`** is the crossterm shell: buffer, cursor, prompts, dialogs, rendering.

pub mod buffer;
pub mod commands;
pub mod config;
pub mod detect;
pub mod document;
pub mod editor;
pub mod encoding;
pub mod error;
pub mod guard;
pub mod loader;
pub mod logging;
pub mod recent;
pub mod saver;
pub mod settings;
pub mod terminal;
pub mod types;
pub mod utils;
pub mod web;
pub mod worker;
