//! `scratchpad` binary: argument parsing, start-up wiring and the main loop.

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal;
use scratchpad::config::{self, Config};
use scratchpad::document::DocumentState;
use scratchpad::editor::theme::Theme;
use scratchpad::editor::Editor;
use scratchpad::logging;
use scratchpad::settings::{MemorySettings, SettingsStore, TomlSettings};
use scratchpad::terminal::TerminalGuard;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const USAGE: &str = "\
scratchpad - a small plain-text editor

USAGE:
    scratchpad [FILE]          Open a file
    scratchpad -h, --help      Show this help message
    scratchpad -v, --version   Show version information

Press F1 inside the editor for keybindings.";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut file_to_open = None;
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            "-v" | "--version" => {
                println!("scratchpad v{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                eprintln!("Error: Unknown flag '{flag}'");
                eprintln!("Try 'scratchpad --help' for more information.");
                std::process::exit(1);
            }
            path => file_to_open = Some(PathBuf::from(path)),
        }
    }

    let (config, config_error) = match config::config_path().map(|p| Config::load(&p)) {
        Some(Err(e)) => (Config::default(), Some(e.to_string())),
        Some(Ok(c)) => (c, None),
        None => (Config::default(), None),
    };
    let _log_guard = config::log_dir().and_then(|dir| logging::init(&dir, &config.log.level));
    tracing::info!(target: "runtime", version = env!("CARGO_PKG_VERSION"), "starting");
    if let Some(e) = &config_error {
        tracing::warn!(target: "settings", error = %e, "using default configuration");
    }

    let store: Box<dyn SettingsStore> = match config::settings_path() {
        Some(path) => Box::new(TomlSettings::open(path)),
        None => Box::new(MemorySettings::new()),
    };
    let docs = DocumentState::new(store, config.web_timeout());
    let home = dirs::home_dir();
    let theme = Theme::from_stylesheet(&config::stylesheet_text(home.as_deref()));
    let mut editor = Editor::new(docs, &config, theme);

    let mut stdout = io::stdout();
    let _term = TerminalGuard::new(&mut stdout)?;
    let (w, h) = terminal::size()?;
    editor.on_resize(w, h);

    if let Some(e) = config_error {
        editor.set_status(format!("Config error: {e}"), Duration::from_secs(5));
    }
    if let Some(path) = file_to_open {
        editor.open_path(path);
    }

    while !editor.should_quit {
        editor.render(&mut stdout)?;
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    editor.handle_key(key)?;
                }
                Event::Mouse(mouse) => editor.handle_mouse(mouse),
                Event::Resize(w, h) => editor.on_resize(w, h),
                _ => {}
            }
        }
        editor.tick();
    }

    tracing::info!(target: "runtime", "exiting");
    Ok(())
}
