//! Terminal setup and teardown.

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    style,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{self, Stdout, Write};
use std::sync::Once;

/// RAII guard for terminal state: raw mode, alternate screen and mouse capture are switched on
/// in `new` and restored in `Drop`, even on an early return or unwind.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new(stdout: &mut Stdout) -> Result<Self> {
        install_panic_hook();
        terminal::enable_raw_mode().context("enable_raw_mode failed")?;
        stdout
            .execute(terminal::EnterAlternateScreen)
            .and_then(|s| s.execute(EnableMouseCapture))
            .and_then(|s| s.execute(cursor::Hide))
            .and_then(|s| s.execute(terminal::Clear(ClearType::All)))
            .context("terminal setup failed")?;
        stdout.flush()?;
        Ok(Self)
    }
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = stdout.execute(style::ResetColor);
    let _ = stdout.execute(cursor::Show);
    let _ = stdout.execute(DisableMouseCapture);
    let _ = stdout.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

/// Leave raw mode before the default hook prints, so a panic message is readable, and record
/// the panic in the log.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            tracing::error!(target: "runtime.panic", %info, "panic");
            default_panic(info);
        }));
    });
}
