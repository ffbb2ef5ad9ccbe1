//! User configuration and on-disk locations.
//!
//! ```toml
//! [editor]
//! tab_width = 4
//! word_wrap = false
//!
//! [web]
//! timeout_secs = 30
//!
//! [log]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used under the platform config/data dirs.
pub const APP_DIR: &str = "scratchpad";

/// Stylesheet shipped with the binary.
pub const BUNDLED_STYLE: &str = include_str!("../assets/style.toml");

/// Name of the optional user stylesheet in the home directory.
pub const USER_STYLE_FILE: &str = "spstyle.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub web: WebConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Spaces inserted by Tab.
    pub tab_width: usize,
    pub word_wrap: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { tab_width: 4, word_wrap: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub timeout_secs: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// A `tracing_subscriber::EnvFilter` directive.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Settings { message: e.to_string() })
    }

    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::from_io(path, e)),
        }
    }

    pub fn tab_width(&self) -> usize {
        self.editor.tab_width.clamp(1, 16)
    }

    pub fn web_timeout(&self) -> Duration {
        Duration::from_secs(self.web.timeout_secs.max(1))
    }
}

/// `<config_dir>/scratchpad`, if the platform has a config dir.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Where the recent-files list and other session state live.
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("settings.toml"))
}

/// `<data_local_dir>/scratchpad`, home of the log file.
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR))
}

/// The stylesheet text: `<home>/spstyle.toml` if readable, else the bundled default.
pub fn stylesheet_text(home: Option<&Path>) -> String {
    home.map(|h| h.join(USER_STYLE_FILE))
        .and_then(|p| fs::read_to_string(p).ok())
        .unwrap_or_else(|| BUNDLED_STYLE.to_string())
}
