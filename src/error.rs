//! Errors produced by the document core (loading, saving, importing, settings).
//!
//! The terminal shell works in `anyhow`; everything below it returns this typed error so the
//! shell can tell an "unrepresentable characters" save failure apart from a plain I/O failure.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every failure the document core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// The file does not exist.
    #[error("File does not exist: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The OS refused access to the file.
    #[error("Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure (device error, path is a directory, disk full, ...).
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The text holds characters the chosen encoding cannot represent.
    #[error("The document contains characters that cannot be saved as {encoding}")]
    Unrepresentable { encoding: String },

    /// Rejected before any network activity.
    #[error("Please enter a valid HTTPS URL (got '{url}')")]
    InvalidUrl { url: String },

    /// Transport failure, timeout, or a non-2xx response.
    #[error("Failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    /// The settings or config file could not be (de)serialized.
    #[error("Settings error: {message}")]
    Settings { message: String },
}

impl Error {
    /// Classify an I/O error that happened while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Whether the failure means the file is simply gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let p = Path::new("/tmp/missing.txt");
        let e = Error::from_io(p, io::Error::from(io::ErrorKind::NotFound));
        assert!(e.is_not_found());
        assert_eq!(e.to_string(), "File does not exist: /tmp/missing.txt");

        let e = Error::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, Error::PermissionDenied { .. }));

        let e = Error::from_io(p, io::Error::other("device on fire"));
        assert!(matches!(e, Error::Io { .. }));
        assert!(e.to_string().contains("device on fire"));
    }

    #[test]
    fn unrepresentable_is_distinguishable() {
        let e = Error::Unrepresentable { encoding: "ISO-8859-1".into() };
        assert!(matches!(e, Error::Unrepresentable { .. }));
        assert!(!e.is_not_found());
        assert!(e.to_string().contains("ISO-8859-1"));
    }
}
