//! Writing a document to disk.
//!
//! Text is encoded up front so an unrepresentable character fails the save before the file
//! is touched. The bytes go to a hidden sibling file which is then renamed over the target.

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::worker::WorkerEvent;
use crossbeam_channel::Sender;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// A completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Canonical path that was written.
    pub path: PathBuf,
    pub encoding: TextEncoding,
}

/// Encode `text` and write it to `path`.
pub fn save_file(path: &Path, text: &str, encoding: TextEncoding) -> Result<SavedFile> {
    let bytes = encoding.encode(text)?;
    let path = write_atomically(path, &bytes)?;
    Ok(SavedFile { path, encoding })
}

/// Replace `path` with `bytes`, keeping the original permissions. Symlinks are followed so
/// the link itself survives. Returns the canonical path written.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let target = if path.exists() {
        fs::canonicalize(path).map_err(|e| Error::from_io(path, e))?
    } else {
        path.to_path_buf()
    };
    if target.is_dir() {
        return Err(Error::Io { path: target, source: io::Error::other("is a directory") });
    }
    let Some(name) = target.file_name() else {
        return Err(Error::Io {
            path: target,
            source: io::Error::new(io::ErrorKind::InvalidInput, "no file name"),
        });
    };
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let tmp = dir.join(format!(".{}.scratchpad-tmp", name.to_string_lossy()));

    let written = (|| -> io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        if let Ok(meta) = fs::metadata(&target) {
            fs::set_permissions(&tmp, meta.permissions())?;
        }
        fs::rename(&tmp, &target)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(Error::from_io(&target, e));
    }
    Ok(fs::canonicalize(&target).unwrap_or(target))
}

/// Save on a background thread. Sends exactly one `Saved` event.
pub fn spawn_save(
    path: PathBuf,
    text: String,
    encoding: TextEncoding,
    generation: u64,
    tx: Sender<WorkerEvent>,
) -> Result<()> {
    let thread_path = path.clone();
    thread::Builder::new()
        .name("scratchpad-save".into())
        .spawn(move || {
            let result = save_file(&thread_path, &text, encoding);
            match &result {
                Ok(saved) => tracing::info!(target: "io",
                    path = %saved.path.display(),
                    encoding = saved.encoding.label(),
                    "saved file"
                ),
                Err(e) => tracing::warn!(target: "io", path = %thread_path.display(), error = %e, "save failed"),
            }
            let _ = tx.send(WorkerEvent::Saved { generation, result });
        })
        .map(|_| ())
        .map_err(|source| Error::Io { path, source })
}
