//! Reading a file from disk: detect its encoding, then decode it to a `String`.
//!
//! Detection reads small chunks and stops as soon as the detector is confident. Decoding then
//! streams the whole file again in large chunks, reporting progress as it goes.

use crate::detect::EncodingDetector;
use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::worker::WorkerEvent;
use crossbeam_channel::Sender;
use encoding_rs::{CoderResult, Decoder};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;

const DETECT_CHUNK: usize = 1024;
const DECODE_CHUNK: usize = 1024 * 1024;

/// A fully decoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedText {
    /// Canonical path of the file that was read.
    pub path: PathBuf,
    pub text: String,
    pub encoding: TextEncoding,
}

fn open(path: &Path) -> Result<File> {
    let meta = fs::metadata(path).map_err(|e| Error::from_io(path, e))?;
    if meta.is_dir() {
        return Err(Error::Io {
            path: path.to_path_buf(),
            source: io::Error::other("is a directory"),
        });
    }
    File::open(path).map_err(|e| Error::from_io(path, e))
}

/// Run the streaming detector over `path`. Files with no signal (empty, pure ASCII) are UTF-8.
pub fn detect_file(path: &Path) -> Result<TextEncoding> {
    let mut reader = BufReader::new(open(path)?);
    let mut detector = EncodingDetector::new();
    let mut buf = [0u8; DETECT_CHUNK];
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::from_io(path, e))?;
        if n == 0 {
            break;
        }
        detector.feed(&buf[..n]);
        if detector.is_done() {
            break;
        }
    }
    detector.close();
    Ok(detector.result().map_or(TextEncoding::Utf8, |g| g.text_encoding()))
}

/// Decode all of `path` as `encoding`. A leading BOM is stripped; malformed sequences become
/// U+FFFD. `progress` receives `(bytes_read, total_bytes)` after every chunk.
pub fn decode_file(
    path: &Path,
    encoding: TextEncoding,
    progress: &mut dyn FnMut(u64, u64),
) -> Result<String> {
    let file = open(path)?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::with_capacity(DECODE_CHUNK, file);
    let mut decoder = encoding.decoder_encoding().new_decoder_with_bom_removal();
    let mut text = String::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut buf = vec![0u8; DECODE_CHUNK];
    let mut bytes_read = 0u64;

    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::from_io(path, e))?;
        let last = n == 0;
        decode_chunk(&mut decoder, &buf[..n], &mut text, last);
        if last {
            break;
        }
        bytes_read += n as u64;
        progress(bytes_read, total);
    }
    Ok(text)
}

fn decode_chunk(decoder: &mut Decoder, mut input: &[u8], out: &mut String, last: bool) {
    loop {
        match decoder.max_utf8_buffer_length(input.len()) {
            Some(needed) => out.reserve(needed),
            None => out.reserve(input.len().saturating_mul(3).max(64)),
        }
        let (result, read, _replaced) = decoder.decode_to_string(input, out, last);
        input = &input[read..];
        match result {
            CoderResult::InputEmpty => return,
            CoderResult::OutputFull => {}
        }
    }
}

/// Detect then decode.
pub fn load_file(path: &Path, progress: &mut dyn FnMut(u64, u64)) -> Result<LoadedText> {
    let encoding = detect_file(path)?;
    tracing::debug!(target: "io", path = %path.display(), encoding = encoding.label(), "detected encoding");
    let text = decode_file(path, encoding, progress)?;
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(LoadedText { path, text, encoding })
}

/// Load `path` on a background thread. Sends any number of `LoadProgress` events and then
/// exactly one `Loaded`.
pub fn spawn_load(path: PathBuf, generation: u64, tx: Sender<WorkerEvent>) -> Result<()> {
    let thread_path = path.clone();
    thread::Builder::new()
        .name("scratchpad-load".into())
        .spawn(move || {
            let progress_tx = tx.clone();
            let mut progress = |bytes_read, total| {
                // The receiver may be gone during shutdown; nothing to do about it.
                let _ = progress_tx.send(WorkerEvent::LoadProgress { generation, bytes_read, total });
            };
            let result = load_file(&thread_path, &mut progress);
            match &result {
                Ok(loaded) => tracing::info!(target: "io",
                    path = %loaded.path.display(),
                    chars = loaded.text.chars().count(),
                    "loaded file"
                ),
                Err(e) => tracing::warn!(target: "io", path = %thread_path.display(), error = %e, "load failed"),
            }
            let _ = tx.send(WorkerEvent::Loaded { generation, result });
        })
        .map(|_| ())
        .map_err(|source| Error::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    fn load(bytes: &[u8]) -> LoadedText {
        let f = write_temp(bytes);
        load_file(f.path(), &mut |_, _| {}).unwrap()
    }

    #[test]
    fn empty_file_is_empty_utf8() {
        let loaded = load(b"");
        assert_eq!(loaded.text, "");
        assert_eq!(loaded.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let loaded = load(b"\xEF\xBB\xBFhello\nworld");
        assert_eq!(loaded.text, "hello\nworld");
        assert_eq!(loaded.encoding.label(), "UTF-8");
    }

    #[test]
    fn utf16_with_bom_is_decoded() {
        let loaded = load(b"\xFF\xFEh\x00\xE9\x00");
        assert_eq!(loaded.text, "hé");
        assert_eq!(loaded.encoding.label(), "UTF-16");
    }

    #[test]
    fn legacy_text_round_trips_through_detection() {
        let original = "Où est passée la fenêtre ? Ça coûte très cher, déjà. ".repeat(30);
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(&original);
        let loaded = load(&bytes);
        assert_eq!(loaded.encoding, TextEncoding::Windows1252);
        assert_eq!(loaded.text, original);
    }

    #[test]
    fn multi_chunk_file_reports_progress_and_decodes_fully() {
        let line = "Größe日本\n";
        let text = line.repeat(DECODE_CHUNK / line.len() + 100);
        let f = write_temp(text.as_bytes());
        let mut calls = Vec::new();
        let loaded = load_file(f.path(), &mut |read, total| calls.push((read, total))).unwrap();
        assert_eq!(loaded.text, text);
        assert!(calls.len() >= 2);
        let (last_read, total) = *calls.last().unwrap();
        assert_eq!(last_read, total);
    }

    #[test]
    fn missing_file_and_directory_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(load_file(&missing, &mut |_, _| {}).unwrap_err().is_not_found());
        assert!(matches!(load_file(dir.path(), &mut |_, _| {}), Err(Error::Io { .. })));
    }

    #[test]
    fn spawned_load_reports_one_final_event() {
        let f = write_temp(b"abc");
        let (tx, rx) = crossbeam_channel::unbounded();
        spawn_load(f.path().to_path_buf(), 7, tx).unwrap();
        loop {
            match rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap() {
                WorkerEvent::LoadProgress { generation, .. } => assert_eq!(generation, 7),
                WorkerEvent::Loaded { generation, result } => {
                    assert_eq!(generation, 7);
                    assert_eq!(result.unwrap().text, "abc");
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }
}
