//! Streaming encoding detection.
//!
//! Bytes are fed in chunks. A byte-order mark settles the question immediately; otherwise we
//! track UTF-8 validity ourselves and let `chardetng` build frequency statistics for legacy
//! encodings. Pure ASCII (or nothing at all) yields no guess and the caller falls back to
//! UTF-8.

use crate::encoding::TextEncoding;
use encoding_rs::{Encoding, UTF_8};

/// Once the input is known not to be UTF-8, this many non-ASCII bytes are enough for the
/// statistical guess to settle.
const CONFIDENT_NON_ASCII: usize = 512;

/// This many non-ASCII bytes, all forming valid UTF-8, settle on UTF-8 without reading on.
const CONFIDENT_UTF8: usize = 4096;

/// A best-effort guess. First confident result wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingGuess {
    pub encoding: &'static Encoding,
}

impl EncodingGuess {
    pub fn text_encoding(self) -> TextEncoding {
        TextEncoding::from_encoding(self.encoding)
    }

    pub fn label(self) -> &'static str {
        self.text_encoding().label()
    }
}

/// Incremental detector: `feed` chunks until `is_done`, then `close` and read `result`.
pub struct EncodingDetector {
    stats: chardetng::EncodingDetector,
    /// First bytes of the stream, kept until there are enough to look for a BOM.
    head: Vec<u8>,
    bom: Option<&'static Encoding>,
    bom_checked: bool,
    /// Trailing bytes of an incomplete UTF-8 sequence split across chunks.
    utf8_carry: Vec<u8>,
    valid_utf8: bool,
    non_ascii: usize,
    closed: bool,
}

impl EncodingDetector {
    pub fn new() -> Self {
        Self {
            stats: chardetng::EncodingDetector::new(),
            head: Vec::with_capacity(3),
            bom: None,
            bom_checked: false,
            utf8_carry: Vec::new(),
            valid_utf8: true,
            non_ascii: 0,
            closed: false,
        }
    }

    /// Consume the next chunk. Ignored once the detector is done or closed.
    pub fn feed(&mut self, chunk: &[u8]) {
        if chunk.is_empty() || self.closed || self.is_done() {
            return;
        }

        if !self.bom_checked {
            let take = (3 - self.head.len()).min(chunk.len());
            self.head.extend_from_slice(&chunk[..take]);
            if self.head.len() == 3 {
                self.check_bom();
                if self.bom.is_some() {
                    return;
                }
            }
        }

        self.non_ascii += chunk.iter().filter(|b| !b.is_ascii()).count();
        if self.valid_utf8 {
            self.track_utf8(chunk);
        }
        self.stats.feed(chunk, false);
    }

    /// True once a confident answer exists and further input would not change it.
    pub fn is_done(&self) -> bool {
        self.bom.is_some()
            || (!self.valid_utf8 && self.non_ascii >= CONFIDENT_NON_ASCII)
            || (self.valid_utf8 && self.utf8_carry.is_empty() && self.non_ascii >= CONFIDENT_UTF8)
    }

    /// Signal end of input. Streams shorter than a BOM are checked here.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if !self.bom_checked {
            self.check_bom();
        }
        if !self.utf8_carry.is_empty() {
            // Input ended in the middle of a multi-byte sequence.
            self.valid_utf8 = false;
        }
        if self.bom.is_none() {
            self.stats.feed(&[], true);
        }
    }

    /// The current best guess, or `None` when the input carried no signal at all.
    pub fn result(&self) -> Option<EncodingGuess> {
        if let Some(encoding) = self.bom {
            return Some(EncodingGuess { encoding });
        }
        if self.non_ascii == 0 {
            return None;
        }
        let encoding = if self.valid_utf8 && self.utf8_carry.is_empty() {
            UTF_8
        } else {
            self.stats.guess(None, false)
        };
        Some(EncodingGuess { encoding })
    }

    fn check_bom(&mut self) {
        self.bom_checked = true;
        self.bom = Encoding::for_bom(&self.head).map(|(enc, _len)| enc);
    }

    fn track_utf8(&mut self, chunk: &[u8]) {
        let mut joined;
        let bytes = if self.utf8_carry.is_empty() {
            chunk
        } else {
            joined = std::mem::take(&mut self.utf8_carry);
            joined.extend_from_slice(chunk);
            &joined[..]
        };
        match std::str::from_utf8(bytes) {
            Ok(_) => {}
            Err(e) if e.error_len().is_none() => {
                self.utf8_carry = bytes[e.valid_up_to()..].to_vec();
            }
            Err(_) => self.valid_utf8 = false,
        }
    }
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(bytes: &[u8], chunk: usize) -> Option<EncodingGuess> {
        let mut d = EncodingDetector::new();
        for c in bytes.chunks(chunk) {
            d.feed(c);
            if d.is_done() {
                break;
            }
        }
        d.close();
        d.result()
    }

    #[test]
    fn bom_wins_and_finishes_early() {
        let mut d = EncodingDetector::new();
        d.feed(b"\xEF\xBB\xBFhello");
        assert!(d.is_done());
        assert_eq!(d.result().unwrap().label(), "UTF-8");

        assert_eq!(detect(b"\xFF\xFEh\x00i\x00", 1024).unwrap().label(), "UTF-16");
        assert_eq!(detect(b"\xFE\xFF\x00h\x00i", 1024).unwrap().label(), "UTF-16BE");
    }

    #[test]
    fn bom_split_across_tiny_chunks_is_found() {
        assert_eq!(detect(b"\xEF\xBB\xBFabc", 1).unwrap().label(), "UTF-8");
    }

    #[test]
    fn two_byte_bom_only_stream_is_checked_on_close() {
        assert_eq!(detect(b"\xFF\xFE", 1024).unwrap().label(), "UTF-16");
    }

    #[test]
    fn ascii_and_empty_input_give_no_signal() {
        assert_eq!(detect(b"", 1024), None);
        assert_eq!(detect(b"just plain ascii\n", 4), None);
    }

    #[test]
    fn valid_utf8_is_recognised_even_when_split_mid_character() {
        let text = "Größe — 日本語 ".repeat(50);
        // 7-byte chunks guarantee that some multi-byte characters straddle a boundary.
        assert_eq!(detect(text.as_bytes(), 7).unwrap().label(), "UTF-8");
    }

    #[test]
    fn long_utf8_input_settles_before_the_end() {
        let text = "Größe — 日本語 ".repeat(1000);
        let mut d = EncodingDetector::new();
        let mut fed = 0;
        for c in text.as_bytes().chunks(1024) {
            d.feed(c);
            fed += c.len();
            if d.is_done() {
                break;
            }
        }
        assert!(d.is_done());
        assert!(fed < text.len() / 2);
        d.close();
        assert_eq!(d.result().unwrap().label(), "UTF-8");
    }

    #[test]
    fn truncated_multibyte_tail_is_not_utf8() {
        let mut d = EncodingDetector::new();
        d.feed(b"caf\xC3");
        d.close();
        assert_ne!(d.result().unwrap().encoding, UTF_8);
    }

    #[test]
    fn latin_text_is_guessed_as_a_legacy_encoding() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252
            .encode("Le cœur a ses raisons que la raison ne connaît point. Où est l'été ? ");
        let guess = detect(&bytes.repeat(20), 1024).unwrap();
        assert_eq!(guess.label(), "Windows-1252");
    }

    #[test]
    fn enough_non_utf8_evidence_finishes_early() {
        let mut d = EncodingDetector::new();
        d.feed(&[0xE9; 600]);
        assert!(d.is_done());
        // Further input is ignored.
        d.feed(b"\xEF\xBB\xBF");
        d.close();
        assert!(d.result().is_some());
    }
}
