//! Text encodings: user-facing labels, the recognised save set, and strict encoders.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use std::fmt;

/// Labels offered when a save needs a different encoding, in prompt order.
pub const SAVE_ENCODINGS: [&str; 4] = ["UTF-8", "ISO-8859-1", "Windows-1252", "UTF-16"];

/// The encoding a document was read with and will be written with.
///
/// In memory the text is always a Rust `String`; this only matters at the disk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// UTF-16 little-endian, written with a BOM. Shown as plain "UTF-16".
    Utf16Le,
    /// UTF-16 big-endian, written with a BOM.
    Utf16Be,
    /// Strict ISO-8859-1: only U+0000..=U+00FF.
    Latin1,
    Windows1252,
    /// Any other encoding the detector can name (Shift_JIS, KOI8-R, ...).
    Other(&'static Encoding),
}

impl TextEncoding {
    /// Map an `encoding_rs` encoding (e.g. a detector guess) onto our variants.
    pub fn from_encoding(enc: &'static Encoding) -> Self {
        if enc == UTF_8 {
            Self::Utf8
        } else if enc == UTF_16LE {
            Self::Utf16Le
        } else if enc == UTF_16BE {
            Self::Utf16Be
        } else if enc == WINDOWS_1252 {
            Self::Windows1252
        } else {
            Self::Other(enc)
        }
    }

    /// Parse a user-facing or WHATWG label. Case-insensitive.
    ///
    /// ISO-8859-1 is handled here rather than by `encoding_rs`, which folds it into
    /// windows-1252 and would accept characters Latin-1 cannot hold.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_ascii_lowercase();
        match l.as_str() {
            "utf-16" | "utf16" => Some(Self::Utf16Le),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Some(Self::Latin1),
            _ => Encoding::for_label(l.as_bytes()).map(Self::from_encoding),
        }
    }

    /// The label shown in the status bar and the encoding prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Latin1 => "ISO-8859-1",
            Self::Windows1252 => "Windows-1252",
            Self::Other(enc) => enc.name(),
        }
    }

    /// The `encoding_rs` decoder to read bytes in this encoding with.
    ///
    /// Latin-1 reads through windows-1252 (the WHATWG behaviour); the two differ only in the
    /// C1 control range.
    pub fn decoder_encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 => UTF_8,
            Self::Utf16Le => UTF_16LE,
            Self::Utf16Be => UTF_16BE,
            Self::Latin1 | Self::Windows1252 => WINDOWS_1252,
            Self::Other(enc) => enc,
        }
    }

    /// Encode `text` for disk. Fails with [`Error::Unrepresentable`] rather than substituting.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Utf16Le => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&[0xFF, 0xFE]);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                Ok(out)
            }
            Self::Utf16Be => {
                let mut out = Vec::with_capacity(2 + text.len() * 2);
                out.extend_from_slice(&[0xFE, 0xFF]);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Ok(out)
            }
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).map_err(|_| self.unrepresentable()))
                .collect(),
            Self::Windows1252 => self.encode_strict(WINDOWS_1252, text),
            Self::Other(enc) => {
                // Encodings whose WHATWG output encoding differs (e.g. "replacement") would
                // silently write UTF-8 instead.
                if enc.output_encoding() != enc {
                    return Err(self.unrepresentable());
                }
                self.encode_strict(enc, text)
            }
        }
    }

    fn encode_strict(self, enc: &'static Encoding, text: &str) -> Result<Vec<u8>> {
        let (bytes, _, had_errors) = enc.encode(text);
        if had_errors {
            return Err(self.unrepresentable());
        }
        Ok(bytes.into_owned())
    }

    fn unrepresentable(self) -> Error {
        Error::Unrepresentable { encoding: self.label().to_string() }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_save_label_parses_back_to_itself() {
        for label in SAVE_ENCODINGS {
            let enc = TextEncoding::from_label(label).expect(label);
            assert_eq!(enc.label(), label);
        }
    }

    #[test]
    fn labels_are_case_insensitive_and_accept_whatwg_names() {
        assert_eq!(TextEncoding::from_label("utf-8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_label(" latin1 "), Some(TextEncoding::Latin1));
        assert_eq!(TextEncoding::from_label("cp1252"), Some(TextEncoding::Windows1252));
        assert_eq!(
            TextEncoding::from_label("Shift_JIS"),
            Some(TextEncoding::Other(encoding_rs::SHIFT_JIS))
        );
        assert_eq!(TextEncoding::from_label("klingon"), None);
    }

    #[test]
    fn latin1_rejects_characters_above_ff() {
        assert_eq!(TextEncoding::Latin1.encode("café").unwrap(), b"caf\xE9");
        let err = TextEncoding::Latin1.encode("price: 5€").unwrap_err();
        assert!(matches!(err, Error::Unrepresentable { .. }));
    }

    #[test]
    fn windows_1252_has_the_euro_sign_but_not_cjk() {
        assert_eq!(TextEncoding::Windows1252.encode("5€").unwrap(), b"5\x80");
        assert!(matches!(TextEncoding::Windows1252.encode("日本"), Err(Error::Unrepresentable { .. })));
    }

    #[test]
    fn utf16_is_written_little_endian_with_bom() {
        assert_eq!(TextEncoding::Utf16Le.encode("hi").unwrap(), b"\xFF\xFEh\x00i\x00");
        assert_eq!(TextEncoding::Utf16Be.encode("hi").unwrap(), b"\xFE\xFF\x00h\x00i");
    }

    #[test]
    fn utf8_encodes_everything() {
        let text = "naïve 日本 😀";
        assert_eq!(TextEncoding::Utf8.encode(text).unwrap(), text.as_bytes());
    }
}
