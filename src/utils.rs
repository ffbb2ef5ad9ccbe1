//! Utility functions.

use std::cmp::min;

/// Convert a "character index" to a "byte index" in a UTF‑8 string.
///
/// Rust strings are UTF‑8, so `s[a..b]` only works with byte offsets on char boundaries.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(bi, _)| bi)
}

/// Convert a byte offset back into a character index.
pub fn byte_to_char_index(s: &str, byte_idx: usize) -> usize {
    s[..min(byte_idx, s.len())].chars().count()
}

/// Number of decimal digits in `n` (used to size the line-number gutter).
pub fn digits(n: usize) -> usize {
    n.to_string().len()
}

/// Clamp an `isize` (which may be negative) into a `[lo, hi]` range and return `usize`.
pub fn clamp_usize(v: isize, lo: usize, hi: usize) -> usize {
    usize::try_from(v).map_or(lo, |v| v.clamp(lo, hi))
}

/// Human-readable byte count for progress messages.
pub fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = n;
    let mut unit = 0;
    while value >= 1024 && unit + 1 < UNITS.len() {
        value /= 1024;
        unit += 1;
    }
    format!("{value} {}", UNITS[unit])
}

/// Calculate the Levenshtein distance between two strings.
/// Used for "did you mean?" suggestions for unknown commands.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() { return b.len(); }
    if b.is_empty() { return a.len(); }

    // Two rolling rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = min(prev[j + 1] + 1, min(cur[j] + 1, prev[j] + cost));
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_unicode() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 1);
        assert_eq!(char_to_byte_index(s, 2), 3); // after the 2-byte é
        assert_eq!(char_to_byte_index("a😀b", 2), 5);
        assert_eq!(char_to_byte_index("日本語", 3), 9);
    }

    #[test]
    fn char_to_byte_beyond_end() {
        assert_eq!(char_to_byte_index("abc", 10), 3);
        assert_eq!(char_to_byte_index("", 5), 0);
    }

    #[test]
    fn byte_to_char_unicode() {
        let s = "héllo";
        assert_eq!(byte_to_char_index(s, 1), 1);
        assert_eq!(byte_to_char_index(s, 3), 2);
        assert_eq!(byte_to_char_index("abc", 100), 3);
    }

    #[test]
    fn roundtrip_char_byte_char() {
        let s = "héllo 日本語 😀";
        for i in 0..=s.chars().count() {
            assert_eq!(byte_to_char_index(s, char_to_byte_index(s, i)), i, "char index {i}");
        }
    }

    #[test]
    fn test_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(99), 2);
        assert_eq!(digits(1000), 4);
    }

    #[test]
    fn test_clamp_usize() {
        assert_eq!(clamp_usize(-5, 0, 10), 0);
        assert_eq!(clamp_usize(5, 0, 10), 5);
        assert_eq!(clamp_usize(15, 0, 10), 10);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3 MiB");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("save", "dave"), 1);
    }
}
