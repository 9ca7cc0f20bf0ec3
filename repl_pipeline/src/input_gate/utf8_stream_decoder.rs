// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words multibyte

//! Stateful UTF-8 decoding for a chunked byte stream.
//!
//! Terminal input arrives in whatever chunks the OS hands over, so a multi-byte
//! character can be split across two reads. This decoder holds back the trailing bytes
//! of an incomplete sequence and prepends them to the next chunk.
//!
//! ```text
//! Byte Pattern   Meaning              Total bytes
//! ─────────────────────────────────────────────────
//! 0xxxxxxx       ASCII                1
//! 110xxxxx       2-byte start         2
//! 1110xxxx       3-byte start         3
//! 11110xxx       4-byte start         4
//! 10xxxxxx       Continuation         -
//! ```
//!
//! Invalid bytes decode to [`char::REPLACEMENT_CHARACTER`], one per maximal invalid
//! subsequence (the same rule [`String::from_utf8_lossy`] uses).

use smallvec::SmallVec;

/// The longest incomplete sequence that can be held back is 3 bytes (a 4 byte
/// character missing its last byte).
pub const UTF8_MAX_PENDING_BYTES: usize = 3;

#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    pending: SmallVec<[u8; UTF8_MAX_PENDING_BYTES]>,
}

impl Utf8StreamDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Decode as much of `bytes` (prefixed by any bytes held back from the previous
    /// call) as forms complete characters.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input: Vec<u8> = Vec::with_capacity(self.pending.len() + bytes.len());
        input.extend(self.pending.drain(..));
        input.extend_from_slice(bytes);

        let mut acc = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    acc.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after_valid) = rest.split_at(error.valid_up_to());
                    acc.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        // Invalid sequence in the middle of the input.
                        Some(invalid_len) => {
                            acc.push(char::REPLACEMENT_CHARACTER);
                            rest = &after_valid[invalid_len..];
                        }
                        // Incomplete sequence at the end of the input.
                        None => {
                            self.pending.extend_from_slice(after_valid);
                            break;
                        }
                    }
                }
            }
        }

        acc
    }

    /// Called at end of stream. A dangling partial sequence can never be completed, so
    /// it becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    #[must_use]
    pub fn has_pending_bytes(&self) -> bool { !self.pending.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ab\nc"), "ab\nc");
        assert!(!decoder.has_pending_bytes());
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // "é" is 0xC3 0xA9, "😀" is 0xF0 0x9F 0x98 0x80.
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xC3]), "a");
        assert!(decoder.has_pending_bytes());
        assert_eq!(decoder.decode(&[0xA9, 0xF0, 0x9F]), "é");
        assert_eq!(decoder.decode(&[0x98]), "");
        assert_eq!(decoder.decode(&[0x80, b'z']), "😀z");
        assert!(!decoder.has_pending_bytes());
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_flushes_partial_sequence() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[0xE2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
