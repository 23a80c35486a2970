// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Modified UTF-8, the text encoding the JVM uses whenever string bytes
// cross the native boundary (GetStringUTFChars / NewStringUTF).
//
// It differs from standard UTF-8 in two places:
//   - U+0000 is written as the two-byte form `C0 80`, so encoded text never
//     contains a raw zero byte and can always be NUL-terminated.
//   - Supplementary characters are written as a UTF-16 surrogate pair with
//     each half encoded separately (3 + 3 bytes) instead of one 4-byte form.
//
// The conversion itself is `cesu8`'s Java variant, the same codec `jni`
// uses for `JNIStr`.

use std::borrow::Cow;
use std::ffi::CString;

use thiserror::Error;

/// Decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Mutf8Error {
    /// A raw zero byte, or a 4-byte UTF-8 lead, which modified UTF-8 never
    /// produces.
    #[error("byte 0x{byte:02X} at offset {offset} never occurs in modified UTF-8")]
    ForbiddenByte { offset: usize, byte: u8 },

    /// Truncated, overlong, bad continuation, or an unpaired surrogate.
    #[error("malformed modified UTF-8")]
    Malformed,
}

/// Encode a Rust string as modified UTF-8 (without a terminator).
///
/// Borrows the input when it contains no NUL and no supplementary characters.
pub fn encode(s: &str) -> Cow<'_, [u8]> {
    cesu8::to_java_cesu8(s)
}

/// Encode as a NUL-terminated C string ready for `NewStringUTF`.
pub fn encode_c(s: &str) -> CString {
    let bytes = encode(s).into_owned();
    // SAFETY: modified UTF-8 never contains a zero byte; U+0000 is `C0 80`.
    unsafe { CString::from_vec_unchecked(bytes) }
}

/// Bytes one character takes in modified UTF-8.
pub fn char_len(ch: char) -> usize {
    match ch as u32 {
        0 => 2,
        0x01..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 6,
    }
}

/// Number of bytes `encode` would produce for `s`.
pub fn encoded_len(s: &str) -> usize {
    s.chars().map(char_len).sum()
}

/// Decode modified UTF-8 bytes (without the terminator) into a `String`.
pub fn decode(bytes: &[u8]) -> Result<String, Mutf8Error> {
    // `from_java_cesu8` passes anything that is already valid UTF-8 straight
    // through, raw NULs and 4-byte forms included.
    if let Some(offset) = bytes.iter().position(|&b| b == 0 || b >= 0xF0) {
        return Err(Mutf8Error::ForbiddenByte {
            offset,
            byte: bytes[offset],
        });
    }
    cesu8::from_java_cesu8(bytes)
        .map(Cow::into_owned)
        .map_err(|_| Mutf8Error::Malformed)
}

/// Decode, falling back to U+FFFD replacement when the bytes are malformed.
pub fn decode_lossy(bytes: &[u8]) -> String {
    decode(bytes).unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_borrowed() {
        assert!(matches!(encode("hello"), Cow::Borrowed(_)));
    }

    #[test]
    fn latin_small_e_acute_is_two_bytes() {
        let bytes = encode("héllo");
        assert_eq!(&*bytes, &[0x68, 0xC3, 0xA9, 0x6C, 0x6C, 0x6F]);
        assert_eq!(bytes.len(), 6);
    }

    #[test]
    fn nul_uses_two_byte_form() {
        assert_eq!(&*encode("a\0b"), &[0x61, 0xC0, 0x80, 0x62]);
        assert_eq!(decode(&[0x61, 0xC0, 0x80, 0x62]).unwrap(), "a\0b");
    }

    #[test]
    fn supplementary_becomes_surrogate_pair() {
        // U+1F600 -> D83D DE00
        let bytes = encode("\u{1F600}");
        assert_eq!(&*bytes, &[0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode(&bytes).unwrap(), "\u{1F600}");
    }

    #[test]
    fn encoded_len_matches_encode() {
        for s in ["", "plain", "h\u{e9}llo", "\u{20AC}", "\0", "x\u{10FFFF}y"] {
            assert_eq!(encoded_len(s), encode(s).len(), "input {s:?}");
        }
    }

    #[test]
    fn encode_c_has_no_interior_nul() {
        let c = encode_c("nul\0inside");
        assert_eq!(c.as_bytes(), b"nul\xC0\x80inside");
    }

    #[test]
    fn rejects_raw_nul() {
        assert_eq!(
            decode(b"a\0"),
            Err(Mutf8Error::ForbiddenByte { offset: 1, byte: 0 })
        );
    }

    #[test]
    fn rejects_four_byte_utf8() {
        assert_eq!(
            decode("x\u{1F600}".as_bytes()),
            Err(Mutf8Error::ForbiddenByte { offset: 1, byte: 0xF0 })
        );
    }

    #[test]
    fn rejects_malformed_sequences() {
        // overlong, truncated, bad continuation
        assert_eq!(decode(&[0xC0, 0x81]), Err(Mutf8Error::Malformed));
        assert_eq!(decode(&[0xC3]), Err(Mutf8Error::Malformed));
        assert_eq!(decode(&[0xE2, 0x82, 0x41]), Err(Mutf8Error::Malformed));
    }

    #[test]
    fn rejects_lone_surrogates() {
        assert_eq!(decode(&[0xED, 0xA0, 0xBD, 0x41]), Err(Mutf8Error::Malformed));
        assert_eq!(decode(&[0xED, 0xB8, 0x80]), Err(Mutf8Error::Malformed));
    }

    #[test]
    fn lossy_replaces_bad_bytes() {
        assert_eq!(decode_lossy(&[0x61, 0xFF, 0x62]), "a\u{FFFD}b");
        assert_eq!(decode_lossy(&[0x68, 0xC3, 0xA9]), "h\u{e9}");
        assert_eq!(decode_lossy(&[0x61, 0xC0, 0x80]), "a\0");
    }
}
