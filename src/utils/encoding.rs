// Text decoding for length-prefixed strings

use encoding_rs::{mem, UTF_8};
use serde::{Deserialize, Serialize};

/// Character encoding applied to comment and picture text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// UTF-8, invalid sequences replaced with U+FFFD
    #[default]
    Utf8,
    /// ISO-8859-1: each byte is the code point of the same value
    Latin1,
}

/// Decode text with the specified encoding into an owned string.
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Utf8 => UTF_8.decode_without_bom_handling(data).0.into_owned(),
        TextEncoding::Latin1 => mem::decode_latin1(data).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_lossy() {
        assert_eq!(decode_text(b"reference", TextEncoding::Utf8), "reference");
        assert_eq!(decode_text(&[0x41, 0xFF, 0x42], TextEncoding::Utf8), "A\u{FFFD}B");
    }

    #[test]
    fn latin1_maps_every_byte() {
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9], TextEncoding::Latin1), "café");
        assert_eq!(decode_text(&[0xC3, 0xA9], TextEncoding::Latin1), "Ã©");
    }

    #[test]
    fn latin1_keeps_c1_controls() {
        let bytes = [0x80, 0x93, 0x9F];
        let expected: String = bytes.iter().map(|&b| char::from(b)).collect();
        assert_eq!(decode_text(&bytes, TextEncoding::Latin1), expected);
        assert_eq!(decode_text(&bytes, TextEncoding::Latin1), "\u{80}\u{93}\u{9f}");
    }
}
