//! ASCII and TIS-620 text decoding
//!
//! Text fields are fixed-width and padded. The card uses `#` as a filler and
//! as the separator between name parts.

use crate::card::NameParts;

/// Card filler / name separator
pub const FILLER: u8 = b'#';

/// First byte of the TIS-620 Thai range
const TIS620_BASE: u8 = 0xA0;

/// Start of the Unicode Thai block
const THAI_BLOCK: u32 = 0x0E00;

/// Map one byte to a character, keeping `#` as is
fn tis620_char(byte: u8) -> Option<char> {
    match byte {
        0x00..=0x7F => Some(byte as char),
        TIS620_BASE..=0xFF => char::from_u32(THAI_BLOCK + (byte - TIS620_BASE) as u32),
        _ => None,
    }
}

/// Join whitespace-separated words with single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep printable ASCII (0x20-0x7E) and trim
pub fn decode_ascii(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| b as char)
        .collect();
    text.trim().to_string()
}

/// Decode TIS-620 text
///
/// `#` becomes a space, bytes below 0x80 pass through, 0xA0-0xFF map into
/// the Thai block. Whitespace runs are collapsed and the result trimmed.
pub fn decode_thai_text(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter_map(|&b| if b == FILLER { Some(' ') } else { tis620_char(b) })
        .collect();
    collapse_whitespace(&text)
}

/// Split a `prefix#first#middle#last` name field
///
/// Missing trailing parts are left empty; an empty middle name is `None`.
pub fn decode_name_parts(bytes: &[u8]) -> NameParts {
    let text: String = bytes.iter().filter_map(|&b| tis620_char(b)).collect();
    let mut parts = text.split(FILLER as char).map(collapse_whitespace);

    let prefix = parts.next().unwrap_or_default();
    let first = parts.next().unwrap_or_default();
    let middle = parts.next().filter(|m| !m.is_empty());
    // Anything after the fourth separator belongs to the last name
    let last = collapse_whitespace(&parts.collect::<Vec<_>>().join(" "));

    NameParts {
        prefix,
        first,
        middle,
        last,
    }
}

/// Encode text back into TIS-620 bytes
///
/// Characters outside ASCII and the Thai block are skipped.
pub fn encode_tis620(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| {
            let cp = c as u32;
            if cp < 0x80 {
                Some(cp as u8)
            } else if (THAI_BLOCK..THAI_BLOCK + 0x60).contains(&cp) {
                Some((cp - THAI_BLOCK) as u8 + TIS620_BASE)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_drops_unprintable() {
        assert_eq!(decode_ascii(b"  1101700203450  "), "1101700203450");
        assert_eq!(decode_ascii(&[0x00, 0x31, 0x0A, 0x32, 0xFF, 0x7F]), "12");
        assert_eq!(decode_ascii(&[]), "");
    }

    #[test]
    fn test_thai_single_byte() {
        assert_eq!(decode_thai_text(&[0xA1]), "\u{0E01}");
        assert_eq!(decode_thai_text(&[0xA1]), "ก");
    }

    #[test]
    fn test_thai_filler_is_space() {
        assert_eq!(decode_thai_text(&[0xA1, 0x23, 0xA2]), "ก ข");
        assert_eq!(decode_thai_text(&[0x23]), "");
        assert_eq!(decode_thai_text(&[0x41, 0x23, 0x42]), "A B");
    }

    #[test]
    fn test_thai_collapses_padding() {
        let mut raw = encode_tis620("นาย#สมชาย##ใจดี");
        raw.extend_from_slice(&[0x20; 40]);
        assert_eq!(decode_thai_text(&raw), "นาย สมชาย ใจดี");
    }

    #[test]
    fn test_thai_drops_c1_range() {
        assert_eq!(decode_thai_text(&[0x41, 0x85, 0x9F, 0x42]), "AB");
    }

    #[test]
    fn test_encode_roundtrip_thai() {
        let text = "กรุงเทพมหานคร";
        assert_eq!(decode_thai_text(&encode_tis620(text)), text);
    }

    #[test]
    fn test_name_parts_four_fields() {
        let raw = encode_tis620("Mr.#Somchai#Dee#Jaidee                ");
        let parts = decode_name_parts(&raw);
        assert_eq!(parts.prefix, "Mr.");
        assert_eq!(parts.first, "Somchai");
        assert_eq!(parts.middle.as_deref(), Some("Dee"));
        assert_eq!(parts.last, "Jaidee");
    }

    #[test]
    fn test_name_parts_empty_middle() {
        let parts = decode_name_parts(&encode_tis620("นาง#สมศรี##ใจดี   "));
        assert_eq!(parts.prefix, "นาง");
        assert_eq!(parts.first, "สมศรี");
        assert_eq!(parts.middle, None);
        assert_eq!(parts.last, "ใจดี");
    }

    #[test]
    fn test_name_parts_missing_fields() {
        let parts = decode_name_parts(b"Ms.#Jane");
        assert_eq!(parts.first, "Jane");
        assert_eq!(parts.middle, None);
        assert_eq!(parts.last, "");
    }
}
