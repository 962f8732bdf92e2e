//! Buddhist-era date decoding
//!
//! Dates are stored as eight ASCII digits `YYYYMMDD` with the year counted
//! in the Buddhist Era (Gregorian + 543).

use chrono::NaiveDate;

use super::text::decode_ascii;
use super::DecodeError;

/// Offset between Buddhist-era and Gregorian years
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Decode a `YYYYMMDD` Buddhist-era date, with the reason on failure
pub fn parse_buddhist_date(bytes: &[u8]) -> Result<NaiveDate, DecodeError> {
    let text = decode_ascii(bytes);

    if text.len() != 8 {
        return Err(DecodeError::WrongLength {
            expected: 8,
            actual: text.len(),
        });
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::NotDigits(text));
    }

    let number = |range: std::ops::Range<usize>| -> u32 {
        text[range]
            .bytes()
            .fold(0, |acc, b| acc * 10 + (b - b'0') as u32)
    };
    let year = number(0..4) as i32 - BUDDHIST_ERA_OFFSET;
    let month = number(4..6);
    let day = number(6..8);

    NaiveDate::from_ymd_opt(year, month, day).ok_or(DecodeError::InvalidDate(text))
}

/// Decode a `YYYYMMDD` Buddhist-era date, `None` when malformed
pub fn decode_buddhist_date(bytes: &[u8]) -> Option<NaiveDate> {
    parse_buddhist_date(bytes).ok()
}
