//! Field payload decoding
//!
//! Turns the payload of one READ exchange (status bytes already stripped)
//! into a typed value. Decoding is all-or-nothing: a value is produced only
//! when the whole payload has the expected shape.
//!
//! # Example
//! ```
//! use thaiid_card::card::Field;
//! use thaiid_card::decode::{decode_field, FieldValue};
//!
//! let value = decode_field(Field::Cid, b"1101700203450").unwrap();
//! assert_eq!(value, FieldValue::Cid("1101700203450".to_string()));
//! ```

pub mod cid;
pub mod date;
pub mod text;

pub use cid::{format_cid, validate_cid};
pub use date::{decode_buddhist_date, parse_buddhist_date};
pub use text::{decode_ascii, decode_name_parts, decode_thai_text, encode_tis620};

use chrono::NaiveDate;
use thiserror::Error;

use crate::card::{DecoderKind, Field, Gender, NameParts};
use crate::error::CardError;

/// Payload does not have the shape its field expects
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("expected only digits, got {0:?}")]
    NotDigits(String),

    #[error("invalid calendar date {0:?}")]
    InvalidDate(String),
}

/// A full name together with its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub full: String,
    pub parts: NameParts,
}

/// A decoded field value, tagged with the field it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Cid(String),
    ThaiName(Name),
    EnglishName(Name),
    DateOfBirth(NaiveDate),
    Gender(Gender),
    Issuer(String),
    IssueDate(NaiveDate),
    ExpiryDate(NaiveDate),
    Address(String),
}

impl FieldValue {
    pub fn field(&self) -> Field {
        match self {
            FieldValue::Cid(_) => Field::Cid,
            FieldValue::ThaiName(_) => Field::ThaiName,
            FieldValue::EnglishName(_) => Field::EnglishName,
            FieldValue::DateOfBirth(_) => Field::DateOfBirth,
            FieldValue::Gender(_) => Field::Gender,
            FieldValue::Issuer(_) => Field::Issuer,
            FieldValue::IssueDate(_) => Field::IssueDate,
            FieldValue::ExpiryDate(_) => Field::ExpiryDate,
            FieldValue::Address(_) => Field::Address,
        }
    }
}

/// Gender from a single ASCII digit
pub fn decode_gender(bytes: &[u8]) -> Gender {
    Gender::from_code(&decode_ascii(bytes))
}

/// Citizen ID: 13 ASCII digits with a valid check digit
pub fn decode_cid(bytes: &[u8]) -> Result<String, CardError> {
    let cid = decode_ascii(bytes);
    if cid.len() != cid::CID_LEN {
        return Err(DecodeError::WrongLength {
            expected: cid::CID_LEN,
            actual: cid.len(),
        }
        .into());
    }
    if !cid.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::NotDigits(cid).into());
    }
    if !validate_cid(&cid) {
        return Err(CardError::Checksum { cid });
    }
    Ok(cid)
}

/// Full name and parts from one name payload
pub fn decode_name(bytes: &[u8]) -> Name {
    Name {
        full: decode_thai_text(bytes),
        parts: decode_name_parts(bytes),
    }
}

/// Decode a payload with the decoder registered for `field`
pub fn decode_field(field: Field, payload: &[u8]) -> Result<FieldValue, CardError> {
    let value = match (field.spec().decoder, field) {
        (DecoderKind::Cid, _) => FieldValue::Cid(decode_cid(payload)?),
        (DecoderKind::Gender, _) => FieldValue::Gender(decode_gender(payload)),
        (DecoderKind::Name, Field::EnglishName) => FieldValue::EnglishName(decode_name(payload)),
        (DecoderKind::Name, _) => FieldValue::ThaiName(decode_name(payload)),
        (DecoderKind::Date, Field::IssueDate) => FieldValue::IssueDate(parse_buddhist_date(payload)?),
        (DecoderKind::Date, Field::ExpiryDate) => FieldValue::ExpiryDate(parse_buddhist_date(payload)?),
        (DecoderKind::Date, _) => FieldValue::DateOfBirth(parse_buddhist_date(payload)?),
        (DecoderKind::Text, Field::Issuer) => FieldValue::Issuer(decode_thai_text(payload)),
        (DecoderKind::Text, _) => FieldValue::Address(decode_thai_text(payload)),
    };
    debug_assert_eq!(value.field(), field);
    Ok(value)
}
