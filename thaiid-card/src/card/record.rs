//! Decoded card record
//!
//! A `CardRecord` starts empty when the applet is selected and gains one
//! field per successful read. Failed reads never touch it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::decode::cid::format_cid;
use crate::decode::FieldValue;

/// Serialize optional photo bytes as base64
mod base64_photo {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::Serializer;

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }
}

/// Cardholder gender as coded on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Map the card's single-digit code
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Gender::Male,
            "2" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_english(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }

    pub fn as_thai(&self) -> &'static str {
        match self {
            Gender::Male => "ชาย",
            Gender::Female => "หญิง",
            Gender::Unknown => "ไม่ระบุ",
        }
    }
}

/// Name split on the card's `#` separators: prefix, first, middle, last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameParts {
    pub prefix: String,
    pub first: String,
    pub middle: Option<String>,
    pub last: String,
}

/// Structured data read from one card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardRecord {
    pub cid: Option<String>,
    pub thai_name: Option<String>,
    pub thai_name_parts: Option<NameParts>,
    pub english_name: Option<String>,
    pub english_name_parts: Option<NameParts>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub issuer: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(with = "base64_photo")]
    pub photo: Option<Vec<u8>>,
}

impl CardRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded value in its field
    pub fn store(&mut self, value: FieldValue) {
        match value {
            FieldValue::Cid(cid) => self.cid = Some(cid),
            FieldValue::ThaiName(name) => {
                self.thai_name = Some(name.full);
                self.thai_name_parts = Some(name.parts);
            }
            FieldValue::EnglishName(name) => {
                self.english_name = Some(name.full);
                self.english_name_parts = Some(name.parts);
            }
            FieldValue::DateOfBirth(date) => self.date_of_birth = Some(date),
            FieldValue::Gender(gender) => self.gender = Some(gender),
            FieldValue::Issuer(issuer) => self.issuer = Some(issuer),
            FieldValue::IssueDate(date) => self.issue_date = Some(date),
            FieldValue::ExpiryDate(date) => self.expiry_date = Some(date),
            FieldValue::Address(address) => self.address = Some(address),
        }
    }

    /// True when nothing has been read yet
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Citizen ID grouped as `X-XXXX-XXXXX-XX-X`
    pub fn formatted_cid(&self) -> Option<String> {
        self.cid.as_deref().map(format_cid)
    }

    /// Age in completed years on the given day
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut years = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Whether the card has expired as of the given day
    pub fn is_expired_on(&self, today: NaiveDate) -> Option<bool> {
        self.expiry_date.map(|expiry| today > expiry)
    }

    /// Days from `today` until expiry, negative once expired
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date
            .map(|expiry| expiry.signed_duration_since(today).num_days())
    }

    /// Photo as a `data:image/jpeg;base64,` URL
    pub fn photo_data_url(&self) -> Option<String> {
        self.photo
            .as_ref()
            .map(|photo| format!("data:image/jpeg;base64,{}", STANDARD.encode(photo)))
    }
}
