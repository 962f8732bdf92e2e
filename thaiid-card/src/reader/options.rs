//! Read options
//!
//! What a full card read covers. Defaults read every field and the photo;
//! `THAIID_INCLUDE_PHOTO` can switch the photo off without code changes.

use log::warn;

use crate::card::Field;

/// Environment variable controlling the photo read
pub const INCLUDE_PHOTO_ENV: &str = "THAIID_INCLUDE_PHOTO";

/// Options for [`CardReader::read_card`](super::CardReader::read_card)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fields to read, in this order
    pub fields: Vec<Field>,
    /// Whether to read the 20 photo segments
    pub include_photo: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            fields: Field::ALL.to_vec(),
            include_photo: true,
        }
    }
}

impl ReadOptions {
    /// Defaults, with the photo setting taken from the environment
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(value) = std::env::var(INCLUDE_PHOTO_ENV) {
            match parse_flag(&value) {
                Some(flag) => options.include_photo = flag,
                None => warn!("Ignoring {}={:?}: expected a boolean", INCLUDE_PHOTO_ENV, value),
            }
        }
        options
    }

    /// Text fields only, no photo
    pub fn without_photo() -> Self {
        Self::default().include_photo(false)
    }

    pub fn include_photo(mut self, include: bool) -> Self {
        self.include_photo = include;
        self
    }

    /// Restrict the read to the given fields; duplicates are dropped
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.clear();
        for field in fields {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
