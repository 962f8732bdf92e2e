//! Thai ID applet command catalogue
//!
//! Every command the reader sends is a fixed byte sequence. READ commands
//! use the proprietary form `80 B0 <offset-hi> <offset-lo> 02 00 <length>`,
//! where the last byte is the declared payload length.

use std::fmt;

use serde::Serialize;

use crate::error::CardError;

/// Thai ID applet identifier
pub const THAI_ID_AID: [u8; 8] = [0xA0, 0x00, 0x00, 0x00, 0x54, 0x48, 0x00, 0x01];

/// SELECT by DF name, followed by the AID
pub const SELECT_APPLET: [u8; 13] = [
    0x00, 0xA4, 0x04, 0x00, 0x08, // SELECT, P1=04 (by name), Lc=8
    0xA0, 0x00, 0x00, 0x00, 0x54, 0x48, 0x00, 0x01, // AID
];

/// A READ command: CLA INS P1 P2 Lc 00 length
pub type ReadCommand = [u8; 7];

/// Number of photo segments on the card
pub const PHOTO_PARTS: u8 = 20;

/// Payload length requested per photo segment
pub const PHOTO_SEGMENT_LEN: u8 = 0xFF;

const PHOTO_COMMANDS: [ReadCommand; PHOTO_PARTS as usize] = [
    [0x80, 0xB0, 0x01, 0x7B, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x02, 0x7A, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x03, 0x79, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x04, 0x78, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x05, 0x77, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x06, 0x76, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x07, 0x75, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x08, 0x74, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x09, 0x73, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0A, 0x72, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0B, 0x71, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0C, 0x70, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0D, 0x6F, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0E, 0x6E, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x0F, 0x6D, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x10, 0x6C, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x11, 0x6B, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x12, 0x6A, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x13, 0x69, 0x02, 0x00, 0xFF],
    [0x80, 0xB0, 0x14, 0x68, 0x02, 0x00, 0xFF],
];

/// Data fields stored on the card, in on-card order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Cid,
    ThaiName,
    EnglishName,
    DateOfBirth,
    Gender,
    Issuer,
    IssueDate,
    ExpiryDate,
    Address,
}

impl Field {
    /// All fields in the order the card lays them out
    pub const ALL: [Field; 9] = [
        Field::Cid,
        Field::ThaiName,
        Field::EnglishName,
        Field::DateOfBirth,
        Field::Gender,
        Field::Issuer,
        Field::IssueDate,
        Field::ExpiryDate,
        Field::Address,
    ];

    /// Command, length and decoder for this field
    pub fn spec(self) -> FieldSpec {
        let (command, decoder) = match self {
            Field::Cid => ([0x80, 0xB0, 0x00, 0x04, 0x02, 0x00, 0x0D], DecoderKind::Cid),
            Field::ThaiName => ([0x80, 0xB0, 0x00, 0x11, 0x02, 0x00, 0x64], DecoderKind::Name),
            Field::EnglishName => ([0x80, 0xB0, 0x00, 0x75, 0x02, 0x00, 0x64], DecoderKind::Name),
            Field::DateOfBirth => ([0x80, 0xB0, 0x00, 0xD9, 0x02, 0x00, 0x08], DecoderKind::Date),
            Field::Gender => ([0x80, 0xB0, 0x00, 0xE1, 0x02, 0x00, 0x01], DecoderKind::Gender),
            Field::Issuer => ([0x80, 0xB0, 0x00, 0xF6, 0x02, 0x00, 0x64], DecoderKind::Text),
            Field::IssueDate => ([0x80, 0xB0, 0x01, 0x67, 0x02, 0x00, 0x08], DecoderKind::Date),
            Field::ExpiryDate => ([0x80, 0xB0, 0x01, 0x6F, 0x02, 0x00, 0x08], DecoderKind::Date),
            Field::Address => ([0x80, 0xB0, 0x15, 0x79, 0x02, 0x00, 0x64], DecoderKind::Text),
        };
        FieldSpec {
            field: self,
            command,
            length: command[6],
            decoder,
        }
    }

    /// Short machine-friendly name
    pub fn name(self) -> &'static str {
        match self {
            Field::Cid => "cid",
            Field::ThaiName => "thai_name",
            Field::EnglishName => "english_name",
            Field::DateOfBirth => "date_of_birth",
            Field::Gender => "gender",
            Field::Issuer => "issuer",
            Field::IssueDate => "issue_date",
            Field::ExpiryDate => "expiry_date",
            Field::Address => "address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a field's payload is turned into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    /// 13 ASCII digits with a mod-11 check digit
    Cid,
    /// TIS-620 text
    Text,
    /// TIS-620 text with `#`-separated name parts
    Name,
    /// Buddhist-era `YYYYMMDD`
    Date,
    /// Single ASCII digit
    Gender,
}

/// Static description of one card field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub command: ReadCommand,
    /// Declared payload length, also used as Le for GET RESPONSE
    pub length: u8,
    pub decoder: DecoderKind,
}

impl FieldSpec {
    /// File offset addressed by the command (P1-P2)
    pub fn offset(&self) -> u16 {
        u16::from_be_bytes([self.command[2], self.command[3]])
    }
}

/// Lookup of the fixed commands the reader sends
pub struct CommandCatalog;

impl CommandCatalog {
    /// SELECT for the Thai ID applet
    pub fn select_applet() -> [u8; 13] {
        SELECT_APPLET
    }

    /// READ command for a data field
    pub fn field_command(field: Field) -> ReadCommand {
        field.spec().command
    }

    /// READ command for photo segment `part` (1-based)
    pub fn photo_command(part: u8) -> Result<ReadCommand, CardError> {
        if !(1..=PHOTO_PARTS).contains(&part) {
            return Err(CardError::InvalidPhotoPart(part));
        }
        Ok(PHOTO_COMMANDS[(part - 1) as usize])
    }

    /// File offset of photo segment `part` (1-based)
    pub fn photo_offset(part: u8) -> Result<u16, CardError> {
        let command = Self::photo_command(part)?;
        Ok(u16::from_be_bytes([command[2], command[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_applet_bytes() {
        assert_eq!(
            hex::encode_upper(CommandCatalog::select_applet()),
            "00A4040008A000000054480001"
        );
        assert_eq!(&SELECT_APPLET[5..], &THAI_ID_AID);
    }

    #[test]
    fn test_field_commands() {
        let expected = [
            (Field::Cid, "80B0000402000D"),
            (Field::ThaiName, "80B00011020064"),
            (Field::EnglishName, "80B00075020064"),
            (Field::DateOfBirth, "80B000D9020008"),
            (Field::Gender, "80B000E1020001"),
            (Field::Issuer, "80B000F6020064"),
            (Field::IssueDate, "80B00167020008"),
            (Field::ExpiryDate, "80B0016F020008"),
            (Field::Address, "80B01579020064"),
        ];
        for (field, hex_cmd) in expected {
            assert_eq!(hex::encode_upper(CommandCatalog::field_command(field)), hex_cmd, "{field}");
        }
    }

    #[test]
    fn test_field_spec_lengths() {
        assert_eq!(Field::Cid.spec().length, 13);
        assert_eq!(Field::ThaiName.spec().length, 100);
        assert_eq!(Field::DateOfBirth.spec().length, 8);
        assert_eq!(Field::Gender.spec().length, 1);
        assert_eq!(Field::Address.spec().offset(), 0x1579);
        assert_eq!(Field::IssueDate.spec().decoder, DecoderKind::Date);
    }

    #[test]
    fn test_photo_commands_step_by_segment_size() {
        assert_eq!(
            CommandCatalog::photo_command(1).unwrap(),
            [0x80, 0xB0, 0x01, 0x7B, 0x02, 0x00, 0xFF]
        );
        assert_eq!(
            CommandCatalog::photo_command(20).unwrap(),
            [0x80, 0xB0, 0x14, 0x68, 0x02, 0x00, 0xFF]
        );
        for part in 1..=PHOTO_PARTS {
            let offset = CommandCatalog::photo_offset(part).unwrap();
            assert_eq!(offset, 0x017B + (part as u16 - 1) * 0xFF);
        }
    }

    #[test]
    fn test_photo_command_out_of_range() {
        assert!(matches!(
            CommandCatalog::photo_command(0),
            Err(CardError::InvalidPhotoPart(0))
        ));
        assert!(matches!(
            CommandCatalog::photo_command(21),
            Err(CardError::InvalidPhotoPart(21))
        ));
    }
}
