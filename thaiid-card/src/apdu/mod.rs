//! APDU (Application Protocol Data Unit) handling
//!
//! Command building and response splitting for the short-form ISO 7816-4
//! APDUs spoken by the Thai ID card. Commands leave the reader as fixed
//! byte buffers; responses come back as payload plus a trailing status word.
//!
//! # Example
//! ```
//! use thaiid_card::apdu::{parse_apdu, Response, Status};
//!
//! // Parse a READ BINARY command for the citizen ID
//! let apdu = parse_apdu(&[0x80, 0xB0, 0x00, 0x04, 0x02, 0x00, 0x0D]).unwrap();
//! assert_eq!(apdu.p1p2(), 0x0004);
//! assert_eq!(apdu.data, vec![0x00, 0x0D]);
//!
//! // Split a card response
//! let response = Response::from_bytes(&[0x61, 0x0D]).unwrap();
//! assert_eq!(response.status(), Status::SuccessMore(13));
//! ```

mod response;
mod status;

pub use response::Response;
pub use status::{continuation_command, get_response, interpret, Status, SW};

use thiserror::Error;

/// Errors that can occur while parsing raw APDU bytes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum APDUError {
    #[error("APDU too short: expected at least 4 bytes, got {0}")]
    TooShort(usize),

    #[error("Invalid APDU length")]
    InvalidLength,

    #[error("Response too short: expected at least 2 status bytes, got {0}")]
    ResponseTooShort(usize),
}

/// A parsed short-form APDU command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data (may be empty)
    pub data: Vec<u8>,
    /// Expected response length (Le), None if not specified
    pub le: Option<u16>,
}

impl APDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Create a new APDU with data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
            le: None,
        }
    }

    /// Get P1-P2 combined as a u16 (the file offset for READ BINARY)
    pub fn p1p2(&self) -> u16 {
        ((self.p1 as u16) << 8) | (self.p2 as u16)
    }

    /// Encode to raw short-form bytes
    ///
    /// Le of 256 is encoded as 0x00.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(6 + self.data.len());
        out.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);
        if !self.data.is_empty() {
            out.push(self.data.len() as u8);
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            out.push(if le >= 256 { 0 } else { le as u8 });
        }
        out
    }
}

/// Parse raw bytes into a short-form APDU
///
/// - Case 1: CLA INS P1 P2
/// - Case 2: CLA INS P1 P2 Le
/// - Case 3: CLA INS P1 P2 Lc Data
/// - Case 4: CLA INS P1 P2 Lc Data Le
pub fn parse_apdu(data: &[u8]) -> Result<APDU, APDUError> {
    if data.len() < 4 {
        return Err(APDUError::TooShort(data.len()));
    }

    let (cla, ins, p1, p2) = (data[0], data[1], data[2], data[3]);
    let remaining = &data[4..];

    if remaining.is_empty() {
        return Ok(APDU::new(cla, ins, p1, p2));
    }

    let first_byte = remaining[0];

    // Le only; Le=0 means 256
    if remaining.len() == 1 {
        let le = if first_byte == 0 { 256 } else { first_byte as u16 };
        return Ok(APDU {
            le: Some(le),
            ..APDU::new(cla, ins, p1, p2)
        });
    }

    let lc = first_byte as usize;

    if remaining.len() == 1 + lc {
        return Ok(APDU::with_data(cla, ins, p1, p2, remaining[1..].to_vec()));
    }

    if remaining.len() == 2 + lc {
        let le_byte = remaining[1 + lc];
        let le = if le_byte == 0 { 256 } else { le_byte as u16 };
        return Ok(APDU {
            le: Some(le),
            ..APDU::with_data(cla, ins, p1, p2, remaining[1..1 + lc].to_vec())
        });
    }

    Err(APDUError::InvalidLength)
}

/// Instruction bytes used by the Thai ID applet
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const READ_BINARY: u8 = 0xB0;
    pub const GET_RESPONSE: u8 = 0xC0;
}

/// Class bytes
pub mod cla {
    /// Interindustry class (SELECT, GET RESPONSE)
    pub const ISO: u8 = 0x00;
    /// Proprietary class used by the Thai ID applet for reads
    pub const PROPRIETARY: u8 = 0x80;
}
