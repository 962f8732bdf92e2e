//! ATR (Answer To Reset) handling
//!
//! The ATR is only consulted to pick the GET RESPONSE variant the reader
//! firmware accepts. It is read once per session and never stored.

use std::fmt;

/// ATR prefix of readers that need GET RESPONSE with P2 = 0x01
pub const ALTERNATE_ATR_PREFIX: [u8; 2] = [0x3B, 0x67];

/// ATR with T0 = 0x67 (TB1, TC1, seven historical bytes)
pub const ALTERNATE_ATR: &[u8] = &[
    0x3B, // TS: Direct convention
    0x67, // T0: TB1 and TC1 present, 7 historical bytes
    0x00, // TB1
    0x00, // TC1
    0x73, 0x20, 0x00, 0x6C, 0x68, // Historical bytes
    0x90, 0x00, // Status indicator
];

/// Continuation command variant selected from the session ATR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReaderVariant {
    /// GET RESPONSE `00 C0 00 00`
    #[default]
    Standard,
    /// GET RESPONSE `00 C0 00 01`, for ATRs beginning `3B 67`
    Alternate,
}

impl ReaderVariant {
    /// Derive the variant from the first two ATR bytes
    pub fn from_atr(atr: &[u8]) -> Self {
        if atr.starts_with(&ALTERNATE_ATR_PREFIX) {
            ReaderVariant::Alternate
        } else {
            ReaderVariant::Standard
        }
    }

    /// The 4-byte GET RESPONSE header
    pub fn continuation_command(&self) -> [u8; 4] {
        match self {
            ReaderVariant::Standard => [0x00, 0xC0, 0x00, 0x00],
            ReaderVariant::Alternate => [0x00, 0xC0, 0x00, 0x01],
        }
    }
}

impl fmt::Display for ReaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderVariant::Standard => f.write_str("standard"),
            ReaderVariant::Alternate => f.write_str("alternate (3B67)"),
        }
    }
}

/// Build a T=1 ATR with the given historical bytes
pub fn build_atr(historical_bytes: &[u8]) -> Vec<u8> {
    let mut atr = Vec::with_capacity(32);

    // TS - Initial character (direct convention)
    atr.push(0x3B);

    // T0 - TD1 present, K historical bytes (max 15)
    let hist_len = historical_bytes.len().min(15) as u8;
    atr.push(0x80 | hist_len);

    // TD1 - T=1, no more interface bytes
    atr.push(0x01);

    atr.extend_from_slice(&historical_bytes[..hist_len as usize]);

    // TCK - XOR of all bytes from T0 to the last historical byte
    let tck: u8 = atr[1..].iter().fold(0u8, |acc, &b| acc ^ b);
    atr.push(tck);

    atr
}

/// ATR of a card that uses the standard GET RESPONSE
pub fn standard_atr() -> Vec<u8> {
    build_atr(&[0x00, 0x73, 0xC8, 0x40, 0x12, 0x00, 0x90, 0x00])
}
