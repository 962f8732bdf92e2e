//! Status Word (SW) handling for card responses
//!
//! Every response ends in SW1 SW2. The word decides control flow: whether the
//! payload is complete, whether more bytes wait behind a GET RESPONSE, or
//! which error the card reported. It is never application data.

use std::fmt;

use super::response::Response;
use super::{ins, APDUError};
use crate::card::atr::ReaderVariant;

/// Status Word constants seen on the Thai ID applet
pub struct SW;

impl SW {
    pub const SUCCESS: u16 = 0x9000;
    pub const WRONG_LENGTH: u16 = 0x6700;
    pub const CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
    pub const COMMAND_NOT_ALLOWED_NO_EF: u16 = 0x6986;
    pub const FILE_NOT_FOUND: u16 = 0x6A82;
    pub const INCORRECT_P1_P2: u16 = 0x6A86;
    pub const INS_NOT_SUPPORTED: u16 = 0x6D00;
    pub const CLA_NOT_SUPPORTED: u16 = 0x6E00;

    /// Create a "more data available" status word (61xx)
    #[inline]
    pub fn bytes_remaining(remaining: u8) -> u16 {
        0x6100 | (remaining as u16)
    }

    /// Create a "wrong Le" status word (6Cxx)
    #[inline]
    pub fn wrong_le(correct_le: u8) -> u16 {
        0x6C00 | (correct_le as u16)
    }
}

/// Classification of a status word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 9000: the payload is complete
    Success,
    /// 61XX: XX further bytes are retrievable with GET RESPONSE
    SuccessMore(u8),
    /// 6CXX: wrong Le, XX is the length the card expects
    WrongLength(u8),
    /// 6986: command not allowed (no current EF)
    NotAllowed,
    /// 6A86: incorrect P1/P2
    WrongParameters,
    /// 6A82: file or application not found
    NotFound,
    /// Anything else, with the raw word
    Unknown(u16),
}

impl Status {
    /// Classify a combined SW1SW2 word
    pub fn from_sw(sw: u16) -> Self {
        match sw {
            SW::SUCCESS => Status::Success,
            SW::COMMAND_NOT_ALLOWED_NO_EF => Status::NotAllowed,
            SW::INCORRECT_P1_P2 => Status::WrongParameters,
            SW::FILE_NOT_FOUND => Status::NotFound,
            _ => match (sw >> 8) as u8 {
                0x61 => Status::SuccessMore(sw as u8),
                0x6C => Status::WrongLength(sw as u8),
                _ => Status::Unknown(sw),
            },
        }
    }

    /// Success or SuccessMore
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success | Status::SuccessMore(_))
    }

    /// Number of bytes waiting behind GET RESPONSE, if any
    pub fn available_response(&self) -> Option<u8> {
        match self {
            Status::SuccessMore(n) => Some(*n),
            _ => None,
        }
    }

    /// Human-readable classification
    pub fn description(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::SuccessMore(_) => "success, more data available",
            Status::WrongLength(_) => "wrong length",
            Status::NotAllowed => "command not allowed",
            Status::WrongParameters => "wrong parameters P1-P2",
            Status::NotFound => "file or application not found",
            Status::Unknown(_) => "unknown status",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::SuccessMore(n) => write!(f, "{} ({} bytes)", self.description(), n),
            Status::WrongLength(n) => write!(f, "{} (expected {})", self.description(), n),
            _ => f.write_str(self.description()),
        }
    }
}

/// Split a raw response and classify its status word
pub fn interpret(raw: &[u8]) -> Result<(Response, Status), APDUError> {
    let response = Response::from_bytes(raw)?;
    let status = response.status();
    Ok((response, status))
}

/// The 4-byte GET RESPONSE header for a session with the given ATR
///
/// Readers presenting an ATR that begins `3B 67` only hand out pending bytes
/// when P2 is 0x01; every other reader uses P2 0x00.
pub fn continuation_command(atr: &[u8]) -> [u8; 4] {
    ReaderVariant::from_atr(atr).continuation_command()
}

/// Complete GET RESPONSE APDU: the variant's header followed by Le
pub fn get_response(variant: ReaderVariant, le: u8) -> [u8; 5] {
    let [cla, ins_byte, p1, p2] = variant.continuation_command();
    debug_assert_eq!(ins_byte, ins::GET_RESPONSE);
    [cla, ins_byte, p1, p2, le]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success() {
        assert_eq!(Status::from_sw(0x9000), Status::Success);
        assert!(Status::Success.is_success());
    }

    #[test]
    fn test_classify_more_data() {
        assert_eq!(Status::from_sw(0x610A), Status::SuccessMore(10));
        assert_eq!(Status::from_sw(SW::bytes_remaining(0xFF)), Status::SuccessMore(255));
        assert!(Status::SuccessMore(1).is_success());
        assert_eq!(Status::SuccessMore(8).available_response(), Some(8));
        assert_eq!(Status::Success.available_response(), None);
    }

    #[test]
    fn test_classify_errors() {
        assert_eq!(Status::from_sw(0x6A82), Status::NotFound);
        assert_eq!(Status::from_sw(0x6986), Status::NotAllowed);
        assert_eq!(Status::from_sw(0x6A86), Status::WrongParameters);
        assert_eq!(Status::from_sw(SW::wrong_le(0x0D)), Status::WrongLength(0x0D));
        assert_eq!(Status::from_sw(0x6700), Status::Unknown(0x6700));
        assert!(!Status::NotFound.is_success());
        assert!(!Status::Unknown(0x6F00).is_success());
    }

    #[test]
    fn test_interpret_splits_payload() {
        let (response, status) = interpret(&[0x31, 0x32, 0x90, 0x00]).unwrap();
        assert_eq!(status, Status::Success);
        assert_eq!(response.data, b"12".to_vec());

        assert_eq!(interpret(&[0x90]), Err(APDUError::ResponseTooShort(1)));
    }

    #[test]
    fn test_continuation_command_variants() {
        let alternate = [0x3B, 0x67, 0x00, 0x00, 0x73, 0x20, 0x00, 0x6C, 0x68, 0x90, 0x00];
        assert_eq!(continuation_command(&alternate), [0x00, 0xC0, 0x00, 0x01]);

        let standard = [0x3B, 0x68, 0x00, 0x00, 0x00, 0x73, 0xC8, 0x40, 0x12, 0x00, 0x90, 0x00];
        assert_eq!(continuation_command(&standard), [0x00, 0xC0, 0x00, 0x00]);
        assert_eq!(continuation_command(&[]), [0x00, 0xC0, 0x00, 0x00]);
        assert_eq!(continuation_command(&[0x3B]), [0x00, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn test_get_response_appends_le() {
        assert_eq!(
            get_response(ReaderVariant::Alternate, 0x0D),
            [0x00, 0xC0, 0x00, 0x01, 0x0D]
        );
        assert_eq!(
            get_response(ReaderVariant::Standard, 0xFF),
            [0x00, 0xC0, 0x00, 0x00, 0xFF]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::SuccessMore(8).to_string(), "success, more data available (8 bytes)");
        assert_eq!(Status::NotFound.to_string(), "file or application not found");
    }
}
