//! Error types
//!
//! `CardError` covers a single exchange or decode. `ReadError` is what the
//! reader hands back to callers and always names the field or photo segment
//! that failed.

use thiserror::Error;

use crate::apdu::{APDUError, Status};
use crate::card::Field;
use crate::decode::DecodeError;
use crate::reader::{SessionState, TransportError};

/// Failure of one command exchange or one payload decode
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed response: {0}")]
    MalformedResponse(#[from] APDUError),

    #[error("card returned status {sw:04X}: {status}")]
    ProtocolStatus { sw: u16, status: Status },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("citizen ID {cid} fails the check digit")]
    Checksum { cid: String },

    #[error("photo incomplete: {0}")]
    PhotoIncomplete(String),

    #[error("photo part {0} is out of range 1..=20")]
    InvalidPhotoPart(u8),
}

impl CardError {
    /// Error for a non-success status word
    pub fn status(sw: u16) -> Self {
        CardError::ProtocolStatus {
            sw,
            status: Status::from_sw(sw),
        }
    }

    /// Raw status word, when the card produced one
    pub fn sw(&self) -> Option<u16> {
        match self {
            CardError::ProtocolStatus { sw, .. } => Some(*sw),
            _ => None,
        }
    }
}

/// Failure reported by the card reader
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("applet selection failed: {0}")]
    AppletSelectFailed(#[source] Box<CardError>),

    #[error("reading {field} failed: {cause}")]
    FieldReadFailed {
        field: Field,
        #[source]
        cause: Box<CardError>,
    },

    #[error("reading photo part {part} failed: {cause}")]
    PhotoReadFailed {
        part: u8,
        #[source]
        cause: Box<CardError>,
    },

    #[error("photo read cancelled after part {after_part}")]
    PhotoCancelled { after_part: u8 },

    #[error("card session not ready (state: {0})")]
    NotReady(SessionState),
}

impl ReadError {
    pub(crate) fn field(field: Field, cause: CardError) -> Self {
        ReadError::FieldReadFailed {
            field,
            cause: Box::new(cause),
        }
    }

    pub(crate) fn photo(part: u8, cause: CardError) -> Self {
        ReadError::PhotoReadFailed {
            part,
            cause: Box::new(cause),
        }
    }

    /// The underlying exchange or decode failure, if any
    pub fn cause(&self) -> Option<&CardError> {
        match self {
            ReadError::AppletSelectFailed(cause)
            | ReadError::FieldReadFailed { cause, .. }
            | ReadError::PhotoReadFailed { cause, .. } => Some(cause),
            ReadError::PhotoCancelled { .. } | ReadError::NotReady(_) => None,
        }
    }
}
