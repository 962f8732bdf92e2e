//! Transport boundary
//!
//! The reader never talks to PC/SC directly. A transport owns an already
//! connected card session and exchanges one command for one response.

use thiserror::Error;

/// The transport could not deliver a response
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A connected card session
pub trait Transport {
    /// Send one command APDU and return the raw response, status word included
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// ATR presented by the card when the session was opened
    fn atr(&self) -> Vec<u8>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }

    fn atr(&self) -> Vec<u8> {
        (**self).atr()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }

    fn atr(&self) -> Vec<u8> {
        (**self).atr()
    }
}
