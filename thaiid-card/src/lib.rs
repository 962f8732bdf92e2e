//! Thai national ID card reader core
//!
//! Reads the cardholder record from a Thai national ID smart card over any
//! transport that can exchange ISO 7816-4 APDUs:
//! - the fixed command catalog of the Thai ID applet
//! - status word interpretation and GET RESPONSE continuation
//! - TIS-620 text, Buddhist-era dates and the CID check digit
//! - reassembly of the 20-segment JPEG photo
//!
//! PC/SC discovery and connection stay outside the crate: wrap an open card
//! session in a [`Transport`] and hand it to [`CardReader`].
//!
//! ```
//! use std::ops::ControlFlow;
//! use thaiid_card::simulator::{CardProfile, VirtualThaiIdCard};
//! use thaiid_card::{CardReader, ReadOptions};
//!
//! let mut reader = CardReader::new(VirtualThaiIdCard::new(CardProfile::sample()));
//! let report = reader.read_card(&ReadOptions::default(), |_| ControlFlow::Continue(())).unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(report.record.english_name.as_deref(), Some("Mr. Somchai Jaidee"));
//! ```

pub mod apdu;
pub mod card;
pub mod decode;
pub mod error;
pub mod photo;
pub mod reader;
pub mod simulator;

pub use card::{CardRecord, CommandCatalog, Field, Gender, NameParts, ReaderVariant};
pub use decode::FieldValue;
pub use error::{CardError, ReadError};
pub use photo::PhotoAssembler;
pub use reader::{
    CardReadReport, CardReader, PhotoProgress, ReadOptions, SessionState, Transport,
    TransportError,
};
