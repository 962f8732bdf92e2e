//! Card read session
//!
//! `CardReader` drives one connected card through applet selection, field
//! reads and the segmented photo read. It owns the whole session state: the
//! ATR-derived reader variant, the current state and the record built so far.
//! Every exchange takes `&mut self`, so a session can never have two commands
//! in flight.
//!
//! ```text
//! Idle -> AppletSelecting -> Ready <-> ReadingField / ReadingPhoto
//!   ^                          |
//!   +------- disconnect -------+
//! ```
//!
//! # Example
//! ```
//! use std::ops::ControlFlow;
//! use thaiid_card::card::Field;
//! use thaiid_card::reader::CardReader;
//! use thaiid_card::simulator::{CardProfile, VirtualThaiIdCard};
//!
//! let card = VirtualThaiIdCard::new(CardProfile::sample());
//! let mut reader = CardReader::new(card);
//!
//! reader.select_applet().unwrap();
//! reader.read_field(Field::Cid).unwrap();
//! reader.read_photo(|_| ControlFlow::Continue(())).unwrap();
//!
//! assert_eq!(reader.record().formatted_cid().as_deref(), Some("1-1017-00203-45-0"));
//! assert!(reader.record().photo.is_some());
//! ```

pub mod options;
pub mod transport;

pub use options::ReadOptions;
pub use transport::{Transport, TransportError};

use std::fmt;
use std::ops::ControlFlow;

use log::{debug, info, warn};

use crate::apdu::{get_response, interpret, Status};
use crate::card::commands::PHOTO_SEGMENT_LEN;
use crate::card::{CardRecord, CommandCatalog, Field, ReaderVariant, PHOTO_PARTS};
use crate::decode::{decode_field, FieldValue};
use crate::error::{CardError, ReadError};
use crate::photo::PhotoAssembler;

/// Where a read session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No applet selected; only selection is possible
    Idle,
    /// SELECT in flight
    AppletSelecting,
    /// Applet selected, ready for field or photo reads
    Ready,
    /// Exchange for one field in flight
    ReadingField(Field),
    /// Exchange for one photo segment in flight
    ReadingPhoto(u8),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::AppletSelecting => f.write_str("selecting applet"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::ReadingField(field) => write!(f, "reading {}", field),
            SessionState::ReadingPhoto(part) => write!(f, "reading photo part {}", part),
        }
    }
}

/// Photo progress, reported after each segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoProgress {
    /// Segment just read (1-based)
    pub part: u8,
    pub total: u8,
}

impl PhotoProgress {
    pub fn percent(&self) -> u8 {
        ((self.part as u16 * 100) / self.total as u16) as u8
    }
}

/// Result of a full card read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReadReport {
    /// Everything that was read successfully
    pub record: CardRecord,
    /// Field-local and photo failures, in the order they happened
    pub failures: Vec<ReadError>,
}

impl CardReadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One read session over a connected card
pub struct CardReader<T: Transport> {
    transport: T,
    atr: Vec<u8>,
    variant: ReaderVariant,
    state: SessionState,
    record: CardRecord,
}

impl<T: Transport> CardReader<T> {
    /// Start a session; the ATR is read once here
    pub fn new(transport: T) -> Self {
        let atr = transport.atr();
        let variant = ReaderVariant::from_atr(&atr);
        info!(
            "Card session opened, ATR {}, {} GET RESPONSE",
            hex::encode_upper(&atr),
            variant
        );
        Self {
            transport,
            atr,
            variant,
            state: SessionState::Idle,
            record: CardRecord::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn variant(&self) -> ReaderVariant {
        self.variant
    }

    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    /// Fields read so far in this session
    pub fn record(&self) -> &CardRecord {
        &self.record
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Select the Thai ID applet and start an empty record
    ///
    /// Selecting again from `Ready` starts over with an empty record.
    pub fn select_applet(&mut self) -> Result<(), ReadError> {
        self.state = SessionState::AppletSelecting;

        let result = self
            .transmit(&CommandCatalog::select_applet())
            .and_then(|raw| {
                let (response, status) = interpret(&raw)?;
                if status.is_success() {
                    Ok(())
                } else {
                    Err(CardError::status(response.sw()))
                }
            });

        match result {
            Ok(()) => {
                self.record = CardRecord::new();
                self.state = SessionState::Ready;
                info!("Thai ID applet selected");
                Ok(())
            }
            Err(cause) => {
                self.state = SessionState::Idle;
                warn!("Thai ID applet selection failed: {}", cause);
                Err(ReadError::AppletSelectFailed(Box::new(cause)))
            }
        }
    }

    /// Read and decode one field
    ///
    /// On success the value is stored on the record and returned. On failure
    /// the record is untouched and the session stays `Ready`.
    pub fn read_field(&mut self, field: Field) -> Result<FieldValue, ReadError> {
        self.ensure_ready()?;
        self.state = SessionState::ReadingField(field);

        let spec = field.spec();
        let result = self
            .exchange(&spec.command, spec.length)
            .and_then(|payload| decode_field(field, &payload));

        self.state = SessionState::Ready;
        match result {
            Ok(value) => {
                debug!("Read {}: {:?}", field, value);
                self.record.store(value.clone());
                Ok(value)
            }
            Err(cause) => {
                warn!("Failed to read {}: {}", field, cause);
                Err(ReadError::field(field, cause))
            }
        }
    }

    /// Read the 20 photo segments in order and store the assembled JPEG
    ///
    /// `progress` is called after every segment; returning
    /// `ControlFlow::Break` stops before the next segment is requested. Any
    /// failure or cancellation discards the segments read so far.
    pub fn read_photo<F>(&mut self, mut progress: F) -> Result<&[u8], ReadError>
    where
        F: FnMut(PhotoProgress) -> ControlFlow<()>,
    {
        self.ensure_ready()?;
        let mut assembler = PhotoAssembler::new();

        for part in 1..=PHOTO_PARTS {
            self.state = SessionState::ReadingPhoto(part);

            let result = CommandCatalog::photo_command(part)
                .and_then(|command| self.exchange(&command, PHOTO_SEGMENT_LEN))
                .and_then(|segment| assembler.push(segment));

            if let Err(cause) = result {
                self.state = SessionState::Ready;
                warn!("Photo read aborted at part {}: {}", part, cause);
                return Err(ReadError::photo(part, cause));
            }

            let flow = progress(PhotoProgress {
                part,
                total: PHOTO_PARTS,
            });
            if flow.is_break() && part < PHOTO_PARTS {
                self.state = SessionState::Ready;
                info!("Photo read cancelled after part {}", part);
                return Err(ReadError::PhotoCancelled { after_part: part });
            }
        }

        self.state = SessionState::Ready;
        let photo = assembler
            .finish()
            .map_err(|cause| ReadError::photo(PHOTO_PARTS, cause))?;
        info!("Photo read complete, {} bytes", photo.len());
        Ok(self.record.photo.insert(photo).as_slice())
    }

    /// Read every configured field, then the photo if requested
    ///
    /// Selects the applet first when the session is `Idle`. A selection
    /// failure aborts the read; field and photo failures are collected in the
    /// report and the remaining reads go ahead.
    pub fn read_card<F>(
        &mut self,
        options: &ReadOptions,
        progress: F,
    ) -> Result<CardReadReport, ReadError>
    where
        F: FnMut(PhotoProgress) -> ControlFlow<()>,
    {
        if self.state == SessionState::Idle {
            self.select_applet()?;
        }

        let mut failures = Vec::new();
        for &field in &options.fields {
            if let Err(err) = self.read_field(field) {
                failures.push(err);
            }
        }
        if options.include_photo {
            if let Err(err) = self.read_photo(progress) {
                failures.push(err);
            }
        }

        info!(
            "Card read finished, {} of {} reads failed",
            failures.len(),
            options.fields.len() + usize::from(options.include_photo)
        );
        Ok(CardReadReport {
            record: self.record.clone(),
            failures,
        })
    }

    /// End the session: back to `Idle`, record discarded
    pub fn disconnect(&mut self) {
        self.state = SessionState::Idle;
        self.record = CardRecord::new();
        info!("Card session disconnected");
    }

    /// Disconnect and hand the transport back to the caller
    pub fn into_transport(mut self) -> T {
        self.disconnect();
        self.transport
    }

    fn ensure_ready(&self) -> Result<(), ReadError> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(ReadError::NotReady(self.state))
        }
    }

    /// One full exchange: the command, plus GET RESPONSE when the card
    /// reports pending bytes. Returns the payload without status bytes.
    fn exchange(&mut self, command: &[u8], le: u8) -> Result<Vec<u8>, CardError> {
        let raw = self.transmit(command)?;
        let (response, status) = interpret(&raw)?;

        match status {
            Status::Success => Ok(response.data),
            Status::SuccessMore(available) => {
                debug!("{} bytes pending, sending GET RESPONSE", available);
                let raw = self.transmit(&get_response(self.variant, le))?;
                let (response, status) = interpret(&raw)?;
                if status.is_success() {
                    Ok(response.data)
                } else {
                    Err(CardError::status(response.sw()))
                }
            }
            _ => Err(CardError::status(response.sw())),
        }
    }

    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, CardError> {
        debug!("APDU > {}", hex::encode_upper(command));
        let raw = self.transport.transmit(command)?;
        debug!("APDU < {} bytes, SW {}", raw.len(), hex::encode_upper(&raw[raw.len().saturating_sub(2)..]));
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::atr::ALTERNATE_ATR;
    use std::collections::VecDeque;

    /// Replays canned responses and records every command
    struct ScriptedTransport {
        atr: Vec<u8>,
        responses: VecDeque<Result<Vec<u8>, TransportError>>,
        sent: Vec<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(atr: &[u8], responses: Vec<Result<Vec<u8>, TransportError>>) -> Self {
            Self {
                atr: atr.to_vec(),
                responses: responses.into(),
                sent: Vec::new(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
            self.sent.push(command.to_vec());
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::new("script exhausted")))
        }

        fn atr(&self) -> Vec<u8> {
            self.atr.clone()
        }
    }

    fn ok(data: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut raw = data.to_vec();
        raw.extend_from_slice(&[0x90, 0x00]);
        Ok(raw)
    }

    fn sw(word: u16) -> Result<Vec<u8>, TransportError> {
        Ok(word.to_be_bytes().to_vec())
    }

    #[test]
    fn test_starts_idle() {
        let reader = CardReader::new(ScriptedTransport::new(&[0x3B, 0x68], vec![]));
        assert_eq!(reader.state(), SessionState::Idle);
        assert_eq!(reader.variant(), ReaderVariant::Standard);
        assert!(reader.record().is_empty());
    }

    #[test]
    fn test_select_then_cid() {
        let transport = ScriptedTransport::new(
            &[0x3B, 0x68],
            vec![sw(0x9000), ok(b"1101700203450")],
        );
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();
        assert!(reader.is_ready());

        let value = reader.read_field(Field::Cid).unwrap();
        assert_eq!(value, FieldValue::Cid("1101700203450".to_string()));
        assert_eq!(reader.record().cid.as_deref(), Some("1101700203450"));
        assert_eq!(reader.record().formatted_cid().as_deref(), Some("1-1017-00203-45-0"));
    }

    #[test]
    fn test_select_failure_stays_idle() {
        let transport = ScriptedTransport::new(&[0x3B, 0x68], vec![sw(0x6A82)]);
        let mut reader = CardReader::new(transport);

        let err = reader.select_applet().unwrap_err();
        assert!(matches!(err, ReadError::AppletSelectFailed(_)));
        assert_eq!(err.cause().and_then(CardError::sw), Some(0x6A82));
        assert_eq!(reader.state(), SessionState::Idle);
        assert_eq!(
            reader.read_field(Field::Cid),
            Err(ReadError::NotReady(SessionState::Idle))
        );
    }

    #[test]
    fn test_select_accepts_more_data() {
        let transport = ScriptedTransport::new(&[0x3B, 0x68], vec![sw(0x610A)]);
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();
        assert!(reader.is_ready());
    }

    #[test]
    fn test_continuation_payload_wins() {
        let transport = ScriptedTransport::new(
            &[0x3B, 0x68],
            vec![sw(0x9000), Ok(vec![0x32, 0x35, 0x61, 0x08]), ok(b"25380220")],
        );
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();

        let value = reader.read_field(Field::DateOfBirth).unwrap();
        assert_eq!(
            value,
            FieldValue::DateOfBirth(chrono::NaiveDate::from_ymd_opt(1995, 2, 20).unwrap())
        );
        assert_eq!(
            reader.transport.sent[2],
            vec![0x00, 0xC0, 0x00, 0x00, 0x08]
        );
    }

    #[test]
    fn test_alternate_variant_get_response() {
        let transport = ScriptedTransport::new(
            ALTERNATE_ATR,
            vec![sw(0x9000), sw(0x6101), ok(b"2")],
        );
        let mut reader = CardReader::new(transport);
        assert_eq!(reader.variant(), ReaderVariant::Alternate);
        reader.select_applet().unwrap();

        reader.read_field(Field::Gender).unwrap();
        assert_eq!(reader.record().gender, Some(crate::card::Gender::Female));
        assert_eq!(reader.transport.sent[2], vec![0x00, 0xC0, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_field_failure_is_local() {
        let transport = ScriptedTransport::new(
            &[0x3B, 0x68],
            vec![
                sw(0x9000),
                ok(b"1101700203450"),
                sw(0x6986),
                Err(TransportError::new("card removed")),
                ok(b"1101700203451"),
            ],
        );
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();
        reader.read_field(Field::Cid).unwrap();

        let err = reader.read_field(Field::ThaiName).unwrap_err();
        assert!(matches!(
            err,
            ReadError::FieldReadFailed { field: Field::ThaiName, .. }
        ));
        assert_eq!(err.cause().and_then(CardError::sw), Some(0x6986));
        assert!(reader.is_ready());

        let err = reader.read_field(Field::Address).unwrap_err();
        assert!(matches!(
            err.cause(),
            Some(CardError::Transport(_))
        ));

        // A checksum failure must not overwrite the CID already read
        let err = reader.read_field(Field::Cid).unwrap_err();
        assert!(matches!(err.cause(), Some(CardError::Checksum { .. })));
        assert_eq!(reader.record().cid.as_deref(), Some("1101700203450"));
        assert!(reader.record().thai_name.is_none());
    }

    #[test]
    fn test_failed_continuation_reports_status() {
        let transport = ScriptedTransport::new(
            &[0x3B, 0x68],
            vec![sw(0x9000), sw(0x6164), sw(0x6A86)],
        );
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();

        let err = reader.read_field(Field::Issuer).unwrap_err();
        assert_eq!(
            err.cause(),
            Some(&CardError::ProtocolStatus {
                sw: 0x6A86,
                status: Status::WrongParameters
            })
        );
    }

    #[test]
    fn test_malformed_response() {
        let transport = ScriptedTransport::new(&[0x3B, 0x68], vec![sw(0x9000), Ok(vec![0x90])]);
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();
        let err = reader.read_field(Field::Gender).unwrap_err();
        assert!(matches!(err.cause(), Some(CardError::MalformedResponse(_))));
    }

    #[test]
    fn test_photo_reads_twenty_parts() {
        let mut responses = vec![sw(0x9000)];
        for part in 1..=20u8 {
            responses.push(sw(0x61FF));
            responses.push(ok(&[part; 255]));
        }
        let mut reader = CardReader::new(ScriptedTransport::new(&[0x3B, 0x68], responses));
        reader.select_applet().unwrap();

        let mut seen = Vec::new();
        let len = reader
            .read_photo(|p| {
                seen.push(p.part);
                ControlFlow::Continue(())
            })
            .unwrap()
            .len();
        assert_eq!(len, 5100);
        assert_eq!(seen, (1..=20).collect::<Vec<u8>>());

        let photo = reader.record().photo.as_ref().unwrap();
        assert_eq!(photo[0], 1);
        assert_eq!(photo[5099], 20);
        assert_eq!(reader.transport.sent[1], CommandCatalog::photo_command(1).unwrap().to_vec());
        assert_eq!(reader.transport.sent[2], vec![0x00, 0xC0, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_photo_aborts_on_first_failure() {
        let mut responses = vec![sw(0x9000)];
        for part in 1..=3u8 {
            responses.push(ok(&[part; 255]));
        }
        responses.push(sw(0x6A82));
        let mut reader = CardReader::new(ScriptedTransport::new(&[0x3B, 0x68], responses));
        reader.select_applet().unwrap();

        let err = reader.read_photo(|_| ControlFlow::Continue(())).unwrap_err();
        assert!(matches!(err, ReadError::PhotoReadFailed { part: 4, .. }));
        assert!(reader.record().photo.is_none());
        assert!(reader.is_ready());
        // Nothing sent after the failing segment
        assert_eq!(reader.transport.sent.len(), 5);
    }

    #[test]
    fn test_photo_cancel_between_segments() {
        let mut responses = vec![sw(0x9000)];
        for part in 1..=20u8 {
            responses.push(ok(&[part; 255]));
        }
        let mut reader = CardReader::new(ScriptedTransport::new(&[0x3B, 0x68], responses));
        reader.select_applet().unwrap();

        let err = reader
            .read_photo(|p| {
                if p.part == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap_err();
        assert_eq!(err, ReadError::PhotoCancelled { after_part: 2 });
        assert!(reader.record().photo.is_none());
        assert_eq!(reader.transport.sent.len(), 3);
    }

    #[test]
    fn test_disconnect_discards_record() {
        let transport = ScriptedTransport::new(
            &[0x3B, 0x68],
            vec![sw(0x9000), ok(b"1101700203450")],
        );
        let mut reader = CardReader::new(transport);
        reader.select_applet().unwrap();
        reader.read_field(Field::Cid).unwrap();

        reader.disconnect();
        assert_eq!(reader.state(), SessionState::Idle);
        assert!(reader.record().is_empty());
        assert!(matches!(
            reader.read_photo(|_| ControlFlow::Continue(())),
            Err(ReadError::NotReady(SessionState::Idle))
        ));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(PhotoProgress { part: 5, total: 20 }.percent(), 25);
        assert_eq!(PhotoProgress { part: 20, total: 20 }.percent(), 100);
    }
}
