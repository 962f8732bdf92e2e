//! Virtual Thai ID card
//!
//! An in-process card that answers the same APDUs as the real applet:
//! SELECT by AID, proprietary READ BINARY (`80 B0`) and GET RESPONSE
//! (`00 C0`). Like the real card it answers reads with `61XX` and keeps the
//! data in a response buffer until GET RESPONSE collects it, and it only
//! accepts the GET RESPONSE variant matching its ATR.
//!
//! Faults can be injected per file offset to exercise error paths.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::{Mutex, MutexGuard};

use crate::apdu::{cla, ins, parse_apdu, Response, APDU, SW};
use crate::card::atr::{standard_atr, ReaderVariant};
use crate::card::commands::PHOTO_SEGMENT_LEN;
use crate::card::{CommandCatalog, Field, PHOTO_PARTS, THAI_ID_AID};
use crate::decode::encode_tis620;
use crate::reader::{Transport, TransportError};

/// Bytes returned in the SELECT status word (61 0A)
const SELECT_RESPONSE_LEN: u8 = 0x0A;

/// Cardholder data written into the virtual card's file
///
/// Text is stored as it appears on the card: names use `#` between prefix,
/// first, middle and last name; dates are Buddhist-era `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProfile {
    pub cid: String,
    pub thai_name: String,
    pub english_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub address: String,
    pub photo: Vec<u8>,
}

impl CardProfile {
    /// A complete, valid profile
    pub fn sample() -> Self {
        Self {
            cid: "1101700203450".to_string(),
            thai_name: "นาย#สมชาย##ใจดี".to_string(),
            english_name: "Mr.#Somchai##Jaidee".to_string(),
            date_of_birth: "25380220".to_string(),
            gender: "1".to_string(),
            issuer: "สำนักงานเขตบางรัก/กรุงเทพมหานคร".to_string(),
            issue_date: "25650115".to_string(),
            expiry_date: "25730219".to_string(),
            address: "99/1#หมู่ที่ 4####ตำบลสีลม#อำเภอบางรัก#จังหวัดกรุงเทพมหานคร".to_string(),
            photo: sample_photo(),
        }
    }

    fn text_for(&self, field: Field) -> Vec<u8> {
        match field {
            Field::Cid => self.cid.as_bytes().to_vec(),
            Field::ThaiName => encode_tis620(&self.thai_name),
            Field::EnglishName => encode_tis620(&self.english_name),
            Field::DateOfBirth => self.date_of_birth.as_bytes().to_vec(),
            Field::Gender => self.gender.as_bytes().to_vec(),
            Field::Issuer => encode_tis620(&self.issuer),
            Field::IssueDate => self.issue_date.as_bytes().to_vec(),
            Field::ExpiryDate => self.expiry_date.as_bytes().to_vec(),
            Field::Address => encode_tis620(&self.address),
        }
    }
}

/// 5,100 bytes framed like a JPEG (SOI ... EOI)
pub fn sample_photo() -> Vec<u8> {
    let total = PHOTO_PARTS as usize * PHOTO_SEGMENT_LEN as usize;
    let mut photo = Vec::with_capacity(total);
    photo.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    photo.extend((0..total - 6).map(|i| (i % 251) as u8));
    photo.extend_from_slice(&[0xFF, 0xD9]);
    photo
}

/// How READ BINARY answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// `61XX`, data collected with GET RESPONSE (the real card)
    #[default]
    Chained,
    /// Data plus `9000` in one response
    Direct,
}

/// A failure injected at a file offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// READ at the offset answers with this status word
    Status(u16),
    /// GET RESPONSE after a READ at the offset answers with this status word
    ContinuationStatus(u16),
    /// READ at the offset yields no response at all
    Transport,
}

/// In-memory Thai ID card
pub struct VirtualThaiIdCard {
    atr: Vec<u8>,
    variant: ReaderVariant,
    memory: Vec<u8>,
    mode: ResponseMode,
    selected: bool,
    present: bool,
    response_buffer: Vec<u8>,
    pending_fault: Option<u16>,
    faults: HashMap<u16, Fault>,
    commands: Vec<Vec<u8>>,
}

impl VirtualThaiIdCard {
    /// Create a card holding `profile`, with a standard ATR
    pub fn new(profile: CardProfile) -> Self {
        let atr = standard_atr();
        Self {
            variant: ReaderVariant::from_atr(&atr),
            atr,
            memory: build_memory(&profile),
            mode: ResponseMode::default(),
            selected: false,
            present: true,
            response_buffer: Vec::new(),
            pending_fault: None,
            faults: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Present a different ATR; the accepted GET RESPONSE follows it
    pub fn with_atr(mut self, atr: &[u8]) -> Self {
        self.atr = atr.to_vec();
        self.variant = ReaderVariant::from_atr(atr);
        self
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Make READ at `offset` fail with `fault`
    pub fn inject_fault(&mut self, offset: u16, fault: Fault) {
        self.faults.insert(offset, fault);
    }

    /// Make the READ for `field` fail with `fault`
    pub fn fail_field(&mut self, field: Field, fault: Fault) {
        self.inject_fault(field.spec().offset(), fault);
    }

    /// Make the READ for photo segment `part` fail with `fault`
    pub fn fail_photo_part(&mut self, part: u8, fault: Fault) {
        if let Ok(offset) = CommandCatalog::photo_offset(part) {
            self.inject_fault(offset, fault);
        }
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Pull the card out: every later exchange fails at the transport
    pub fn remove(&mut self) {
        self.present = false;
        self.reset();
        info!("Virtual card removed");
    }

    /// Put the card back, unselected
    pub fn insert(&mut self) {
        self.present = true;
        self.reset();
        info!("Virtual card inserted");
    }

    /// Every command received, in order
    pub fn commands(&self) -> &[Vec<u8>] {
        &self.commands
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Wrap in a shared handle so a test can keep inspecting the card
    pub fn shared(self) -> SharedCard {
        SharedCard(Arc::new(Mutex::new(self)))
    }

    fn reset(&mut self) {
        self.selected = false;
        self.response_buffer.clear();
        self.pending_fault = None;
    }

    /// Process an APDU command and return data + SW1 SW2
    pub fn process_apdu(&mut self, apdu_bytes: &[u8]) -> Vec<u8> {
        let cmd = match parse_apdu(apdu_bytes) {
            Ok(apdu) => apdu,
            Err(e) => {
                debug!("Failed to parse APDU: {}", e);
                return Response::error(SW::WRONG_LENGTH).to_bytes();
            }
        };

        debug!(
            "Virtual card APDU: CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
            cmd.cla, cmd.ins, cmd.p1, cmd.p2
        );

        let response = match (cmd.cla, cmd.ins) {
            (cla::ISO, ins::SELECT) => self.handle_select(&cmd),
            (cla::PROPRIETARY, ins::READ_BINARY) => self.handle_read(&cmd),
            (cla::ISO, ins::GET_RESPONSE) => self.handle_get_response(&cmd),
            (cla::ISO, _) | (cla::PROPRIETARY, _) => Response::error(SW::INS_NOT_SUPPORTED),
            _ => Response::error(SW::CLA_NOT_SUPPORTED),
        };
        response.to_bytes()
    }

    /// Handle SELECT command (INS A4)
    fn handle_select(&mut self, cmd: &APDU) -> Response {
        self.reset();
        if cmd.p1 != 0x04 || cmd.data != THAI_ID_AID {
            debug!("Unknown AID: {:02X?}", cmd.data);
            return Response::error(SW::FILE_NOT_FOUND);
        }
        self.selected = true;
        info!("Thai ID applet selected on virtual card");
        Response::more_data(SELECT_RESPONSE_LEN)
    }

    /// Handle READ BINARY (CLA 80, INS B0): data is `00 <length>`
    fn handle_read(&mut self, cmd: &APDU) -> Response {
        if !self.selected {
            return Response::error(SW::COMMAND_NOT_ALLOWED_NO_EF);
        }
        let length = match cmd.data.as_slice() {
            [0x00, length] => *length as usize,
            _ => return Response::error(SW::WRONG_LENGTH),
        };

        let offset = cmd.p1p2();
        self.pending_fault = None;
        match self.faults.get(&offset) {
            Some(Fault::Status(sw)) => return Response::error(*sw),
            Some(Fault::ContinuationStatus(sw)) => self.pending_fault = Some(*sw),
            Some(Fault::Transport) | None => {}
        }

        let start = offset as usize;
        if start >= self.memory.len() {
            return Response::error(SW::INCORRECT_P1_P2);
        }
        let end = (start + length).min(self.memory.len());
        let data = self.memory[start..end].to_vec();

        match self.mode {
            ResponseMode::Direct => Response::success(data),
            ResponseMode::Chained => {
                let available = data.len() as u8;
                self.response_buffer = data;
                Response::more_data(available)
            }
        }
    }

    /// Handle GET RESPONSE (INS C0)
    fn handle_get_response(&mut self, cmd: &APDU) -> Response {
        let [_, _, p1, p2] = self.variant.continuation_command();
        if cmd.p1 != p1 || cmd.p2 != p2 {
            debug!("GET RESPONSE with P2={:02X} rejected by {} card", cmd.p2, self.variant);
            return Response::error(SW::INCORRECT_P1_P2);
        }
        if let Some(sw) = self.pending_fault.take() {
            self.response_buffer.clear();
            return Response::error(sw);
        }
        if self.response_buffer.is_empty() {
            return Response::error(SW::CONDITIONS_NOT_SATISFIED);
        }

        let le = cmd.le.unwrap_or(256) as usize;
        let chunk_size = le.min(self.response_buffer.len());
        let data: Vec<u8> = self.response_buffer.drain(..chunk_size).collect();

        if self.response_buffer.is_empty() {
            Response::success(data)
        } else {
            Response::new(data, SW::bytes_remaining(self.response_buffer.len().min(255) as u8))
        }
    }

    fn transport_fault(&self, command: &[u8]) -> bool {
        match parse_apdu(command) {
            Ok(cmd) if cmd.cla == cla::PROPRIETARY && cmd.ins == ins::READ_BINARY => {
                self.faults.get(&cmd.p1p2()) == Some(&Fault::Transport)
            }
            _ => false,
        }
    }
}

impl Transport for VirtualThaiIdCard {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.commands.push(command.to_vec());
        if !self.present {
            return Err(TransportError::new("no card in reader"));
        }
        if self.transport_fault(command) {
            return Err(TransportError::new("card stopped responding"));
        }
        Ok(self.process_apdu(command))
    }

    fn atr(&self) -> Vec<u8> {
        self.atr.clone()
    }
}

/// Shared handle to a virtual card
#[derive(Clone)]
pub struct SharedCard(Arc<Mutex<VirtualThaiIdCard>>);

impl SharedCard {
    pub fn lock(&self) -> MutexGuard<'_, VirtualThaiIdCard> {
        self.0.lock()
    }
}

impl Transport for SharedCard {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.0.lock().transmit(command)
    }

    fn atr(&self) -> Vec<u8> {
        self.0.lock().atr()
    }
}

/// Lay the profile out at the card's file offsets
fn build_memory(profile: &CardProfile) -> Vec<u8> {
    let end = Field::ALL
        .iter()
        .map(|field| {
            let spec = field.spec();
            spec.offset() as usize + spec.length as usize
        })
        .max()
        .unwrap_or(0);
    let mut memory = vec![0x20; end];

    for field in Field::ALL {
        let spec = field.spec();
        let start = spec.offset() as usize;
        let text = profile.text_for(field);
        let len = text.len().min(spec.length as usize);
        memory[start..start + len].copy_from_slice(&text[..len]);
    }

    if let Ok(photo_start) = CommandCatalog::photo_offset(1) {
        let start = photo_start as usize;
        let area = PHOTO_PARTS as usize * PHOTO_SEGMENT_LEN as usize;
        memory[start..start + area].fill(0x00);
        let len = profile.photo.len().min(area);
        memory[start..start + len].copy_from_slice(&profile.photo[..len]);
    }

    memory
}
