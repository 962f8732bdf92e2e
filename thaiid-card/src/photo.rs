//! Photo reassembly
//!
//! The JPEG photo is stored as 20 consecutive segments of up to 255 bytes.
//! Segments are collected strictly in order and only released as a whole.

use log::debug;

use crate::card::PHOTO_PARTS;
use crate::error::CardError;

/// Collects photo segments in card order
#[derive(Debug, Default)]
pub struct PhotoAssembler {
    segments: Vec<Vec<u8>>,
}

impl PhotoAssembler {
    pub fn new() -> Self {
        Self {
            segments: Vec::with_capacity(PHOTO_PARTS as usize),
        }
    }

    /// Append the next segment
    ///
    /// Empty segments and segments past the 20th are rejected.
    pub fn push(&mut self, segment: Vec<u8>) -> Result<(), CardError> {
        let part = self.segments.len() + 1;
        if part > PHOTO_PARTS as usize {
            return Err(CardError::PhotoIncomplete(format!(
                "segment {} exceeds the {} photo parts",
                part, PHOTO_PARTS
            )));
        }
        if segment.is_empty() {
            return Err(CardError::PhotoIncomplete(format!("segment {} is empty", part)));
        }
        debug!("Photo segment {}/{}: {} bytes", part, PHOTO_PARTS, segment.len());
        self.segments.push(segment);
        Ok(())
    }

    /// Segments collected so far
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Concatenate all 20 segments
    pub fn finish(self) -> Result<Vec<u8>, CardError> {
        if self.segments.len() != PHOTO_PARTS as usize {
            return Err(CardError::PhotoIncomplete(format!(
                "got {} of {} segments",
                self.segments.len(),
                PHOTO_PARTS
            )));
        }
        Ok(self.segments.concat())
    }

    /// Assemble a photo from an ordered list of segments
    pub fn assemble<S: AsRef<[u8]>>(segments: &[S]) -> Result<Vec<u8>, CardError> {
        let mut assembler = Self::new();
        for segment in segments {
            assembler.push(segment.as_ref().to_vec())?;
        }
        assembler.finish()
    }
}
