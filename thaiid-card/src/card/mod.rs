//! Card-side knowledge: ATR variants, the command catalogue and the record
//! the reader builds from decoded fields.

pub mod atr;
pub mod commands;
pub mod record;

pub use atr::ReaderVariant;
pub use commands::{
    CommandCatalog, DecoderKind, Field, FieldSpec, ReadCommand, PHOTO_PARTS, SELECT_APPLET,
    THAI_ID_AID,
};
pub use record::{CardRecord, Gender, NameParts};
