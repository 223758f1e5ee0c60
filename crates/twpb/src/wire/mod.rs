//! Wire-level building blocks: tags, wire types and raw field payloads.

mod reader;
mod writer;

pub use reader::{PackedValues, WireReader};
pub use writer::WireWriter;

use std::fmt;

use crate::error::{DecodeError, Malformed};

/// Largest field number a tag can carry (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// The 3-bit payload encoding code of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// int32, int64, uint32, uint64, sint32, sint64, bool, enum
    Varint = 0,
    /// fixed64, sfixed64, double
    Fixed64 = 1,
    /// string, bytes, embedded messages, packed repeated fields
    LengthDelimited = 2,
    /// deprecated groups; recognized only to be rejected
    StartGroup = 3,
    EndGroup = 4,
    /// fixed32, sfixed32, float
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

/// Field number plus wire type, the key in front of every field occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field_number: u32,
    pub wire_type: WireType,
}

impl Tag {
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        Self {
            field_number,
            wire_type,
        }
    }

    /// The varint value the tag is encoded as.
    ///
    /// `field_number` must not exceed [`MAX_FIELD_NUMBER`]; larger numbers
    /// do not fit in the 32-bit tag.
    pub const fn encode(self) -> u32 {
        debug_assert!(self.field_number <= MAX_FIELD_NUMBER);
        (self.field_number << 3) | self.wire_type.as_u8() as u32
    }

    /// Splits a decoded tag varint into its parts.
    pub fn decode(raw: u64) -> Result<Self, DecodeError> {
        let raw = u32::try_from(raw).map_err(|_| Malformed::TagOverflow)?;
        let field_number = raw >> 3;
        let code = (raw & 0x7) as u8;
        if field_number == 0 {
            return Err(Malformed::FieldNumberZero.into());
        }
        match WireType::from_u8(code) {
            Some(WireType::StartGroup) | Some(WireType::EndGroup) => {
                Err(DecodeError::UnterminatedGroup(field_number))
            }
            Some(wire_type) => Ok(Self::new(field_number, wire_type)),
            None => Err(DecodeError::InvalidWireType {
                field_number,
                wire_type: code,
            }),
        }
    }
}

/// One field payload as it appears on the wire, before it is interpreted
/// according to the field's declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(&'a [u8]),
    Fixed32(u32),
}

impl RawValue<'_> {
    pub fn wire_type(&self) -> WireType {
        match self {
            RawValue::Varint(_) => WireType::Varint,
            RawValue::Fixed64(_) => WireType::Fixed64,
            RawValue::LengthDelimited(_) => WireType::LengthDelimited,
            RawValue::Fixed32(_) => WireType::Fixed32,
        }
    }
}
