//! Sequential cursor over protobuf wire bytes.

use twpb_buffers::Reader;

use super::{RawValue, Tag, WireType};
use crate::error::{DecodeError, Malformed};
use crate::varint::decode_varint;

/// Reads tags and payloads from a byte buffer.
///
/// ```
/// use twpb::wire::{RawValue, WireReader, WireType};
///
/// let mut reader = WireReader::new(&[0x08, 0x96, 0x01]);
/// let tag = reader.read_tag().unwrap();
/// assert_eq!((tag.field_number, tag.wire_type), (1, WireType::Varint));
/// assert_eq!(reader.read_value(tag).unwrap(), RawValue::Varint(150));
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    reader: Reader<'a>,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// Cursor offset into the buffer.
    pub fn position(&self) -> usize {
        self.reader.x
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.reader.size()
    }

    /// Verbatim bytes read since `start` (a value previously returned by
    /// [`position`](Self::position)).
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        self.reader.consumed_since(start)
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (value, len) = decode_varint(self.reader.remaining())?;
        self.reader.try_skip(len)?;
        Ok(value)
    }

    pub fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let raw = self.read_varint()?;
        Tag::decode(raw)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        Ok(self.reader.try_u32_le()?)
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        Ok(self.reader.try_u64_le()?)
    }

    /// Reads a varint length followed by exactly that many bytes.
    pub fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_varint()?;
        if len > i32::MAX as u64 {
            return Err(Malformed::NegativeLength.into());
        }
        Ok(self.reader.try_buf(len as usize)?)
    }

    /// Reads the payload that follows `tag`.
    pub fn read_value(&mut self, tag: Tag) -> Result<RawValue<'a>, DecodeError> {
        match tag.wire_type {
            WireType::Varint => self.read_varint().map(RawValue::Varint),
            WireType::Fixed64 => self.read_fixed64().map(RawValue::Fixed64),
            WireType::LengthDelimited => self.read_length_delimited().map(RawValue::LengthDelimited),
            WireType::Fixed32 => self.read_fixed32().map(RawValue::Fixed32),
            WireType::StartGroup | WireType::EndGroup => {
                Err(DecodeError::UnterminatedGroup(tag.field_number))
            }
        }
    }

    /// Iterates the back-to-back scalar encodings inside a packed payload.
    /// `element` is the tag the values would carry if they were unpacked.
    pub fn packed(payload: &'a [u8], element: Tag) -> PackedValues<'a> {
        PackedValues {
            reader: WireReader::new(payload),
            element,
            failed: false,
        }
    }
}

/// Iterator over a packed repeated payload. Stops after the first error.
#[derive(Debug, Clone)]
pub struct PackedValues<'a> {
    reader: WireReader<'a>,
    element: Tag,
    failed: bool,
}

impl<'a> Iterator for PackedValues<'a> {
    type Item = Result<RawValue<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_empty() {
            return None;
        }
        let item = self.reader.read_value(self.element);
        self.failed = item.is_err();
        Some(item)
    }
}
