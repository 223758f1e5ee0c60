//! Appends tags and payloads in the four wire encodings.

use twpb_buffers::Writer;

use super::{Tag, WireType};
use crate::varint::write_varint;

/// Output side of the wire codec.
///
/// Length-delimited payloads are always handed in fully encoded, so nested
/// messages and packed runs are built in their own `WireWriter` and then
/// emitted with [`write_length_delimited`](Self::write_length_delimited).
///
/// ```
/// use twpb::wire::{WireType, WireWriter};
///
/// let mut writer = WireWriter::new();
/// writer.write_tag(1, WireType::LengthDelimited);
/// writer.write_length_delimited(b"serial");
/// assert_eq!(writer.flush(), b"\x0a\x06serial");
/// ```
#[derive(Default)]
pub struct WireWriter {
    writer: Writer,
}

impl WireWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.writer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// Writes a field key. Field numbers above
    /// [`MAX_FIELD_NUMBER`](super::MAX_FIELD_NUMBER) trip a debug assertion.
    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        let tag = Tag::new(field_number, wire_type);
        write_varint(&mut self.writer, u64::from(tag.encode()));
    }

    pub fn write_varint(&mut self, value: u64) {
        write_varint(&mut self.writer, value);
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.writer.u32_le(value);
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.writer.u64_le(value);
    }

    /// Writes the varint length of `bytes` followed by the bytes.
    pub fn write_length_delimited(&mut self, bytes: &[u8]) {
        write_varint(&mut self.writer, bytes.len() as u64);
        self.writer.buf(bytes);
    }

    /// Copies pre-encoded bytes, e.g. a preserved unknown field.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.writer.buf(bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        self.writer.as_slice()
    }

    /// Takes everything written so far.
    pub fn flush(&mut self) -> Vec<u8> {
        self.writer.flush()
    }
}
