//! Descriptor-driven message decoder.

use bytes::Buf;
use tracing::{debug, trace};
use twpb_buffers::Reader;

use crate::descriptor::{FieldDescriptor, MessageDescriptor, ScalarKind};
use crate::error::DecodeError;
use crate::merge::merge_message;
use crate::oneof::OneofResolver;
use crate::options::{CodecOptions, EmbeddedMerge};
use crate::value::{MessageValue, UnknownField, Value};
use crate::varint::{zigzag_decode, zigzag_decode32};
use crate::wire::{RawValue, Tag, WireReader, WireType};

/// Decodes wire bytes into a [`MessageValue`] according to a
/// [`MessageDescriptor`].
///
/// The decoder holds nothing but its options, so one instance can be shared
/// freely between threads.
///
/// ```
/// use twpb::{FieldDescriptor, MessageDecoder, MessageDescriptor, ScalarKind, Value};
///
/// let desc = MessageDescriptor::builder("Message")
///     .oneof(0, "content")
///     .field(FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0))
///     .build()
///     .unwrap();
/// let msg = MessageDecoder::new().decode(b"\x1a\x07teststr", &desc).unwrap();
/// assert_eq!(msg.get(3), Some(&Value::from("teststr")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageDecoder {
    options: CodecOptions,
}

impl MessageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Decodes a whole buffer. Any structural error aborts the decode.
    pub fn decode(
        &self,
        data: &[u8],
        descriptor: &MessageDescriptor,
    ) -> Result<MessageValue, DecodeError> {
        self.read_message(data, descriptor, 0)
    }

    /// Decodes the remaining bytes of `buf`, consuming them.
    ///
    /// Contiguous buffers are decoded in place; chained ones are gathered
    /// first.
    pub fn decode_buf<B: Buf>(
        &self,
        buf: &mut B,
        descriptor: &MessageDescriptor,
    ) -> Result<MessageValue, DecodeError> {
        let len = buf.remaining();
        if buf.chunk().len() == len {
            let message = self.decode(buf.chunk(), descriptor)?;
            buf.advance(len);
            Ok(message)
        } else {
            let bytes = buf.copy_to_bytes(len);
            self.decode(&bytes, descriptor)
        }
    }

    /// Decodes a message from a byte iterator.
    ///
    /// Length-delimited payloads are decoded from bounded sub-slices, so the
    /// iterator is drained into one buffer first.
    ///
    /// ```
    /// use twpb::{FieldDescriptor, MessageDecoder, MessageDescriptor, ScalarKind, Value};
    ///
    /// let desc = MessageDescriptor::builder("M")
    ///     .field(FieldDescriptor::new(1, "id", ScalarKind::UInt32))
    ///     .build()
    ///     .unwrap();
    /// let data = [0x08, 0x96, 0x01, 0xff];
    /// let msg = MessageDecoder::new()
    ///     .decode_iter(data.iter().copied().take(3), &desc)
    ///     .unwrap();
    /// assert_eq!(msg.get(1), Some(&Value::U32(150)));
    /// ```
    pub fn decode_iter<I>(
        &self,
        bytes: I,
        descriptor: &MessageDescriptor,
    ) -> Result<MessageValue, DecodeError>
    where
        I: IntoIterator<Item = u8>,
    {
        let data: Vec<u8> = bytes.into_iter().collect();
        self.decode(&data, descriptor)
    }

    fn read_message(
        &self,
        data: &[u8],
        descriptor: &MessageDescriptor,
        depth: usize,
    ) -> Result<MessageValue, DecodeError> {
        if depth > self.options.recursion_limit {
            return Err(DecodeError::RecursionLimitExceeded(self.options.recursion_limit));
        }
        let resolver = OneofResolver::new(descriptor);
        let mut reader = WireReader::new(data);
        let mut message = MessageValue::new();

        while !reader.is_empty() {
            let start = reader.position();
            let tag = reader.read_tag()?;

            let Some(field) = descriptor.field(tag.field_number) else {
                reader.read_value(tag)?;
                if self.options.preserve_unknown_fields {
                    debug!(
                        message_type = descriptor.name(),
                        field = tag.field_number,
                        wire_type = %tag.wire_type,
                        "preserving unknown field"
                    );
                    message.push_unknown(UnknownField {
                        number: tag.field_number,
                        wire_type: tag.wire_type,
                        raw: reader.consumed_since(start).to_vec(),
                    });
                }
                continue;
            };

            check_wire_type(field, tag)?;
            let raw = reader.read_value(tag)?;
            trace!(
                message_type = descriptor.name(),
                field = field.number,
                kind = %field.kind,
                "decoded field"
            );

            if field.repeated {
                self.read_repeated(&mut message, field, raw, depth)?;
            } else {
                let value = self.read_scalar(field, raw, depth)?;
                self.store(&mut message, &resolver, field, value);
            }
        }
        Ok(message)
    }

    fn read_repeated(
        &self,
        message: &mut MessageValue,
        field: &FieldDescriptor,
        raw: RawValue<'_>,
        depth: usize,
    ) -> Result<(), DecodeError> {
        match raw {
            RawValue::LengthDelimited(payload) if field.kind.is_packable() => {
                let element = Tag::new(field.number, field.kind.wire_type());
                for item in WireReader::packed(payload, element) {
                    let value = self.read_scalar(field, item?, depth)?;
                    message.push(field.number, value);
                }
            }
            raw => {
                let value = self.read_scalar(field, raw, depth)?;
                message.push(field.number, value);
            }
        }
        Ok(())
    }

    /// Interprets one payload according to the field's kind.
    fn read_scalar(
        &self,
        field: &FieldDescriptor,
        raw: RawValue<'_>,
        depth: usize,
    ) -> Result<Value, DecodeError> {
        let value = match (field.kind, raw) {
            (ScalarKind::Int32 | ScalarKind::Enum, RawValue::Varint(v)) => Value::I32(v as i32),
            (ScalarKind::Int64, RawValue::Varint(v)) => Value::I64(v as i64),
            (ScalarKind::UInt32, RawValue::Varint(v)) => Value::U32(v as u32),
            (ScalarKind::UInt64, RawValue::Varint(v)) => Value::U64(v),
            (ScalarKind::SInt32, RawValue::Varint(v)) => Value::I32(zigzag_decode32(v as u32)),
            (ScalarKind::SInt64, RawValue::Varint(v)) => Value::I64(zigzag_decode(v)),
            (ScalarKind::Bool, RawValue::Varint(v)) => Value::Bool(v != 0),
            (ScalarKind::Fixed64, RawValue::Fixed64(v)) => Value::U64(v),
            (ScalarKind::SFixed64, RawValue::Fixed64(v)) => Value::I64(v as i64),
            (ScalarKind::Double, RawValue::Fixed64(v)) => Value::F64(f64::from_bits(v)),
            (ScalarKind::Fixed32, RawValue::Fixed32(v)) => Value::U32(v),
            (ScalarKind::SFixed32, RawValue::Fixed32(v)) => Value::I32(v as i32),
            (ScalarKind::Float, RawValue::Fixed32(v)) => Value::F32(f32::from_bits(v)),
            (ScalarKind::String, RawValue::LengthDelimited(bytes)) => {
                Value::Str(Reader::new(bytes).try_utf8(bytes.len())?.to_owned())
            }
            (ScalarKind::Bytes, RawValue::LengthDelimited(bytes)) => Value::Bytes(bytes.to_vec()),
            (ScalarKind::Message, RawValue::LengthDelimited(bytes)) => {
                match field.message_type.as_deref() {
                    Some(nested) => Value::Message(self.read_message(bytes, nested, depth + 1)?),
                    // Built tables always carry a message type.
                    None => Value::Bytes(bytes.to_vec()),
                }
            }
            (_, raw) => {
                return Err(DecodeError::InvalidWireType {
                    field_number: field.number,
                    wire_type: raw.wire_type().as_u8(),
                })
            }
        };
        Ok(value)
    }

    /// Stores a singular value: last occurrence wins, except that embedded
    /// messages merge into an earlier occurrence.
    fn store(
        &self,
        message: &mut MessageValue,
        resolver: &OneofResolver<'_>,
        field: &FieldDescriptor,
        value: Value,
    ) {
        let value = match (value, field.message_type.as_deref()) {
            (Value::Message(incoming), Some(nested))
                if self.options.embedded_merge == EmbeddedMerge::Merge =>
            {
                match message.remove(field.number) {
                    Some(Value::Message(mut existing)) => {
                        debug!(
                            message_type = nested.name(),
                            field = field.number,
                            "merging repeated occurrence of embedded message"
                        );
                        merge_message(&mut existing, incoming, nested, &self.options);
                        Value::Message(existing)
                    }
                    _ => Value::Message(incoming),
                }
            }
            (value, _) => value,
        };

        match field.oneof_group {
            Some(group) => {
                resolver.install(message, field.number, group, value);
            }
            None => {
                message.set(field.number, value);
            }
        }
    }
}

/// Repeated packable fields take both the packed and the element encoding,
/// whatever the declared `packed` flag says.
fn check_wire_type(field: &FieldDescriptor, tag: Tag) -> Result<(), DecodeError> {
    let expected = field.kind.wire_type();
    let packed = field.repeated
        && field.kind.is_packable()
        && tag.wire_type == WireType::LengthDelimited;
    if tag.wire_type == expected || packed {
        Ok(())
    } else {
        Err(DecodeError::InvalidWireType {
            field_number: tag.field_number,
            wire_type: tag.wire_type.as_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::Malformed;

    fn simple() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("SuperSimple")
            .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
            .field(FieldDescriptor::new(2, "firmware_version", ScalarKind::String))
            .field(FieldDescriptor::new(3, "vendor", ScalarKind::String))
            .field(FieldDescriptor::new(4, "product", ScalarKind::String))
            .build()
            .unwrap()
    }

    #[test]
    fn decodes_strings_in_any_order() {
        let desc = simple();
        let msg = MessageDecoder::new()
            .decode(b"\x1a\x06vendor\x0a\x06serial", &desc)
            .unwrap();
        assert_eq!(msg.get(1), Some(&Value::from("serial")));
        assert_eq!(msg.get(3), Some(&Value::from("vendor")));
        assert!(!msg.has(2));
    }

    #[test]
    fn last_scalar_occurrence_wins() {
        let desc = simple();
        let msg = MessageDecoder::new()
            .decode(b"\x0a\x01a\x0a\x01b", &desc)
            .unwrap();
        assert_eq!(msg.get(1), Some(&Value::from("b")));
    }

    #[test]
    fn empty_input_is_empty_message() {
        let msg = MessageDecoder::new().decode(&[], &simple()).unwrap();
        assert!(msg.is_empty());
    }

    #[test]
    fn wrong_wire_type_for_known_field() {
        let desc = simple();
        assert_eq!(
            MessageDecoder::new().decode(&[0x08, 0x01], &desc),
            Err(DecodeError::InvalidWireType {
                field_number: 1,
                wire_type: 0
            })
        );
    }

    #[test]
    fn invalid_utf8_string() {
        let desc = simple();
        assert_eq!(
            MessageDecoder::new().decode(&[0x0a, 0x02, 0xc3, 0x28], &desc),
            Err(DecodeError::Malformed(Malformed::InvalidUtf8))
        );
    }

    #[test]
    fn unknown_fields_can_be_dropped() {
        let desc = simple();
        let options = CodecOptions {
            preserve_unknown_fields: false,
            ..CodecOptions::default()
        };
        let msg = MessageDecoder::with_options(options)
            .decode(&[0x48, 0x01, 0x0a, 0x01, b'x'], &desc)
            .unwrap();
        assert!(msg.unknown_fields().is_empty());
        assert_eq!(msg.get(1), Some(&Value::from("x")));
    }

    #[test]
    fn decode_from_buf_consumes_input() {
        let desc = simple();
        let mut buf: &[u8] = b"\x0a\x01a\x22\x01p";
        let msg = MessageDecoder::new().decode_buf(&mut buf, &desc).unwrap();
        assert_eq!(msg.get(1), Some(&Value::from("a")));
        assert_eq!(msg.get(4), Some(&Value::from("p")));
        assert!(buf.is_empty());

        let mut chained = (&b"\x0a\x02"[..]).chain(&b"sn"[..]);
        let msg = MessageDecoder::new().decode_buf(&mut chained, &desc).unwrap();
        assert_eq!(msg.get(1), Some(&Value::from("sn")));
        assert_eq!(chained.remaining(), 0);
    }

    #[test]
    fn decode_from_iterator() {
        let desc = simple();
        let data = [0x1a, 0x01, b'v', 0x0a, 0x01, b's', 0x0a];
        let mut iter = data.iter().copied();
        let msg = MessageDecoder::new()
            .decode_iter(iter.by_ref().take(6), &desc)
            .unwrap();
        assert_eq!(msg.get(1), Some(&Value::from("s")));
        assert_eq!(msg.get(3), Some(&Value::from("v")));
        assert_eq!(iter.next(), Some(0x0a));

        assert_eq!(
            MessageDecoder::new().decode_iter(data, &desc),
            Err(DecodeError::TruncatedInput)
        );
    }

    #[test]
    fn recursion_limit_applies() {
        fn nested(depth: usize) -> Vec<u8> {
            let mut bytes = Vec::new();
            for _ in 0..depth {
                let mut outer = vec![0x0a, bytes.len() as u8];
                outer.extend_from_slice(&bytes);
                bytes = outer;
            }
            bytes
        }
        let leaf = MessageDescriptor::builder("Leaf").build().unwrap();
        let mut desc = leaf;
        for _ in 0..4 {
            desc = MessageDescriptor::builder("Node")
                .field(FieldDescriptor::message(1, "child", desc))
                .build()
                .unwrap();
        }
        let options = CodecOptions {
            recursion_limit: 2,
            ..CodecOptions::default()
        };
        let decoder = MessageDecoder::with_options(options);
        assert!(decoder.decode(&nested(2), &desc).is_ok());
        assert_eq!(
            decoder.decode(&nested(3), &desc),
            Err(DecodeError::RecursionLimitExceeded(2))
        );
    }
}
