//! Descriptor-driven message encoder.

use bytes::BufMut;
use tracing::trace;

use crate::descriptor::{FieldDescriptor, MessageDescriptor, ScalarKind};
use crate::error::EncodeError;
use crate::oneof::OneofResolver;
use crate::options::CodecOptions;
use crate::value::{MessageValue, Value};
use crate::varint::{zigzag_encode, zigzag_encode32};
use crate::wire::{WireType, WireWriter};

/// Encodes a [`MessageValue`] into wire bytes according to a
/// [`MessageDescriptor`].
///
/// Known fields are written in ascending field-number order, followed by
/// preserved unknown fields in the order they were captured.
///
/// ```
/// use twpb::{FieldDescriptor, MessageDescriptor, MessageEncoder, MessageValue, ScalarKind};
///
/// let desc = MessageDescriptor::builder("SuperSimple")
///     .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
///     .field(FieldDescriptor::new(2, "firmware_version", ScalarKind::String))
///     .build()
///     .unwrap();
/// let msg = MessageValue::new().with(2, "fw").with(1, "sn");
/// let bytes = MessageEncoder::new().encode(&msg, &desc).unwrap();
/// assert_eq!(bytes, b"\x0a\x02sn\x12\x02fw");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageEncoder {
    options: CodecOptions,
}

impl MessageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn encode(
        &self,
        message: &MessageValue,
        descriptor: &MessageDescriptor,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut writer = WireWriter::new();
        self.write_message(&mut writer, message, descriptor)?;
        Ok(writer.flush())
    }

    /// Encodes into a caller-supplied buffer and returns the number of bytes
    /// written.
    ///
    /// The message is fully encoded before anything is written, so on
    /// [`EncodeError::BufferTooSmall`] `out` is left untouched.
    ///
    /// ```
    /// use twpb::{EncodeError, FieldDescriptor, MessageDescriptor, MessageEncoder, MessageValue, ScalarKind};
    ///
    /// let desc = MessageDescriptor::builder("SuperSimple")
    ///     .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
    ///     .build()
    ///     .unwrap();
    /// let msg = MessageValue::new().with(1, "sn");
    ///
    /// let mut buf = [0u8; 8];
    /// let written = MessageEncoder::new().encode_to(&msg, &desc, &mut &mut buf[..]).unwrap();
    /// assert_eq!(&buf[..written], b"\x0a\x02sn");
    ///
    /// let mut small = [0u8; 2];
    /// assert_eq!(
    ///     MessageEncoder::new().encode_to(&msg, &desc, &mut &mut small[..]),
    ///     Err(EncodeError::BufferTooSmall { needed: 4, available: 2 })
    /// );
    /// ```
    pub fn encode_to<B: BufMut>(
        &self,
        message: &MessageValue,
        descriptor: &MessageDescriptor,
        out: &mut B,
    ) -> Result<usize, EncodeError> {
        let bytes = self.encode(message, descriptor)?;
        let available = out.remaining_mut();
        if available < bytes.len() {
            return Err(EncodeError::BufferTooSmall {
                needed: bytes.len(),
                available,
            });
        }
        out.put_slice(&bytes);
        Ok(bytes.len())
    }

    fn write_message(
        &self,
        writer: &mut WireWriter,
        message: &MessageValue,
        descriptor: &MessageDescriptor,
    ) -> Result<(), EncodeError> {
        OneofResolver::new(descriptor).check(message)?;
        for (number, value) in message.fields() {
            let field = descriptor
                .field(number)
                .ok_or(EncodeError::UnknownField(number))?;
            trace!(
                message_type = descriptor.name(),
                field = number,
                kind = %field.kind,
                "encoding field"
            );
            if field.repeated {
                self.write_repeated(writer, field, value)?;
            } else {
                self.write_singular(writer, field, value)?;
            }
        }
        for unknown in message.unknown_fields() {
            writer.write_raw(&unknown.raw);
        }
        Ok(())
    }

    fn write_singular(
        &self,
        writer: &mut WireWriter,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), EncodeError> {
        check_kind(field, value)?;
        // Implicit presence: a zero value is indistinguishable from absence.
        if !field.has_presence() && !self.options.emit_default_values && value.is_default() {
            return Ok(());
        }
        writer.write_tag(field.number, field.kind.wire_type());
        self.write_payload(writer, field, value)
    }

    fn write_repeated(
        &self,
        writer: &mut WireWriter,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let Value::List(items) = value else {
            return Err(mismatch(field, value));
        };
        for item in items {
            check_kind(field, item)?;
        }
        if items.is_empty() {
            return Ok(());
        }

        if field.packed {
            let mut packed = WireWriter::new();
            for item in items {
                self.write_payload(&mut packed, field, item)?;
            }
            writer.write_tag(field.number, WireType::LengthDelimited);
            writer.write_length_delimited(packed.as_slice());
        } else {
            for item in items {
                writer.write_tag(field.number, field.kind.wire_type());
                self.write_payload(writer, field, item)?;
            }
        }
        Ok(())
    }

    /// Writes one value without its tag.
    fn write_payload(
        &self,
        writer: &mut WireWriter,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), EncodeError> {
        match (field.kind, value) {
            // Negative int32 values are sign-extended to ten bytes.
            (ScalarKind::Int32 | ScalarKind::Enum, Value::I32(n)) => {
                writer.write_varint(i64::from(*n) as u64)
            }
            (ScalarKind::SInt32, Value::I32(n)) => {
                writer.write_varint(u64::from(zigzag_encode32(*n)))
            }
            (ScalarKind::SFixed32, Value::I32(n)) => writer.write_fixed32(*n as u32),
            (ScalarKind::Int64, Value::I64(n)) => writer.write_varint(*n as u64),
            (ScalarKind::SInt64, Value::I64(n)) => writer.write_varint(zigzag_encode(*n)),
            (ScalarKind::SFixed64, Value::I64(n)) => writer.write_fixed64(*n as u64),
            (ScalarKind::UInt32, Value::U32(n)) => writer.write_varint(u64::from(*n)),
            (ScalarKind::Fixed32, Value::U32(n)) => writer.write_fixed32(*n),
            (ScalarKind::UInt64, Value::U64(n)) => writer.write_varint(*n),
            (ScalarKind::Fixed64, Value::U64(n)) => writer.write_fixed64(*n),
            (ScalarKind::Double, Value::F64(f)) => writer.write_fixed64(f.to_bits()),
            (ScalarKind::Float, Value::F32(f)) => writer.write_fixed32(f.to_bits()),
            (ScalarKind::Bool, Value::Bool(b)) => writer.write_varint(u64::from(*b)),
            (ScalarKind::String, Value::Str(s)) => writer.write_length_delimited(s.as_bytes()),
            (ScalarKind::Bytes, Value::Bytes(b)) => writer.write_length_delimited(b),
            (ScalarKind::Message, Value::Message(m)) => {
                // Built tables always carry a message type.
                let nested = field
                    .message_type
                    .as_deref()
                    .ok_or(EncodeError::UnknownField(field.number))?;
                let mut inner = WireWriter::new();
                self.write_message(&mut inner, m, nested)?;
                writer.write_length_delimited(inner.as_slice());
            }
            _ => return Err(mismatch(field, value)),
        }
        Ok(())
    }
}

fn check_kind(field: &FieldDescriptor, value: &Value) -> Result<(), EncodeError> {
    if field.kind.accepts(value) {
        Ok(())
    } else {
        Err(mismatch(field, value))
    }
}

fn mismatch(field: &FieldDescriptor, value: &Value) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.number,
        expected: field.kind,
        found: value.type_name(),
    }
}
