//! Error types for decoding, encoding and descriptor construction.

use twpb_buffers::BufferError;

use crate::descriptor::ScalarKind;

/// Structural decode failure. Any of these aborts the decode of the whole
/// message; no partial value is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    TruncatedInput,
    #[error("malformed input: {0}")]
    Malformed(Malformed),
    #[error("invalid wire type {wire_type} for field {field_number}")]
    InvalidWireType { field_number: u32, wire_type: u8 },
    #[error("group wire type at field {0} is not supported")]
    UnterminatedGroup(u32),
    #[error("message nesting exceeds the recursion limit of {0}")]
    RecursionLimitExceeded(usize),
}

/// Detail of a [`DecodeError::Malformed`] failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("varint exceeds 64 bits")]
    VarintOverflow,
    #[error("tag exceeds 32 bits")]
    TagOverflow,
    #[error("field number 0 is reserved")]
    FieldNumberZero,
    #[error("negative length prefix")]
    NegativeLength,
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}

impl From<Malformed> for DecodeError {
    fn from(m: Malformed) -> Self {
        DecodeError::Malformed(m)
    }
}

impl From<BufferError> for DecodeError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::EndOfBuffer => DecodeError::TruncatedInput,
            BufferError::InvalidUtf8 => DecodeError::Malformed(Malformed::InvalidUtf8),
        }
    }
}

/// Programmer error while building or encoding a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("type mismatch for field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: u32,
        expected: ScalarKind,
        found: &'static str,
    },
    #[error("field {0} is not declared in the descriptor")]
    UnknownField(u32),
    #[error("field {0} is not a oneof member")]
    NotAOneofMember(u32),
    #[error("oneof group {group} has both field {first} and field {second} set")]
    OneofConflict { group: u32, first: u32, second: u32 },
    #[error("output buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Invalid descriptor table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("{message}: field number {number} is out of range")]
    InvalidFieldNumber { message: String, number: u32 },
    #[error("{message}: field number {number} is declared twice")]
    DuplicateField { message: String, number: u32 },
    #[error("{message}: field {number} is packed but not repeated")]
    PackedNotRepeated { message: String, number: u32 },
    #[error("{message}: field {number} of kind {kind} cannot be packed")]
    NotPackable {
        message: String,
        number: u32,
        kind: ScalarKind,
    },
    #[error("{message}: oneof member {number} cannot be repeated")]
    RepeatedOneofMember { message: String, number: u32 },
    #[error("{message}: field {number} refers to undeclared oneof group {group}")]
    UndeclaredOneof {
        message: String,
        number: u32,
        group: u32,
    },
    #[error("{message}: oneof group {group} is declared twice")]
    DuplicateOneof { message: String, group: u32 },
    #[error("{message}: message field {number} has no message type")]
    MissingMessageType { message: String, number: u32 },
    #[error("{message}: non-message field {number} has a message type")]
    UnexpectedMessageType { message: String, number: u32 },
}
