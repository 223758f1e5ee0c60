//! Table-driven protocol buffers wire codec.
//!
//! Messages are described by [`MessageDescriptor`] tables built at runtime
//! and encoded or decoded as [`MessageValue`]s. Output is bit-compatible with
//! standard proto3 serializers: ascending field order, packed numeric
//! repeated fields, zero-valued implicit-presence scalars omitted.
//!
//! ```
//! use twpb::{FieldDescriptor, MessageDescriptor, MessageValue, ScalarKind, Value};
//!
//! let desc = MessageDescriptor::builder("SuperSimple")
//!     .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
//!     .build()
//!     .unwrap();
//! let bytes = twpb::encode(&MessageValue::new().with(1, "serial"), &desc).unwrap();
//! let back = twpb::decode(&bytes, &desc).unwrap();
//! assert_eq!(back.get(1), Some(&Value::from("serial")));
//! ```

mod decoder;
mod descriptor;
mod encoder;
mod error;
mod oneof;
mod options;
mod value;

pub mod merge;
pub mod varint;
pub mod wire;

pub use decoder::MessageDecoder;
pub use descriptor::{
    FieldDescriptor, MessageDescriptor, MessageDescriptorBuilder, OneofDescriptor, ScalarKind,
};
pub use encoder::MessageEncoder;
pub use error::{DecodeError, DescriptorError, EncodeError, Malformed};
pub use oneof::OneofResolver;
pub use options::{CodecOptions, EmbeddedMerge, DEFAULT_RECURSION_LIMIT};
pub use value::{MessageValue, UnknownField, Value};

/// Decodes `data` with default [`CodecOptions`].
pub fn decode(data: &[u8], descriptor: &MessageDescriptor) -> Result<MessageValue, DecodeError> {
    MessageDecoder::new().decode(data, descriptor)
}

/// Encodes `message` with default [`CodecOptions`].
pub fn encode(message: &MessageValue, descriptor: &MessageDescriptor) -> Result<Vec<u8>, EncodeError> {
    MessageEncoder::new().encode(message, descriptor)
}
