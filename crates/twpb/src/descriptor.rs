//! Field descriptor tables.
//!
//! A [`MessageDescriptor`] is the resolved schema of one message type: its
//! fields keyed by number and its oneof groups. Tables are built once through
//! [`MessageDescriptorBuilder`], validated, and then shared read-only behind
//! an [`Arc`], so any number of threads may decode against the same table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DescriptorError;
use crate::value::Value;
use crate::wire::{WireType, MAX_FIELD_NUMBER};

/// Declared protobuf type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Double,
    Float,
    Bool,
    Enum,
    String,
    Bytes,
    Message,
}

impl ScalarKind {
    /// Wire type of a single (unpacked) value of this kind.
    pub fn wire_type(self) -> WireType {
        match self {
            ScalarKind::Int32
            | ScalarKind::Int64
            | ScalarKind::UInt32
            | ScalarKind::UInt64
            | ScalarKind::SInt32
            | ScalarKind::SInt64
            | ScalarKind::Bool
            | ScalarKind::Enum => WireType::Varint,
            ScalarKind::Fixed64 | ScalarKind::SFixed64 | ScalarKind::Double => WireType::Fixed64,
            ScalarKind::Fixed32 | ScalarKind::SFixed32 | ScalarKind::Float => WireType::Fixed32,
            ScalarKind::String | ScalarKind::Bytes | ScalarKind::Message => {
                WireType::LengthDelimited
            }
        }
    }

    /// Whether repeated values of this kind may use packed encoding.
    pub fn is_packable(self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Proto3 zero value. Messages have none.
    pub fn default_value(self) -> Option<Value> {
        let value = match self {
            ScalarKind::Int32 | ScalarKind::SInt32 | ScalarKind::SFixed32 | ScalarKind::Enum => {
                Value::I32(0)
            }
            ScalarKind::Int64 | ScalarKind::SInt64 | ScalarKind::SFixed64 => Value::I64(0),
            ScalarKind::UInt32 | ScalarKind::Fixed32 => Value::U32(0),
            ScalarKind::UInt64 | ScalarKind::Fixed64 => Value::U64(0),
            ScalarKind::Double => Value::F64(0.0),
            ScalarKind::Float => Value::F32(0.0),
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::String => Value::Str(String::new()),
            ScalarKind::Bytes => Value::Bytes(Vec::new()),
            ScalarKind::Message => return None,
        };
        Some(value)
    }

    /// Whether `value` is the in-memory representation of a single value of
    /// this kind.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (
                ScalarKind::Int32 | ScalarKind::SInt32 | ScalarKind::SFixed32 | ScalarKind::Enum,
                Value::I32(_)
            ) | (
                ScalarKind::Int64 | ScalarKind::SInt64 | ScalarKind::SFixed64,
                Value::I64(_)
            ) | (ScalarKind::UInt32 | ScalarKind::Fixed32, Value::U32(_))
                | (ScalarKind::UInt64 | ScalarKind::Fixed64, Value::U64(_))
                | (ScalarKind::Double, Value::F64(_))
                | (ScalarKind::Float, Value::F32(_))
                | (ScalarKind::Bool, Value::Bool(_))
                | (ScalarKind::String, Value::Str(_))
                | (ScalarKind::Bytes, Value::Bytes(_))
                | (ScalarKind::Message, Value::Message(_))
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::UInt32 => "uint32",
            ScalarKind::UInt64 => "uint64",
            ScalarKind::SInt32 => "sint32",
            ScalarKind::SInt64 => "sint64",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::SFixed32 => "sfixed32",
            ScalarKind::SFixed64 => "sfixed64",
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Enum => "enum",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Message => "message",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field of a message type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: String,
    pub kind: ScalarKind,
    pub repeated: bool,
    pub packed: bool,
    pub oneof_group: Option<u32>,
    pub message_type: Option<Arc<MessageDescriptor>>,
}

impl FieldDescriptor {
    /// A singular scalar field.
    pub fn new(number: u32, name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            number,
            name: name.into(),
            kind,
            repeated: false,
            packed: false,
            oneof_group: None,
            message_type: None,
        }
    }

    /// A singular embedded-message field.
    pub fn message(number: u32, name: impl Into<String>, message_type: Arc<MessageDescriptor>) -> Self {
        Self {
            message_type: Some(message_type),
            ..Self::new(number, name, ScalarKind::Message)
        }
    }

    /// Marks the field repeated (unpacked).
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Marks the field repeated and packed.
    pub fn packed(mut self) -> Self {
        self.repeated = true;
        self.packed = true;
        self
    }

    /// Places the field in oneof group `group`.
    pub fn in_oneof(mut self, group: u32) -> Self {
        self.oneof_group = Some(group);
        self
    }

    /// Whether absence is observable (oneof members and embedded messages).
    /// Other singular fields read as their zero value when absent.
    pub fn has_presence(&self) -> bool {
        !self.repeated && (self.oneof_group.is_some() || self.kind == ScalarKind::Message)
    }
}

/// A oneof group: at most one of `members` may be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofDescriptor {
    pub id: u32,
    pub name: String,
    pub members: Vec<u32>,
}

/// Resolved schema of one message type.
#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    name: String,
    fields: BTreeMap<u32, FieldDescriptor>,
    oneofs: BTreeMap<u32, OneofDescriptor>,
}

impl MessageDescriptor {
    pub fn builder(name: impl Into<String>) -> MessageDescriptorBuilder {
        MessageDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.get(&number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.values().find(|f| f.name == name)
    }

    /// Fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn oneof(&self, id: u32) -> Option<&OneofDescriptor> {
        self.oneofs.get(&id)
    }

    pub fn oneof_by_name(&self, name: &str) -> Option<&OneofDescriptor> {
        self.oneofs.values().find(|o| o.name == name)
    }

    pub fn oneofs(&self) -> impl Iterator<Item = &OneofDescriptor> {
        self.oneofs.values()
    }
}

/// Collects fields and oneof groups, then validates them in
/// [`build`](Self::build).
///
/// ```
/// use twpb::{FieldDescriptor, MessageDescriptor, ScalarKind};
///
/// let simple = MessageDescriptor::builder("SuperSimple")
///     .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
///     .field(FieldDescriptor::new(2, "firmware_version", ScalarKind::String))
///     .build()
///     .unwrap();
/// assert_eq!(simple.field(2).unwrap().name, "firmware_version");
/// ```
#[derive(Debug, Clone)]
pub struct MessageDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    oneofs: Vec<(u32, String)>,
}

impl MessageDescriptorBuilder {
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares oneof group `id`.
    pub fn oneof(mut self, id: u32, name: impl Into<String>) -> Self {
        self.oneofs.push((id, name.into()));
        self
    }

    pub fn build(self) -> Result<Arc<MessageDescriptor>, DescriptorError> {
        let message = self.name;
        let mut oneofs = BTreeMap::new();
        for (id, name) in self.oneofs {
            let group = OneofDescriptor {
                id,
                name,
                members: Vec::new(),
            };
            if oneofs.insert(id, group).is_some() {
                return Err(DescriptorError::DuplicateOneof {
                    message,
                    group: id,
                });
            }
        }

        let mut fields = BTreeMap::new();
        for field in self.fields {
            let number = field.number;
            if number == 0 || number > MAX_FIELD_NUMBER {
                return Err(DescriptorError::InvalidFieldNumber { message, number });
            }
            if field.packed && !field.repeated {
                return Err(DescriptorError::PackedNotRepeated { message, number });
            }
            if field.packed && !field.kind.is_packable() {
                return Err(DescriptorError::NotPackable {
                    message,
                    number,
                    kind: field.kind,
                });
            }
            match (field.kind == ScalarKind::Message, field.message_type.is_some()) {
                (true, false) => {
                    return Err(DescriptorError::MissingMessageType { message, number })
                }
                (false, true) => {
                    return Err(DescriptorError::UnexpectedMessageType { message, number })
                }
                _ => {}
            }
            if let Some(group) = field.oneof_group {
                if field.repeated {
                    return Err(DescriptorError::RepeatedOneofMember { message, number });
                }
                match oneofs.get_mut(&group) {
                    Some(oneof) => oneof.members.push(number),
                    None => {
                        return Err(DescriptorError::UndeclaredOneof {
                            message,
                            number,
                            group,
                        })
                    }
                }
            }
            if fields.insert(number, field).is_some() {
                return Err(DescriptorError::DuplicateField { message, number });
            }
        }
        for oneof in oneofs.values_mut() {
            oneof.members.sort_unstable();
        }

        Ok(Arc::new(MessageDescriptor {
            name: message,
            fields,
            oneofs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Arc<MessageDescriptor> {
        MessageDescriptor::builder("Empty").build().unwrap()
    }

    #[test]
    fn builds_oneof_membership() {
        let desc = MessageDescriptor::builder("Message")
            .oneof(0, "content")
            .field(FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0))
            .field(FieldDescriptor::message(1, "ss", empty()).in_oneof(0))
            .field(FieldDescriptor::new(5, "something_else", ScalarKind::String))
            .build()
            .unwrap();
        assert_eq!(desc.oneof(0).unwrap().members, vec![1, 3]);
        assert_eq!(desc.oneof_by_name("content").unwrap().id, 0);
        let numbers: Vec<u32> = desc.fields().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 3, 5]);
        assert!(desc.field(1).unwrap().has_presence());
        assert!(desc.field(3).unwrap().has_presence());
        assert!(!desc.field(5).unwrap().has_presence());
    }

    #[test]
    fn rejects_field_number_zero_and_overflow() {
        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(0, "a", ScalarKind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidFieldNumber { number: 0, .. }));

        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(MAX_FIELD_NUMBER + 1, "a", ScalarKind::Int32))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidFieldNumber { .. }));
    }

    #[test]
    fn rejects_duplicates() {
        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(1, "a", ScalarKind::Int32))
            .field(FieldDescriptor::new(1, "b", ScalarKind::Int64))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateField { number: 1, .. }));

        let err = MessageDescriptor::builder("M")
            .oneof(0, "a")
            .oneof(0, "b")
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateOneof { group: 0, .. }));
    }

    #[test]
    fn rejects_invalid_packing() {
        let mut field = FieldDescriptor::new(1, "a", ScalarKind::Int32);
        field.packed = true;
        let err = MessageDescriptor::builder("M").field(field).build().unwrap_err();
        assert!(matches!(err, DescriptorError::PackedNotRepeated { .. }));

        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(1, "a", ScalarKind::String).packed())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::NotPackable {
                kind: ScalarKind::String,
                ..
            }
        ));
    }

    #[test]
    fn rejects_bad_oneof_members() {
        let err = MessageDescriptor::builder("M")
            .oneof(0, "o")
            .field(FieldDescriptor::new(1, "a", ScalarKind::Int32).repeated().in_oneof(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::RepeatedOneofMember { .. }));

        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(1, "a", ScalarKind::Int32).in_oneof(4))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::UndeclaredOneof { group: 4, .. }));
    }

    #[test]
    fn message_kind_requires_message_type() {
        let err = MessageDescriptor::builder("M")
            .field(FieldDescriptor::new(1, "m", ScalarKind::Message))
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::MissingMessageType { .. }));

        let mut field = FieldDescriptor::new(1, "s", ScalarKind::String);
        field.message_type = Some(empty());
        let err = MessageDescriptor::builder("M").field(field).build().unwrap_err();
        assert!(matches!(err, DescriptorError::UnexpectedMessageType { .. }));
    }

    #[test]
    fn kind_wire_types() {
        assert_eq!(ScalarKind::SInt64.wire_type(), WireType::Varint);
        assert_eq!(ScalarKind::Double.wire_type(), WireType::Fixed64);
        assert_eq!(ScalarKind::Float.wire_type(), WireType::Fixed32);
        assert_eq!(ScalarKind::Bytes.wire_type(), WireType::LengthDelimited);
        assert!(ScalarKind::Bool.is_packable());
        assert!(!ScalarKind::Message.is_packable());
    }

    #[test]
    fn kind_accepts_values() {
        assert!(ScalarKind::SFixed32.accepts(&Value::I32(-1)));
        assert!(!ScalarKind::SFixed32.accepts(&Value::U32(1)));
        assert!(ScalarKind::Fixed64.accepts(&Value::U64(1)));
        assert!(!ScalarKind::String.accepts(&Value::Bytes(vec![])));
        assert_eq!(ScalarKind::Message.default_value(), None);
        assert_eq!(ScalarKind::Enum.default_value(), Some(Value::I32(0)));
    }

    #[test]
    fn descriptor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arc<MessageDescriptor>>();
    }
}
