//! In-memory message values.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::wire::WireType;

/// A field value. The field's [`ScalarKind`](crate::ScalarKind) decides how
/// it is encoded; the variant only says which Rust type holds it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// int32, sint32, sfixed32, enum
    I32(i32),
    /// int64, sint64, sfixed64
    I64(i64),
    /// uint32, fixed32
    U32(u32),
    /// uint64, fixed64
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Message(MessageValue),
    /// Elements of a repeated field, in wire order.
    List(Vec<Value>),
}

impl Value {
    /// Builds a repeated value from anything convertible into elements.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Message(_) => "message",
            Value::List(_) => "list",
        }
    }

    /// Whether this is the proto3 zero value of its type. Messages never are.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::I32(n) => *n == 0,
            Value::I64(n) => *n == 0,
            Value::U32(n) => *n == 0,
            Value::U64(n) => *n == 0,
            // -0.0 is not the default.
            Value::F32(f) => f.to_bits() == 0,
            Value::F64(f) => f.to_bits() == 0,
            Value::Str(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Message(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
    Vec<u8> => Bytes,
    MessageValue => Message,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

/// A field the descriptor table does not know, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    pub number: u32,
    pub wire_type: WireType,
    /// Tag and payload exactly as read.
    pub raw: Vec<u8>,
}

/// A decoded or caller-built message: field number to value, plus any
/// unknown fields captured during decode.
///
/// The value itself is schema-free; presence-aware reads and oneof handling
/// take the [`MessageDescriptor`] as a parameter.
///
/// ```
/// use twpb::{MessageValue, Value};
///
/// let msg = MessageValue::new()
///     .with(1, "serial")
///     .with(4, Value::list([4i32, -300]));
/// assert_eq!(msg.get(1).and_then(Value::as_str), Some("serial"));
/// assert!(!msg.has(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValue {
    fields: BTreeMap<u32, Value>,
    unknown: Vec<UnknownField>,
}

impl MessageValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, number: u32, value: impl Into<Value>) -> Self {
        self.fields.insert(number, value.into());
        self
    }

    /// Stores `value` under `number`, returning the previous value.
    ///
    /// This does not look at oneof groups; use
    /// [`OneofResolver::set_member`](crate::OneofResolver::set_member) for
    /// oneof members.
    pub fn set(&mut self, number: u32, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(number, value.into())
    }

    /// Appends to the repeated field `number`, creating it if absent. A
    /// singular value already stored there becomes the first element.
    pub fn push(&mut self, number: u32, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.get_mut(&number) {
            Some(Value::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, Value::List(Vec::new()));
                *existing = Value::List(vec![first, value]);
            }
            None => {
                self.fields.insert(number, Value::List(vec![value]));
            }
        }
    }

    pub fn get(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.fields.get_mut(&number)
    }

    pub fn remove(&mut self, number: u32) -> Option<Value> {
        self.fields.remove(&number)
    }

    pub fn has(&self, number: u32) -> bool {
        self.fields.contains_key(&number)
    }

    /// Present fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no known and no unknown field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.unknown.is_empty()
    }

    pub fn unknown_fields(&self) -> &[UnknownField] {
        &self.unknown
    }

    pub fn push_unknown(&mut self, field: UnknownField) {
        self.unknown.push(field);
    }

    pub(crate) fn take_parts(self) -> (BTreeMap<u32, Value>, Vec<UnknownField>) {
        (self.fields, self.unknown)
    }

    /// Reads `field` with proto3 default semantics.
    ///
    /// Present fields return their value. Absent repeated fields read as an
    /// empty list and absent implicit-presence scalars as their zero value.
    /// Absent oneof members and embedded messages return `None`, so "set to
    /// zero" and "not set" stay distinguishable where presence matters.
    pub fn value_or_default(&self, field: &FieldDescriptor) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.fields.get(&field.number) {
            return Some(Cow::Borrowed(value));
        }
        if field.repeated {
            return Some(Cow::Owned(Value::List(Vec::new())));
        }
        if field.has_presence() {
            return None;
        }
        field.kind.default_value().map(Cow::Owned)
    }

    /// [`value_or_default`](Self::value_or_default) by field name.
    pub fn value_by_name(
        &self,
        descriptor: &MessageDescriptor,
        name: &str,
    ) -> Option<Cow<'_, Value>> {
        let field = descriptor.field_by_name(name)?;
        self.value_or_default(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ScalarKind;

    #[test]
    fn set_returns_previous() {
        let mut msg = MessageValue::new();
        assert_eq!(msg.set(1, 5i32), None);
        assert_eq!(msg.set(1, 6i32), Some(Value::I32(5)));
        assert_eq!(msg.get(1), Some(&Value::I32(6)));
    }

    #[test]
    fn push_builds_lists() {
        let mut msg = MessageValue::new();
        msg.push(3, 1u32);
        msg.push(3, 2u32);
        assert_eq!(msg.get(3), Some(&Value::list([1u32, 2])));

        msg.set(4, "a");
        msg.push(4, "b");
        assert_eq!(msg.get(4), Some(&Value::list(["a", "b"])));
    }

    #[test]
    fn defaults_for_absent_fields() {
        let msg = MessageValue::new();
        let plain = FieldDescriptor::new(5, "something_else", ScalarKind::String);
        assert_eq!(
            msg.value_or_default(&plain).as_deref(),
            Some(&Value::Str(String::new()))
        );

        let member = FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0);
        assert_eq!(msg.value_or_default(&member), None);

        let list = FieldDescriptor::new(1, "int32", ScalarKind::Int32).packed();
        assert_eq!(
            msg.value_or_default(&list).as_deref(),
            Some(&Value::List(vec![]))
        );
    }

    #[test]
    fn explicit_zero_is_present() {
        let msg = MessageValue::new().with(3, "");
        let member = FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0);
        assert_eq!(
            msg.value_or_default(&member).as_deref(),
            Some(&Value::Str(String::new()))
        );
    }

    #[test]
    fn default_detection() {
        assert!(Value::F64(0.0).is_default());
        assert!(!Value::F64(-0.0).is_default());
        assert!(Value::Str(String::new()).is_default());
        assert!(!Value::Message(MessageValue::new()).is_default());
        assert!(!Value::Bool(true).is_default());
    }

    #[test]
    fn accessors() {
        let v = Value::from("🐉");
        assert_eq!(v.as_str(), Some("🐉"));
        assert_eq!(v.as_bytes(), None);
        assert_eq!(Value::from(&b"ASDF"[..]).as_bytes(), Some(&b"ASDF"[..]));
        assert_eq!(Value::from(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Value::list([true, false]).as_list().map(<[Value]>::len), Some(2));
    }
}
