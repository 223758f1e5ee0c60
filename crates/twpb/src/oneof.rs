//! At-most-one-member semantics for oneof groups.
//!
//! Which member is active is not stored anywhere; it is whichever member
//! field is present in the [`MessageValue`]. Every write that goes through
//! the resolver removes the siblings first, so at most one is ever present.

use tracing::debug;

use crate::descriptor::MessageDescriptor;
use crate::error::EncodeError;
use crate::value::{MessageValue, Value};

/// Oneof operations for messages of one type.
///
/// ```
/// use twpb::{FieldDescriptor, MessageDescriptor, MessageValue, OneofResolver, ScalarKind, Value};
///
/// let desc = MessageDescriptor::builder("Message")
///     .oneof(0, "content")
///     .field(FieldDescriptor::new(2, "name", ScalarKind::String).in_oneof(0))
///     .field(FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0))
///     .build()
///     .unwrap();
/// let resolver = OneofResolver::new(&desc);
///
/// let mut msg = MessageValue::new();
/// resolver.set_member(&mut msg, 2, "first").unwrap();
/// let displaced = resolver.set_member(&mut msg, 3, "second").unwrap();
/// assert_eq!(displaced, Some((2, Value::from("first"))));
/// assert_eq!(resolver.active_member(&msg, 0), Some(3));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OneofResolver<'d> {
    descriptor: &'d MessageDescriptor,
}

impl<'d> OneofResolver<'d> {
    pub fn new(descriptor: &'d MessageDescriptor) -> Self {
        Self { descriptor }
    }

    /// The member of `group` currently present, if any.
    pub fn active_member(&self, message: &MessageValue, group: u32) -> Option<u32> {
        let oneof = self.descriptor.oneof(group)?;
        oneof.members.iter().copied().find(|n| message.has(*n))
    }

    /// Sets oneof member `field_number` to `value`, clearing its siblings.
    ///
    /// Returns the previously active member and its value, which may be the
    /// same field number when a member is overwritten.
    pub fn set_member(
        &self,
        message: &mut MessageValue,
        field_number: u32,
        value: impl Into<Value>,
    ) -> Result<Option<(u32, Value)>, EncodeError> {
        let field = self
            .descriptor
            .field(field_number)
            .ok_or(EncodeError::UnknownField(field_number))?;
        let group = field
            .oneof_group
            .ok_or(EncodeError::NotAOneofMember(field_number))?;
        let value = value.into();
        if !field.kind.accepts(&value) {
            return Err(EncodeError::TypeMismatch {
                field: field_number,
                expected: field.kind,
                found: value.type_name(),
            });
        }
        Ok(self.install(message, field_number, group, value))
    }

    /// Removes whichever member of `group` is present.
    pub fn clear(&self, message: &mut MessageValue, group: u32) -> Option<(u32, Value)> {
        let active = self.active_member(message, group)?;
        message.remove(active).map(|value| (active, value))
    }

    /// Fails if any group has more than one member present, which can only
    /// happen when members were written with plain [`MessageValue::set`].
    pub fn check(&self, message: &MessageValue) -> Result<(), EncodeError> {
        for oneof in self.descriptor.oneofs() {
            let mut present = oneof.members.iter().copied().filter(|n| message.has(*n));
            if let (Some(first), Some(second)) = (present.next(), present.next()) {
                return Err(EncodeError::OneofConflict {
                    group: oneof.id,
                    first,
                    second,
                });
            }
        }
        Ok(())
    }

    /// Stores an already validated member value.
    pub(crate) fn install(
        &self,
        message: &mut MessageValue,
        field_number: u32,
        group: u32,
        value: Value,
    ) -> Option<(u32, Value)> {
        let mut displaced = None;
        if let Some(oneof) = self.descriptor.oneof(group) {
            for &sibling in &oneof.members {
                if sibling == field_number {
                    continue;
                }
                if let Some(old) = message.remove(sibling) {
                    debug!(
                        message_type = self.descriptor.name(),
                        oneof = %oneof.name,
                        displaced = sibling,
                        by = field_number,
                        "oneof member replaced"
                    );
                    displaced = Some((sibling, old));
                }
            }
        }
        let previous = message.set(field_number, value);
        displaced.or_else(|| previous.map(|old| (field_number, old)))
    }
}
