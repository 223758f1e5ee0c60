//! Field-wise merge of two message values.

use tracing::debug;

use crate::descriptor::MessageDescriptor;
use crate::oneof::OneofResolver;
use crate::options::{CodecOptions, EmbeddedMerge};
use crate::value::{MessageValue, Value};

/// Merges `other` into `target` the way a protobuf parser combines two
/// encodings of the same message.
///
/// Singular scalars in `other` overwrite, repeated fields append, embedded
/// messages merge recursively (or are replaced under
/// [`EmbeddedMerge::LastWins`]), and a oneof member in `other` displaces
/// whichever sibling `target` holds. Unknown fields are appended.
///
/// ```
/// use twpb::merge::merge_message;
/// use twpb::{CodecOptions, FieldDescriptor, MessageDescriptor, MessageValue, ScalarKind, Value};
///
/// let desc = MessageDescriptor::builder("M")
///     .field(FieldDescriptor::new(1, "name", ScalarKind::String))
///     .field(FieldDescriptor::new(2, "ids", ScalarKind::UInt32).packed())
///     .build()
///     .unwrap();
/// let mut target = MessageValue::new().with(1, "a").with(2, Value::list([1u32]));
/// let other = MessageValue::new().with(1, "b").with(2, Value::list([2u32]));
/// merge_message(&mut target, other, &desc, &CodecOptions::default());
/// assert_eq!(target.get(1), Some(&Value::from("b")));
/// assert_eq!(target.get(2), Some(&Value::list([1u32, 2])));
/// ```
pub fn merge_message(
    target: &mut MessageValue,
    other: MessageValue,
    descriptor: &MessageDescriptor,
    options: &CodecOptions,
) {
    let resolver = OneofResolver::new(descriptor);
    let (fields, unknown) = other.take_parts();
    for (number, value) in fields {
        let Some(field) = descriptor.field(number) else {
            target.set(number, value);
            continue;
        };

        let value = match (target.remove(number), value) {
            (Some(Value::List(mut items)), Value::List(more)) if field.repeated => {
                items.extend(more);
                Value::List(items)
            }
            (Some(Value::Message(mut existing)), Value::Message(incoming))
                if options.embedded_merge == EmbeddedMerge::Merge =>
            {
                match field.message_type.as_deref() {
                    Some(nested) => {
                        debug!(
                            message_type = descriptor.name(),
                            field = number,
                            "merging embedded message"
                        );
                        merge_message(&mut existing, incoming, nested, options);
                        Value::Message(existing)
                    }
                    None => Value::Message(incoming),
                }
            }
            (_, value) => value,
        };

        match field.oneof_group {
            Some(group) => {
                resolver.install(target, number, group, value);
            }
            None => {
                target.set(number, value);
            }
        }
    }
    for field in unknown {
        target.push_unknown(field);
    }
}
