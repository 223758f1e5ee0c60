//! Reference messages written to and checked against the fixture files.

use std::sync::Arc;

use twpb::{MessageDescriptor, MessageValue, OneofResolver, Value};

use crate::error::FixtureError;
use crate::schemas::Schemas;

/// One fixture file: its name, schema and the message it holds.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub file_name: &'static str,
    pub descriptor: Arc<MessageDescriptor>,
    pub message: MessageValue,
}

impl Fixture {
    pub fn encode(&self) -> Result<Vec<u8>, FixtureError> {
        twpb::encode(&self.message, &self.descriptor).map_err(|source| FixtureError::Encode {
            file: self.file_name.to_string(),
            source,
        })
    }

    /// Decodes `bytes` and compares every declared field, recursively,
    /// against the expected message. Unknown fields count as a mismatch.
    pub fn verify(&self, bytes: &[u8]) -> Result<(), FixtureError> {
        let decoded = twpb::decode(bytes, &self.descriptor).map_err(|source| FixtureError::Decode {
            file: self.file_name.to_string(),
            source,
        })?;
        compare(&self.message, &decoded, &self.descriptor, "").map_err(|m| {
            FixtureError::Mismatch {
                file: self.file_name.to_string(),
                path: m.path,
                expected: m.expected,
                actual: m.actual,
            }
        })
    }
}

struct Mismatch {
    path: String,
    expected: String,
    actual: String,
}

fn compare(
    expected: &MessageValue,
    actual: &MessageValue,
    descriptor: &MessageDescriptor,
    path: &str,
) -> Result<(), Mismatch> {
    for field in descriptor.fields() {
        let path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };
        let want = expected.value_or_default(field);
        let got = actual.value_or_default(field);
        match (want.as_deref(), got.as_deref(), field.message_type.as_deref()) {
            (Some(Value::Message(w)), Some(Value::Message(g)), Some(nested)) => {
                compare(w, g, nested, &path)?
            }
            (w, g, _) if w == g => {}
            (w, g, _) => {
                return Err(Mismatch {
                    path,
                    expected: describe(w),
                    actual: describe(g),
                })
            }
        }
    }
    if let Some(unknown) = actual.unknown_fields().first() {
        return Err(Mismatch {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            expected: "no unknown fields".to_string(),
            actual: format!("unknown field {} ({})", unknown.number, unknown.wire_type),
        });
    }
    Ok(())
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "<unset>".to_string(),
    }
}

fn super_simple_value() -> MessageValue {
    MessageValue::new()
        .with(1, "serial")
        .with(2, "firmware")
        .with(3, "vendor")
        .with(4, "product")
}

/// The fixture set, in the order the generator writes it.
pub fn fixtures(schemas: &Schemas) -> Result<Vec<Fixture>, FixtureError> {
    let oneof_simple = {
        let mut msg = MessageValue::new();
        OneofResolver::new(&schemas.message)
            .set_member(&mut msg, 3, "teststr")
            .map_err(|source| FixtureError::Encode {
                file: "twpb.oneof.simple.bin".to_string(),
                source,
            })?;
        msg
    };

    let oneof_embedded = MessageValue::new()
        .with(1, super_simple_value())
        .with(5, "something else");

    let get_info = MessageValue::new().with(
        1,
        MessageValue::new().with(1, MessageValue::new()),
    );

    let simple_types = MessageValue::new()
        .with(1, -69i32)
        .with(2, i64::MIN)
        .with(3, 42u32)
        .with(4, 1u64)
        .with(5, -69i32)
        .with(6, 69i64)
        .with(7, u32::MAX)
        .with(8, 42u64)
        .with(9, i32::MAX)
        .with(10, i64::MIN + 1)
        .with(11, 1.0f64)
        .with(12, std::f32::consts::PI)
        .with(13, true)
        .with(14, "🐉")
        .with(15, b"ASDF".to_vec());

    let repeated_types = MessageValue::new()
        .with(1, Value::list([4i32, -300]))
        .with(2, Value::list([69i64, -69]))
        .with(3, Value::list([42u32, 420]))
        .with(4, Value::list([42u64, 420]))
        .with(5, Value::list([-69i32, 69]))
        .with(6, Value::list([69i64, -69]))
        .with(7, Value::list([u32::MAX, 1]))
        .with(8, Value::list([42u64, u64::MAX]))
        .with(9, Value::list([i32::MAX, -69]))
        .with(10, Value::list([42i64, -42]))
        .with(11, Value::list([1.0f64, 3.141_592_653_5]))
        .with(12, Value::list([std::f32::consts::PI, 1.0]))
        .with(13, Value::list([true, false]))
        .with(14, Value::list(["🐉", "अरे"]))
        .with(15, Value::list([b"ASDF".to_vec(), b"ABCD".to_vec()]))
        .with(16, Value::list([4i32, -300]));

    Ok(vec![
        Fixture {
            file_name: "twpb.simple.bin",
            descriptor: schemas.super_simple.clone(),
            message: super_simple_value(),
        },
        Fixture {
            file_name: "twpb.oneof.simple.bin",
            descriptor: schemas.message.clone(),
            message: oneof_simple,
        },
        Fixture {
            file_name: "twpb.oneof.embedded.bin",
            descriptor: schemas.message.clone(),
            message: oneof_embedded,
        },
        Fixture {
            file_name: "twpb.api.getInfo.bin",
            descriptor: schemas.api_message.clone(),
            message: get_info,
        },
        Fixture {
            file_name: "twpb.types.simple.bin",
            descriptor: schemas.simple_types.clone(),
            message: simple_types,
        },
        Fixture {
            file_name: "twpb.types.repeated.bin",
            descriptor: schemas.repeated_types.clone(),
            message: repeated_types,
        },
    ])
}
