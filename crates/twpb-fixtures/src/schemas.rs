//! Descriptor tables for the fixture messages.
//!
//! The tables mirror these proto3 definitions:
//!
//! ```text
//! message SuperSimple {
//!   string serial_number = 1; string firmware_version = 2;
//!   string vendor = 3; string product = 4;
//! }
//! message Message {
//!   oneof content { SuperSimple ss = 1; string test = 3; }
//!   string something_else = 5;
//! }
//! package api;    message Message { oneof content { v1.Request v1_request = 1; v1.Response v1_response = 2; } }
//! package api.v1; message Request { oneof request { EmptyRequest getInfo = 1; EmptyRequest getOtherThing = 2; } }
//!                 message Response { oneof response { SysInfo info = 1; OtherThing other_thing = 2; } }
//! message SimpleTypes { int32 int32 = 1; ... bytes bytes = 15; }
//! message RepeatedTypes { repeated int32 int32 = 1; ... repeated bytes bytes = 15;
//!                         repeated int32 int32_notpacked = 16 [packed = false]; }
//! ```

use std::sync::Arc;

use twpb::{DescriptorError, FieldDescriptor, MessageDescriptor, ScalarKind};

/// Field numbers 1 to 15 of `SimpleTypes` and `RepeatedTypes`, in order.
const TYPE_FIELDS: [(&str, ScalarKind); 15] = [
    ("int32", ScalarKind::Int32),
    ("int64", ScalarKind::Int64),
    ("uint32", ScalarKind::UInt32),
    ("uint64", ScalarKind::UInt64),
    ("sint32", ScalarKind::SInt32),
    ("sint64", ScalarKind::SInt64),
    ("fixed32", ScalarKind::Fixed32),
    ("fixed64", ScalarKind::Fixed64),
    ("sfixed32", ScalarKind::SFixed32),
    ("sfixed64", ScalarKind::SFixed64),
    ("double", ScalarKind::Double),
    ("float", ScalarKind::Float),
    ("bool", ScalarKind::Bool),
    ("string", ScalarKind::String),
    ("bytes", ScalarKind::Bytes),
];

/// Every fixture schema, built and validated.
#[derive(Debug, Clone)]
pub struct Schemas {
    pub super_simple: Arc<MessageDescriptor>,
    pub message: Arc<MessageDescriptor>,
    pub api_message: Arc<MessageDescriptor>,
    pub v1_request: Arc<MessageDescriptor>,
    pub v1_response: Arc<MessageDescriptor>,
    pub empty_request: Arc<MessageDescriptor>,
    pub sys_info: Arc<MessageDescriptor>,
    pub other_thing: Arc<MessageDescriptor>,
    pub simple_types: Arc<MessageDescriptor>,
    pub repeated_types: Arc<MessageDescriptor>,
}

impl Schemas {
    pub fn load() -> Result<Self, DescriptorError> {
        let super_simple = MessageDescriptor::builder("SuperSimple")
            .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
            .field(FieldDescriptor::new(2, "firmware_version", ScalarKind::String))
            .field(FieldDescriptor::new(3, "vendor", ScalarKind::String))
            .field(FieldDescriptor::new(4, "product", ScalarKind::String))
            .build()?;

        let message = MessageDescriptor::builder("Message")
            .oneof(0, "content")
            .field(FieldDescriptor::message(1, "ss", super_simple.clone()).in_oneof(0))
            .field(FieldDescriptor::new(3, "test", ScalarKind::String).in_oneof(0))
            .field(FieldDescriptor::new(5, "something_else", ScalarKind::String))
            .build()?;

        let empty_request = MessageDescriptor::builder("api.v1.EmptyRequest").build()?;
        let sys_info = MessageDescriptor::builder("api.v1.SysInfo")
            .field(FieldDescriptor::new(1, "serial_number", ScalarKind::String))
            .field(FieldDescriptor::new(2, "firmware_version", ScalarKind::String))
            .field(FieldDescriptor::new(3, "vendor", ScalarKind::String))
            .field(FieldDescriptor::new(4, "product", ScalarKind::String))
            .build()?;
        let other_thing = MessageDescriptor::builder("api.v1.OtherThing")
            .field(FieldDescriptor::new(1, "other", ScalarKind::String))
            .build()?;

        let v1_request = MessageDescriptor::builder("api.v1.Request")
            .oneof(0, "request")
            .field(FieldDescriptor::message(1, "getInfo", empty_request.clone()).in_oneof(0))
            .field(FieldDescriptor::message(2, "getOtherThing", empty_request.clone()).in_oneof(0))
            .build()?;
        let v1_response = MessageDescriptor::builder("api.v1.Response")
            .oneof(0, "response")
            .field(FieldDescriptor::message(1, "info", sys_info.clone()).in_oneof(0))
            .field(FieldDescriptor::message(2, "other_thing", other_thing.clone()).in_oneof(0))
            .build()?;
        let api_message = MessageDescriptor::builder("api.Message")
            .oneof(0, "content")
            .field(FieldDescriptor::message(1, "v1_request", v1_request.clone()).in_oneof(0))
            .field(FieldDescriptor::message(2, "v1_response", v1_response.clone()).in_oneof(0))
            .build()?;

        let simple_types = TYPE_FIELDS
            .iter()
            .zip(1..)
            .fold(MessageDescriptor::builder("SimpleTypes"), |builder, ((name, kind), number)| {
                builder.field(FieldDescriptor::new(number, *name, *kind))
            })
            .build()?;

        let repeated_types = TYPE_FIELDS
            .iter()
            .zip(1..)
            .fold(MessageDescriptor::builder("RepeatedTypes"), |builder, ((name, kind), number)| {
                let field = FieldDescriptor::new(number, *name, *kind);
                let field = if kind.is_packable() {
                    field.packed()
                } else {
                    field.repeated()
                };
                builder.field(field)
            })
            .field(FieldDescriptor::new(16, "int32_notpacked", ScalarKind::Int32).repeated())
            .build()?;

        Ok(Self {
            super_simple,
            message,
            api_message,
            v1_request,
            v1_response,
            empty_request,
            sys_info,
            other_thing,
            simple_types,
            repeated_types,
        })
    }
}
