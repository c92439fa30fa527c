//! Schemas shared by the integration tests.

#![allow(dead_code)]

use protorand::{
    Config, EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor, MessageGenerator,
    ScalarKind, Schema,
};

pub const PROTO3_MESSAGE: &str = "test.Proto3Message";
pub const EMBEDDED_MESSAGE: &str = "test.EmbeddedProto3Message";
pub const PROTO3_ENUM: &str = "test.Proto3Enum";

fn scalar(name: &str, number: u32, kind: ScalarKind) -> FieldDescriptor {
    FieldDescriptor::singular(name, number, FieldKind::Scalar(kind))
}

fn message(name: &str, number: u32, type_name: &str) -> FieldDescriptor {
    FieldDescriptor::singular(name, number, FieldKind::Message(type_name.to_string()))
}

/// Equivalent to:
/// ```protobuf
/// enum Proto3Enum { UNKNOWN = 0; FIRST_VALUE = 1; SECOND_VALUE = 2; }
///
/// message EmbeddedProto3Message {
///     string string_field = 1;
///     Proto3Enum enum_field = 2;
/// }
///
/// message Proto3Message {
///     double double_field = 1;
///     ...one field per scalar kind...
///     Proto3Enum enum_field = 16;
///     google.protobuf.StringValue string_value_field = 17;
///     repeated string repeated_string_field = 18;
///     EmbeddedProto3Message embedded_message = 19;
///     map<string, EmbeddedProto3Message> map_field = 20;
///     oneof oneof_field {
///         uint64 first_choice = 21;
///         string second_choice = 22;
///         EmbeddedProto3Message third_choice = 23;
///     }
/// }
/// ```
pub fn proto3() -> Schema {
    let proto3_enum = EnumDescriptor::new(PROTO3_ENUM)
        .value("UNKNOWN", 0)
        .value("FIRST_VALUE", 1)
        .value("SECOND_VALUE", 2);

    let string_value = MessageDescriptor::new("google.protobuf.StringValue")
        .field(scalar("value", 1, ScalarKind::String));

    let embedded = MessageDescriptor::new(EMBEDDED_MESSAGE)
        .field(scalar("string_field", 1, ScalarKind::String))
        .field(FieldDescriptor::singular(
            "enum_field",
            2,
            FieldKind::Enum(PROTO3_ENUM.to_string()),
        ));

    let mut message3 = MessageDescriptor::new(PROTO3_MESSAGE);
    for (i, kind) in [
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Fixed32,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed32,
        ScalarKind::Sfixed64,
        ScalarKind::Bool,
        ScalarKind::String,
        ScalarKind::Bytes,
    ]
    .into_iter()
    .enumerate()
    {
        let name = format!("{}_field", kind.proto_name());
        message3 = message3.field(scalar(&name, i as u32 + 1, kind));
    }
    let message3 = message3
        .field(FieldDescriptor::singular(
            "enum_field",
            16,
            FieldKind::Enum(PROTO3_ENUM.to_string()),
        ))
        .field(message("string_value_field", 17, "google.protobuf.StringValue"))
        .field(FieldDescriptor::repeated(
            "repeated_string_field",
            18,
            FieldKind::Scalar(ScalarKind::String),
        ))
        .field(message("embedded_message", 19, EMBEDDED_MESSAGE))
        .map_field(
            "map_field",
            20,
            ScalarKind::String,
            FieldKind::Message(EMBEDDED_MESSAGE.to_string()),
        )
        .oneof(
            "oneof_field",
            vec![
                scalar("first_choice", 21, ScalarKind::Uint64),
                scalar("second_choice", 22, ScalarKind::String),
                message("third_choice", 23, EMBEDDED_MESSAGE),
            ],
        );

    Schema::builder()
        .enumeration(proto3_enum)
        .message(string_value)
        .message(embedded)
        .message(message3)
        .build()
        .unwrap()
}

/// `message Message { int32 a = 1; repeated string b = 2; Message self = 3; }`
pub fn self_referencing() -> Schema {
    Schema::builder()
        .message(
            MessageDescriptor::new("test.Message")
                .field(scalar("a", 1, ScalarKind::Int32))
                .field(FieldDescriptor::repeated(
                    "b",
                    2,
                    FieldKind::Scalar(ScalarKind::String),
                ))
                .field(message("self", 3, "test.Message")),
        )
        .build()
        .unwrap()
}

/// `A { string name; B b; }` and `B { int64 id; A a; }`
pub fn mutually_recursive() -> Schema {
    Schema::builder()
        .message(
            MessageDescriptor::new("test.A")
                .field(scalar("name", 1, ScalarKind::String))
                .field(message("b", 2, "test.B")),
        )
        .message(
            MessageDescriptor::new("test.B")
                .field(scalar("id", 1, ScalarKind::Int64))
                .field(message("a", 2, "test.A")),
        )
        .build()
        .unwrap()
}

/// A tree whose children are repeated self references.
pub fn tree() -> Schema {
    Schema::builder()
        .message(
            MessageDescriptor::new("test.Tree")
                .field(scalar("label", 1, ScalarKind::Uint32))
                .field(FieldDescriptor::repeated(
                    "children",
                    2,
                    FieldKind::Message("test.Tree".to_string()),
                )),
        )
        .build()
        .unwrap()
}

pub fn generator(schema: Schema, config: Config) -> MessageGenerator {
    MessageGenerator::new(schema, config).unwrap()
}
