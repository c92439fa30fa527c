//! Read-only descriptors for protobuf-style message schemas.
//!
//! A [`Schema`] is a registry of [`MessageDescriptor`]s and
//! [`EnumDescriptor`]s keyed by fully-qualified name. Fields reference other
//! types by name, which is what allows a message to (directly or indirectly)
//! contain itself:
//!
//! ```protobuf
//! message Node {
//!   int32 value = 1;
//!   Node next = 2;
//! }
//! ```
//!
//! Map fields follow the protobuf convention: a map is a repeated field whose
//! element type is a synthesized entry message flagged `map_entry`, holding
//! exactly a `key` (1) and a `value` (2) field.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::Error;

/// Scalar types supported in protobuf.
///
/// See: https://protobuf.dev/programming-guides/proto3/#scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Bool,
    Fixed32,
    Sfixed32,
    Float,
    Fixed64,
    Sfixed64,
    Double,
    String,
    Bytes,
}

impl ScalarKind {
    /// Every scalar kind, in protobuf documentation order.
    pub const ALL: [ScalarKind; 15] = [
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Bool,
        ScalarKind::Fixed32,
        ScalarKind::Sfixed32,
        ScalarKind::Float,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed64,
        ScalarKind::Double,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    /// Returns the protobuf type name for this scalar.
    pub fn proto_name(&self) -> &'static str {
        match self {
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Sint32 => "sint32",
            ScalarKind::Sint64 => "sint64",
            ScalarKind::Bool => "bool",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::Sfixed32 => "sfixed32",
            ScalarKind::Float => "float",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::Sfixed64 => "sfixed64",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
        }
    }

    /// Returns whether protobuf allows this scalar as a map key.
    ///
    /// Floating point and bytes keys are rejected by `protoc`.
    pub fn is_valid_map_key(&self) -> bool {
        !matches!(
            self,
            ScalarKind::Float | ScalarKind::Double | ScalarKind::Bytes
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proto_name())
    }
}

/// The type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A scalar type like int32, string, etc.
    Scalar(ScalarKind),
    /// A reference to an enum by fully-qualified name.
    Enum(String),
    /// A reference to a message by fully-qualified name.
    Message(String),
    /// Deprecated proto2 group. Described, but never generated.
    Group,
}

impl FieldKind {
    /// Short name used in error messages.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            FieldKind::Scalar(scalar) => scalar.proto_name(),
            FieldKind::Enum(_) => "enum",
            FieldKind::Message(_) => "message",
            FieldKind::Group => "group",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(scalar) => write!(f, "{scalar}"),
            FieldKind::Enum(name) => write!(f, "enum {name}"),
            FieldKind::Message(name) => write!(f, "message {name}"),
            FieldKind::Group => write!(f, "group"),
        }
    }
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one value.
    Singular,
    /// Zero or more values.
    Repeated,
    /// Zero or more key/value entries.
    Map,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Singular => write!(f, "singular"),
            Cardinality::Repeated => write!(f, "repeated"),
            Cardinality::Map => write!(f, "a map"),
        }
    }
}

/// A field descriptor within a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The field name (e.g., "user_id").
    pub name: String,
    /// The field number.
    pub number: u32,
    /// The type of this field.
    pub kind: FieldKind,
    /// Singular, repeated or map.
    pub cardinality: Cardinality,
    /// Name of the oneof group this field belongs to, if any.
    pub oneof: Option<String>,
}

impl FieldDescriptor {
    pub fn singular(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            cardinality: Cardinality::Singular,
            oneof: None,
        }
    }

    pub fn repeated(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            cardinality: Cardinality::Repeated,
            ..Self::singular(name, number, kind)
        }
    }

    pub fn is_repeated(&self) -> bool {
        !matches!(self.cardinality, Cardinality::Singular)
    }

    pub fn is_map(&self) -> bool {
        matches!(self.cardinality, Cardinality::Map)
    }
}

/// A group of mutually exclusive fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneofDescriptor {
    pub name: String,
    /// Candidate fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

/// A message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Fully-qualified message name (e.g., "test.Node").
    pub name: String,
    /// Fields that are not part of a oneof, in declaration order.
    pub fields: Vec<FieldDescriptor>,
    /// Oneof groups, in declaration order.
    pub oneofs: Vec<OneofDescriptor>,
    /// Nested message types. Map entries synthesized by
    /// [`MessageDescriptor::map_field`] land here.
    pub nested: Vec<MessageDescriptor>,
    /// Set if this message is a map entry type.
    pub map_entry: bool,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            nested: Vec::new(),
            map_entry: false,
        }
    }

    /// Append a plain (non-oneof) field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a oneof group. Each candidate is tagged with the group name.
    pub fn oneof(mut self, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        let name = name.into();
        let fields = fields
            .into_iter()
            .map(|field| FieldDescriptor {
                oneof: Some(name.clone()),
                ..field
            })
            .collect();
        self.oneofs.push(OneofDescriptor { name, fields });
        self
    }

    /// Append a map field, synthesizing its entry message.
    ///
    /// The entry is named like protoc names it: field `string_to_int` on
    /// `test.Foo` produces `test.Foo.StringToIntEntry`.
    pub fn map_field(
        mut self,
        name: impl Into<String>,
        number: u32,
        key: ScalarKind,
        value: FieldKind,
    ) -> Self {
        let name = name.into();
        let entry_name = format!("{}.{}Entry", self.name, to_pascal_case(&name));

        let entry = MessageDescriptor {
            map_entry: true,
            ..MessageDescriptor::new(entry_name.clone())
                .field(FieldDescriptor::singular("key", 1, FieldKind::Scalar(key)))
                .field(FieldDescriptor::singular("value", 2, value))
        };
        self.nested.push(entry);
        self.fields.push(FieldDescriptor {
            cardinality: Cardinality::Map,
            ..FieldDescriptor::singular(name, number, FieldKind::Message(entry_name))
        });
        self
    }

    /// Look up a field by name, including oneof candidates.
    pub fn find_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.all_fields().find(|field| field.name == name)
    }

    /// Look up a oneof group by name.
    pub fn find_oneof(&self, name: &str) -> Option<&OneofDescriptor> {
        self.oneofs.iter().find(|oneof| oneof.name == name)
    }

    /// Plain fields followed by oneof candidates, in declaration order.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .chain(self.oneofs.iter().flat_map(|oneof| oneof.fields.iter()))
    }

    /// The entry message for a map field declared on this message.
    pub fn map_entry_for(&self, field: &FieldDescriptor) -> Option<&MessageDescriptor> {
        match (&field.kind, field.cardinality) {
            (FieldKind::Message(entry), Cardinality::Map) => self
                .nested
                .iter()
                .find(|nested| nested.map_entry && &nested.name == entry),
            _ => None,
        }
    }

    /// The `key` field of a map entry message.
    pub fn map_key(&self) -> Option<&FieldDescriptor> {
        self.map_entry.then(|| self.fields.first()).flatten()
    }

    /// The `value` field of a map entry message.
    pub fn map_value(&self) -> Option<&FieldDescriptor> {
        self.map_entry.then(|| self.fields.get(1)).flatten()
    }
}

/// An enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// Fully-qualified enum name.
    pub name: String,
    /// Declared values, in declaration order.
    pub values: Vec<EnumValueDescriptor>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueDescriptor {
            name: name.into(),
            number,
        });
        self
    }
}

/// A validated set of message and enum types.
///
/// A `Schema` is immutable once built and is shared across generators
/// behind an [`Arc`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    messages: HashMap<String, Arc<MessageDescriptor>>,
    enums: HashMap<String, Arc<EnumDescriptor>>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up a message type by fully-qualified name.
    pub fn message(&self, name: &str) -> Result<&Arc<MessageDescriptor>, Error> {
        self.messages
            .get(name)
            .ok_or_else(|| Error::UnknownMessageType(name.to_string()))
    }

    /// Look up an enum type by fully-qualified name.
    pub fn enumeration(&self, name: &str) -> Result<&Arc<EnumDescriptor>, Error> {
        self.enums
            .get(name)
            .ok_or_else(|| Error::UnknownEnumType(name.to_string()))
    }

    pub fn contains_message(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    /// Names of all registered message types, sorted.
    pub fn message_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.messages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects descriptors and validates them into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    messages: Vec<MessageDescriptor>,
    enums: Vec<EnumDescriptor>,
}

impl SchemaBuilder {
    pub fn message(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumDescriptor) -> Self {
        self.enums.push(enumeration);
        self
    }

    /// Register every type and check that all references resolve.
    pub fn build(self) -> Result<Schema, Error> {
        let mut schema = Schema::default();

        for enumeration in self.enums {
            if enumeration.values.is_empty() {
                return Err(invalid(format!(
                    "enum '{}' declares no values",
                    enumeration.name
                )));
            }
            let name = enumeration.name.clone();
            if schema.enums.insert(name.clone(), Arc::new(enumeration)).is_some() {
                return Err(invalid(format!("duplicate enum '{name}'")));
            }
        }

        for message in self.messages {
            register_message(&mut schema, message)?;
        }

        for message in schema.messages.values() {
            validate_message(&schema, message)?;
        }

        Ok(schema)
    }
}

fn invalid(reason: String) -> Error {
    Error::InvalidSchema(reason)
}

/// Register a message and, recursively, its nested messages.
fn register_message(schema: &mut Schema, message: MessageDescriptor) -> Result<(), Error> {
    for nested in &message.nested {
        register_message(schema, nested.clone())?;
    }

    let name = message.name.clone();
    if schema.enums.contains_key(&name) {
        return Err(invalid(format!("'{name}' is declared as both enum and message")));
    }
    if schema.messages.insert(name.clone(), Arc::new(message)).is_some() {
        return Err(invalid(format!("duplicate message '{name}'")));
    }
    Ok(())
}

fn validate_message(schema: &Schema, message: &MessageDescriptor) -> Result<(), Error> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();

    for field in message.all_fields() {
        if !names.insert(field.name.as_str()) {
            return Err(invalid(format!(
                "duplicate field '{}' in '{}'",
                field.name, message.name
            )));
        }
        if !numbers.insert(field.number) {
            return Err(invalid(format!(
                "duplicate field number {} in '{}'",
                field.number, message.name
            )));
        }
        validate_field(schema, message, field)?;
    }

    for oneof in &message.oneofs {
        if oneof.fields.is_empty() {
            return Err(invalid(format!(
                "oneof '{}' in '{}' declares no fields",
                oneof.name, message.name
            )));
        }
        if let Some(field) = oneof.fields.iter().find(|f| f.is_repeated()) {
            return Err(invalid(format!(
                "oneof '{}' in '{}' contains {} field '{}'",
                oneof.name, message.name, field.cardinality, field.name
            )));
        }
    }

    if message.map_entry {
        validate_map_entry(message)?;
    }

    Ok(())
}

fn validate_field(
    schema: &Schema,
    message: &MessageDescriptor,
    field: &FieldDescriptor,
) -> Result<(), Error> {
    match &field.kind {
        FieldKind::Enum(name) => {
            schema.enumeration(name)?;
        }
        FieldKind::Message(name) => {
            let target = schema.message(name)?;
            if target.map_entry != field.is_map() {
                return Err(invalid(format!(
                    "field '{}' in '{}' must be a map field exactly when '{name}' is a map entry",
                    field.name, message.name
                )));
            }
            if field.is_map() && message.map_entry_for(field).is_none() {
                return Err(invalid(format!(
                    "map entry '{name}' is not nested in '{}'",
                    message.name
                )));
            }
        }
        FieldKind::Scalar(_) | FieldKind::Group => {
            if field.is_map() {
                return Err(invalid(format!(
                    "map field '{}' in '{}' must reference an entry message",
                    field.name, message.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_map_entry(entry: &MessageDescriptor) -> Result<(), Error> {
    let well_formed = entry.oneofs.is_empty()
        && entry.fields.len() == 2
        && entry.fields.iter().all(|f| !f.is_repeated())
        && matches!(entry.map_key(), Some(f) if f.name == "key" && f.number == 1)
        && matches!(entry.map_value(), Some(f) if f.name == "value" && f.number == 2);
    if !well_formed {
        return Err(invalid(format!(
            "map entry '{}' must declare exactly 'key = 1' and 'value = 2'",
            entry.name
        )));
    }

    match entry.map_key().map(|f| &f.kind) {
        Some(FieldKind::Scalar(scalar)) if scalar.is_valid_map_key() => Ok(()),
        Some(kind) => Err(invalid(format!(
            "map entry '{}' has invalid key type {kind}",
            entry.name
        ))),
        None => Err(invalid(format!("map entry '{}' has no key", entry.name))),
    }
}

fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
