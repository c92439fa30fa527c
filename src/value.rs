//! Generated message values and the builders that accumulate them.
//!
//! A [`MessageBuilder`] is the mutable, exclusively owned accumulator for one
//! message. It checks every mutation against the message's descriptor, so a
//! finalized [`MessageValue`] always conforms to its schema: each value has
//! the field's type, each field has its declared cardinality, and at most one
//! member of each oneof group is set.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::Error;
use crate::schema::{
    Cardinality, EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor, ScalarKind,
};

/// A selected enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Fully-qualified name of the enum type.
    pub enum_type: String,
    pub name: String,
    pub number: i32,
}

impl EnumValue {
    /// The `index`-th declared value of `descriptor`.
    pub fn from_descriptor(descriptor: &EnumDescriptor, index: usize) -> Option<Self> {
        descriptor.values.get(index).map(|value| EnumValue {
            enum_type: descriptor.name.clone(),
            name: value.name.clone(),
            number: value.number,
        })
    }
}

/// A single concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Sint32(i32),
    Sint64(i64),
    Bool(bool),
    Fixed32(u32),
    Sfixed32(i32),
    Float(f32),
    Fixed64(u64),
    Sfixed64(i64),
    Double(f64),
    String(String),
    Bytes(Bytes),
    Enum(EnumValue),
    /// Nested messages are shared, a pooled instance may appear at several
    /// positions of one generated tree.
    Message(Arc<MessageValue>),
}

impl Value {
    /// The scalar kind of this value, if it is a scalar.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        Some(match self {
            Value::Int32(_) => ScalarKind::Int32,
            Value::Int64(_) => ScalarKind::Int64,
            Value::Uint32(_) => ScalarKind::Uint32,
            Value::Uint64(_) => ScalarKind::Uint64,
            Value::Sint32(_) => ScalarKind::Sint32,
            Value::Sint64(_) => ScalarKind::Sint64,
            Value::Bool(_) => ScalarKind::Bool,
            Value::Fixed32(_) => ScalarKind::Fixed32,
            Value::Sfixed32(_) => ScalarKind::Sfixed32,
            Value::Float(_) => ScalarKind::Float,
            Value::Fixed64(_) => ScalarKind::Fixed64,
            Value::Sfixed64(_) => ScalarKind::Sfixed64,
            Value::Double(_) => ScalarKind::Double,
            Value::String(_) => ScalarKind::String,
            Value::Bytes(_) => ScalarKind::Bytes,
            Value::Enum(_) | Value::Message(_) => return None,
        })
    }

    /// Returns whether this value may be stored in a field of `kind`.
    pub fn conforms_to(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Value::Enum(value), FieldKind::Enum(name)) => &value.enum_type == name,
            (Value::Message(message), FieldKind::Message(name)) => message.type_name() == name,
            (value, FieldKind::Scalar(scalar)) => value.scalar_kind() == Some(*scalar),
            _ => false,
        }
    }

    /// Human readable type of this value, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Enum(value) => format!("enum {}", value.enum_type),
            Value::Message(message) => format!("message {}", message.type_name()),
            scalar => scalar
                .scalar_kind()
                .map(|kind| kind.proto_name().to_string())
                .unwrap_or_default(),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) | Value::Sint32(v) | Value::Sfixed32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) | Value::Sint64(v) | Value::Sfixed64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Arc<MessageValue>> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }
}

/// The content of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Repeated(Vec<Value>),
    /// Entries in insertion order. Duplicate keys are kept, readers that
    /// need map semantics should let the last entry win.
    Map(Vec<(Value, Value)>),
}

impl FieldValue {
    /// Number of values (or entries) held by this field.
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Single(_) => 1,
            FieldValue::Repeated(values) => values.len(),
            FieldValue::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Value]> {
        match self {
            FieldValue::Repeated(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            FieldValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// An immutable message instance.
#[derive(Debug, Clone)]
pub struct MessageValue {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<String, FieldValue>,
}

impl PartialEq for MessageValue {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.fields == other.fields
    }
}

impl MessageValue {
    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Shorthand for a singular field's value.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.get(field).and_then(FieldValue::as_single)
    }

    /// Shorthand for a singular message field's value.
    pub fn message(&self, field: &str) -> Option<&Arc<MessageValue>> {
        self.value(field).and_then(Value::as_message)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The field currently set in the oneof group `oneof`, if any.
    pub fn which_oneof(&self, oneof: &str) -> Option<&FieldDescriptor> {
        self.descriptor
            .find_oneof(oneof)?
            .fields
            .iter()
            .find(|field| self.has(&field.name))
    }

    /// Number of fields that hold a value.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Set fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        self.descriptor
            .all_fields()
            .filter_map(|field| self.fields.get(&field.name).map(|value| (field, value)))
    }

    /// Start a new builder holding a copy of this message's fields.
    pub fn to_builder(&self) -> MessageBuilder {
        MessageBuilder {
            descriptor: Arc::clone(&self.descriptor),
            fields: self.fields.clone(),
        }
    }
}

/// Renders protobuf text format, for debugging and snapshots.
impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text_format(f, self, 0)
    }
}

/// Mutable accumulator for one message instance.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<String, FieldValue>,
}

impl MessageBuilder {
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Set a singular field. Setting a oneof member clears the rest of its group.
    pub fn set(&mut self, field: &str, value: Value) -> Result<&mut Self, Error> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = lookup(&descriptor, field, Cardinality::Singular, "set a value")?;
        check_conforms(field, &field.kind, &value)?;

        if let Some(group) = field.oneof.as_deref().and_then(|g| descriptor.find_oneof(g)) {
            for sibling in group.fields.iter().filter(|f| f.name != field.name) {
                self.fields.remove(&sibling.name);
            }
        }
        self.fields
            .insert(field.name.clone(), FieldValue::Single(value));
        Ok(self)
    }

    /// Append an element to a repeated field.
    pub fn push(&mut self, field: &str, value: Value) -> Result<&mut Self, Error> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = lookup(&descriptor, field, Cardinality::Repeated, "push a value")?;
        check_conforms(field, &field.kind, &value)?;

        match self
            .fields
            .entry(field.name.clone())
            .or_insert_with(|| FieldValue::Repeated(Vec::new()))
        {
            FieldValue::Repeated(values) => values.push(value),
            _ => unreachable!("repeated field holds a non-repeated value"),
        }
        Ok(self)
    }

    /// Append an entry to a map field.
    pub fn insert(&mut self, field: &str, key: Value, value: Value) -> Result<&mut Self, Error> {
        let descriptor = Arc::clone(&self.descriptor);
        let field = lookup(&descriptor, field, Cardinality::Map, "insert an entry")?;
        let entry = descriptor.map_entry_for(field).ok_or_else(|| {
            Error::InvalidSchema(format!("map field '{}' has no entry type", field.name))
        })?;
        if let (Some(key_field), Some(value_field)) = (entry.map_key(), entry.map_value()) {
            check_conforms(field, &key_field.kind, &key)?;
            check_conforms(field, &value_field.kind, &value)?;
        }

        match self
            .fields
            .entry(field.name.clone())
            .or_insert_with(|| FieldValue::Map(Vec::new()))
        {
            FieldValue::Map(entries) => entries.push((key, value)),
            _ => unreachable!("map field holds a non-map value"),
        }
        Ok(self)
    }

    /// Mark a repeated or map field as present with no elements.
    pub(crate) fn touch(&mut self, field: &FieldDescriptor) {
        let empty = match field.cardinality {
            Cardinality::Repeated => FieldValue::Repeated(Vec::new()),
            Cardinality::Map => FieldValue::Map(Vec::new()),
            Cardinality::Singular => return,
        };
        self.fields.entry(field.name.clone()).or_insert(empty);
    }

    pub fn clear(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// A finalized copy of the fields set so far.
    pub fn snapshot(&self) -> MessageValue {
        self.clone().build()
    }

    pub fn build(self) -> MessageValue {
        MessageValue {
            descriptor: self.descriptor,
            fields: self.fields,
        }
    }
}

fn lookup<'a>(
    descriptor: &'a MessageDescriptor,
    name: &str,
    expected: Cardinality,
    operation: &'static str,
) -> Result<&'a FieldDescriptor, Error> {
    let field = descriptor
        .find_field(name)
        .ok_or_else(|| Error::UnknownField {
            message: descriptor.name.clone(),
            field: name.to_string(),
        })?;
    if field.cardinality != expected {
        return Err(Error::CardinalityMismatch {
            field: field.name.clone(),
            expected: field.cardinality,
            operation,
        });
    }
    Ok(field)
}

fn check_conforms(field: &FieldDescriptor, kind: &FieldKind, value: &Value) -> Result<(), Error> {
    if value.conforms_to(kind) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            field: field.name.clone(),
            expected: kind.to_string(),
            actual: value.describe(),
        })
    }
}

// Text format rendering

fn write_text_format(f: &mut fmt::Formatter<'_>, msg: &MessageValue, indent: usize) -> fmt::Result {
    for (field, value) in msg.fields() {
        match value {
            FieldValue::Single(value) => write_field(f, &field.name, value, indent)?,
            FieldValue::Repeated(values) => {
                for value in values {
                    write_field(f, &field.name, value, indent)?;
                }
            }
            FieldValue::Map(entries) => {
                let pad = "  ".repeat(indent);
                for (key, value) in entries {
                    writeln!(f, "{pad}{} {{", field.name)?;
                    write_field(f, "key", key, indent + 1)?;
                    write_field(f, "value", value, indent + 1)?;
                    writeln!(f, "{pad}}}")?;
                }
            }
        }
    }
    Ok(())
}

fn write_field(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    value: &Value,
    indent: usize,
) -> fmt::Result {
    let pad = "  ".repeat(indent);
    match value {
        Value::Message(nested) => {
            writeln!(f, "{pad}{name} {{")?;
            write_text_format(f, nested, indent + 1)?;
            writeln!(f, "{pad}}}")
        }
        scalar => writeln!(f, "{pad}{name}: {}", scalar_to_text(scalar)),
    }
}

fn scalar_to_text(value: &Value) -> String {
    match value {
        Value::Int32(v) | Value::Sint32(v) | Value::Sfixed32(v) => v.to_string(),
        Value::Int64(v) | Value::Sint64(v) | Value::Sfixed64(v) => v.to_string(),
        Value::Uint32(v) | Value::Fixed32(v) => v.to_string(),
        Value::Uint64(v) | Value::Fixed64(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Float(v) => float_to_text(*v),
        Value::Double(v) => float_to_text(*v),
        Value::String(v) => format!("\"{}\"", escape_bytes_for_text(v.as_bytes())),
        Value::Bytes(v) => format!("\"{}\"", escape_bytes_for_text(v)),
        Value::Enum(v) => v.name.clone(),
        Value::Message(_) => String::new(),
    }
}

fn float_to_text<F: Into<f64> + fmt::Display + Copy>(v: F) -> String {
    let wide: f64 = v.into();
    if wide.is_nan() {
        "nan".to_string()
    } else if wide == f64::INFINITY {
        "inf".to_string()
    } else if wide == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v}")
    }
}

fn escape_bytes_for_text(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len() * 4);
    for &b in bytes {
        match b {
            b'"' => result.push_str("\\\""),
            b'\\' => result.push_str("\\\\"),
            b'\n' => result.push_str("\\n"),
            b'\r' => result.push_str("\\r"),
            b'\t' => result.push_str("\\t"),
            0x20..=0x7e => result.push(char::from(b)),
            _ => result.push_str(&format!("\\{:03o}", b)),
        }
    }
    result
}
