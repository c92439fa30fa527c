//! Structural guarantees of generated messages.

mod common;

use common::{EMBEDDED_MESSAGE, PROTO3_ENUM, PROTO3_MESSAGE, generator, proto3};
use proptest::prelude::*;
use proptest::property_test;
use protorand::{Config, Error, FieldValue, MessageValue, ScalarKind, Value};

fn generate(config: Config) -> MessageValue {
    generator(proto3(), config).generate(PROTO3_MESSAGE).unwrap()
}

#[test]
fn test_every_plain_field_is_set() {
    let message = generate(Config::new());

    for kind in ScalarKind::ALL {
        let name = format!("{}_field", kind.proto_name());
        let value = message.value(&name).unwrap();
        assert_eq!(value.scalar_kind(), Some(kind), "{name}");
    }

    let string = message.value("string_field").unwrap().as_str().unwrap();
    assert!(!string.is_empty());
    assert_eq!(message.value("bytes_field").unwrap().as_bytes().unwrap().len(), 32);

    let enum_value = message.value("enum_field").unwrap().as_enum().unwrap();
    assert_eq!(enum_value.enum_type, PROTO3_ENUM);
    assert!(["UNKNOWN", "FIRST_VALUE", "SECOND_VALUE"].contains(&enum_value.name.as_str()));

    let wrapper = message.message("string_value_field").unwrap();
    assert!(wrapper.value("value").is_some());

    let embedded = message.message("embedded_message").unwrap();
    assert_eq!(embedded.type_name(), EMBEDDED_MESSAGE);
    assert!(embedded.has("string_field"));
    assert!(embedded.has("enum_field"));

    assert!(!message.get("repeated_string_field").unwrap().is_empty());
    assert!(!message.get("map_field").unwrap().is_empty());
}

#[test]
fn test_exactly_one_oneof_member() {
    let messages = generator(proto3(), Config::new());
    let choices = ["first_choice", "second_choice", "third_choice"];

    let mut seen = Vec::new();
    for _ in 0..64 {
        let message = messages.generate(PROTO3_MESSAGE).unwrap();
        let chosen = message.which_oneof("oneof_field").unwrap();
        let set = choices.iter().filter(|name| message.has(name)).count();
        assert_eq!(set, 1);
        assert!(message.has(&chosen.name));
        if !seen.contains(&chosen.name) {
            seen.push(chosen.name.clone());
        }
    }
    assert_eq!(seen.len(), choices.len());
}

#[test]
fn test_same_seed_same_message() {
    let mut config = Config::new();
    config.seed(123).collection_size_range(3, 10);

    let first = generate(config.clone());
    let second = generate(config);
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_different_seeds_differ() {
    let mut config = Config::new();
    config.seed(1);
    let first = generate(config.clone());
    config.seed(2);
    let second = generate(config);

    for field in ["int64_field", "uint64_field", "double_field", "bytes_field"] {
        assert_ne!(first.value(field), second.value(field), "{field}");
    }
}

#[test]
fn test_sequential_calls_differ() {
    let messages = generator(proto3(), Config::new());
    let first = messages.generate(PROTO3_MESSAGE).unwrap();
    let second = messages.generate(PROTO3_MESSAGE).unwrap();

    assert_ne!(first, second);
    for field in ["int32_field", "fixed64_field", "string_field", "bytes_field"] {
        assert_ne!(first.value(field), second.value(field), "{field}");
    }
    assert_ne!(
        first.message("embedded_message").unwrap().value("string_field"),
        second.message("embedded_message").unwrap().value("string_field"),
    );
}

#[test]
fn test_sequence_is_reproducible() {
    let mut config = Config::new();
    config.seed(77);
    let a = generator(proto3(), config.clone());
    let b = generator(proto3(), config);

    for _ in 0..4 {
        assert_eq!(
            a.generate(PROTO3_MESSAGE).unwrap(),
            b.generate(PROTO3_MESSAGE).unwrap()
        );
    }
}

#[test]
fn test_constant_collection_size() {
    let mut config = Config::new();
    config.collection_size_range(3, 3);
    let message = generate(config);

    assert_eq!(message.get("repeated_string_field").unwrap().len(), 3);
    let entries = message.get("map_field").unwrap().as_map().unwrap();
    assert_eq!(entries.len(), 3);
    for (key, value) in entries {
        assert!(key.as_str().is_some());
        assert_eq!(value.as_message().unwrap().type_name(), EMBEDDED_MESSAGE);
    }
}

#[property_test]
fn proptest_collection_lengths_in_range(seed: u64, min: u8, width: u8) {
    let min = usize::from(min % 8);
    let max = min + usize::from(width % 8);
    let mut config = Config::new();
    config.seed(seed).collection_size_range(min, max);

    let message = generate(config);
    for (field, value) in message.fields() {
        if let FieldValue::Repeated(_) | FieldValue::Map(_) = value {
            prop_assert!(
                (min..=max).contains(&value.len()),
                "{} has {} elements, expected {min}..={max}",
                field.name,
                value.len()
            );
        }
    }
}

#[property_test]
fn proptest_string_lengths_in_range(seed: u64, min: u8, width: u8) {
    let min = usize::from(min % 16);
    let max = min + usize::from(width % 16);
    let mut config = Config::new();
    config.seed(seed).string_length_range(min, max);

    let message = generate(config);
    for value in message.get("repeated_string_field").unwrap().as_repeated().unwrap() {
        let len = value.as_str().unwrap().len();
        prop_assert!((min..=max).contains(&len));
    }
}

#[test]
fn test_degenerate_range_is_fatal() {
    let mut config = Config::new();
    config.collection_size_range(3, 2);
    assert_eq!(
        protorand::MessageGenerator::new(proto3(), config).unwrap_err(),
        Error::InvalidSizeRange {
            what: "collection size",
            min: 3,
            max: 2,
        }
    );
}

#[test]
fn test_unknown_message_type() {
    let messages = generator(proto3(), Config::new());
    assert_eq!(
        messages.generate("test.Nope"),
        Err(Error::UnknownMessageType("test.Nope".to_string()))
    );
}

#[test]
fn test_generated_builder_is_editable() {
    let messages = generator(proto3(), Config::new());
    let mut builder = messages.generate_builder(PROTO3_MESSAGE).unwrap();
    builder.set("int32_field", Value::Int32(0)).unwrap();
    builder.set("second_choice", Value::String("picked".into())).unwrap();

    let message = builder.build();
    assert_eq!(message.value("int32_field"), Some(&Value::Int32(0)));
    assert_eq!(message.which_oneof("oneof_field").unwrap().name, "second_choice");
    assert!(!message.has("first_choice") && !message.has("third_choice"));
}
