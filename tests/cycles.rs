//! Termination of recursive schemas through the object pool.

mod common;

use std::sync::Arc;

use common::{generator, mutually_recursive, self_referencing, tree};
use protorand::{Config, Value};

#[test]
fn test_self_reference_at_capacity_one() {
    let mut config = Config::new();
    config.seed(123).collection_size_range(2, 2);
    let message = generator(self_referencing(), config)
        .generate("test.Message")
        .unwrap();

    assert!(message.value("a").unwrap().as_i32().is_some());
    assert_eq!(message.get("b").unwrap().len(), 2);

    // The nested instance is the outer one as it was when `self` was reached.
    let nested = message.message("self").unwrap();
    assert_eq!(nested.type_name(), "test.Message");
    assert_eq!(nested.value("a"), message.value("a"));
    assert_eq!(nested.get("b"), message.get("b"));
    assert!(!nested.has("self"));
}

#[test]
fn test_indirect_cycle_terminates() {
    let a = generator(mutually_recursive(), Config::new())
        .generate("test.A")
        .unwrap();

    let b = a.message("b").unwrap();
    assert_eq!(b.type_name(), "test.B");
    assert!(b.value("id").is_some());

    let inner = b.message("a").unwrap();
    assert_eq!(inner.type_name(), "test.A");
    assert_eq!(inner.value("name"), a.value("name"));
    assert!(!inner.has("b"));
}

#[test]
fn test_pool_capacity_bounds_instances() {
    for capacity in [1, 2, 3, 5] {
        let mut config = Config::new();
        config
            .seed(9)
            .collection_size_range(2, 2)
            .object_pool_size(capacity);
        let root = Arc::new(generator(tree(), config).generate("test.Tree").unwrap());

        // Reused instances carry the label of the slot they came from.
        let mut labels: Vec<u32> = Vec::new();
        let mut stack = vec![Arc::clone(&root)];
        let mut visited = 0;
        while let Some(message) = stack.pop() {
            visited += 1;
            assert!(visited < 10_000, "tree did not terminate");
            if let Some(label) = message.value("label").and_then(|v| match v {
                Value::Uint32(n) => Some(*n),
                _ => None,
            }) {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            for child in message.get("children").unwrap().as_repeated().unwrap() {
                stack.push(Arc::clone(child.as_message().unwrap()));
            }
        }
        assert!(labels.len() <= capacity, "{} > {capacity}", labels.len());
    }
}

#[test]
fn test_deep_chain_with_larger_pool() {
    let mut config = Config::new();
    config.object_pool_size(4);
    let message = generator(self_referencing(), config)
        .generate("test.Message")
        .unwrap();

    // Each level reserves a new slot until the pool is full.
    let mut depth = 0;
    let mut current = message.message("self").cloned();
    while let Some(next) = current {
        depth += 1;
        assert!(depth <= 4);
        current = next.message("self").cloned();
    }
    assert_eq!(depth, 4);
}
