//! Seeded random population of protobuf-style messages.
//!
//! Describe messages with a [`Schema`], pick a [`Config`], and ask a
//! [`MessageGenerator`] for instances. Every plain field is set, every oneof
//! has exactly one member, repeated and map fields have a length from the
//! configured range, and self-referencing types terminate through a bounded
//! per-type [`ObjectPool`].
//!
//! ```
//! use protorand::{
//!     Config, FieldDescriptor, FieldKind, MessageDescriptor, MessageGenerator, ScalarKind,
//!     Schema,
//! };
//!
//! let schema = Schema::builder()
//!     .message(
//!         MessageDescriptor::new("demo.Tree")
//!             .field(FieldDescriptor::singular("label", 1, FieldKind::Scalar(ScalarKind::String)))
//!             .field(FieldDescriptor::repeated(
//!                 "children",
//!                 2,
//!                 FieldKind::Message("demo.Tree".into()),
//!             )),
//!     )
//!     .build()?;
//!
//! let mut config = Config::new();
//! config.seed(7).collection_size_range(2, 2);
//! let generator = MessageGenerator::new(schema, config)?;
//!
//! let tree = generator.generate("demo.Tree")?;
//! assert_eq!(tree.get("children").unwrap().len(), 2);
//! # Ok::<(), protorand::Error>(())
//! ```

mod asserts;
mod engine;
mod error;

pub mod config;
pub mod generator;
pub mod pool;
pub mod random;
pub mod registry;
pub mod scalar;
pub mod schema;
pub mod value;

pub use config::{Config, SizeRange, TypeKey, ValueGenerator};
pub use error::Error;
pub use generator::MessageGenerator;
pub use pool::ObjectPool;
pub use random::RandomStream;
pub use registry::{
    BytesRandomizer, CustomRandomizerRegistry, MessageBuilderRandomizer, MessageRandomizer,
    ProtobufRandomizerRegistry, Randomizer, RandomizerProvider, RandomizerRegistry,
};
pub use scalar::ScalarTable;
pub use schema::{
    Cardinality, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldKind,
    MessageDescriptor, OneofDescriptor, ScalarKind, Schema, SchemaBuilder,
};
pub use value::{EnumValue, FieldValue, MessageBuilder, MessageValue, Value};
