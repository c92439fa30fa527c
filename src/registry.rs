//! Randomizer registries for host frameworks.
//!
//! A host that fills arbitrary values asks a [`RandomizerProvider`] for a
//! [`Randomizer`] once per distinct type it needs. Registries are consulted
//! in descending priority order; `None` from every registry means the host
//! should use its own default.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::{Config, TypeKey, ValueGenerator};
use crate::error::Error;
use crate::generator::MessageGenerator;
use crate::random::RandomStream;
use crate::scalar::random_bytes;
use crate::schema::{FieldDescriptor, ScalarKind, Schema};
use crate::value::{MessageBuilder, Value};

/// A self-seeded producer of values of one type.
pub trait Randomizer: Send + Sync {
    fn random_value(&self) -> Result<Value, Error>;
}

/// Resolves randomizers by type or by field.
pub trait RandomizerRegistry: Send + Sync {
    /// Higher priorities are consulted first.
    fn priority(&self) -> i32;

    fn randomizer_for_type(&self, key: &TypeKey) -> Option<Arc<dyn Randomizer>>;

    fn randomizer_for_field(&self, _field: &FieldDescriptor) -> Option<Arc<dyn Randomizer>> {
        None
    }
}

/// 32 random bytes per call from a private stream.
#[derive(Debug)]
pub struct BytesRandomizer {
    stream: Mutex<RandomStream>,
}

impl BytesRandomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            stream: Mutex::new(RandomStream::new(seed)),
        }
    }
}

impl Randomizer for BytesRandomizer {
    fn random_value(&self) -> Result<Value, Error> {
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Value::Bytes(random_bytes(&mut stream)))
    }
}

/// Generates instances of one message type.
#[derive(Debug)]
pub struct MessageRandomizer {
    type_name: String,
    generator: MessageGenerator,
}

impl MessageRandomizer {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Randomizer for MessageRandomizer {
    fn random_value(&self) -> Result<Value, Error> {
        self.generator
            .generate_shared(&self.type_name)
            .map(Value::Message)
    }
}

/// Generates pre-populated builders of one message type.
#[derive(Debug)]
pub struct MessageBuilderRandomizer {
    type_name: String,
    generator: MessageGenerator,
}

impl MessageBuilderRandomizer {
    pub fn random_builder(&self) -> Result<MessageBuilder, Error> {
        self.generator.generate_builder(&self.type_name)
    }
}

/// Resolves message types and bytes for a schema.
pub struct ProtobufRandomizerRegistry {
    schema: Arc<Schema>,
    config: Arc<Config>,
    randomizers: Mutex<HashMap<TypeKey, Arc<dyn Randomizer>>>,
    builders: Mutex<HashMap<String, Arc<MessageBuilderRandomizer>>>,
}

impl ProtobufRandomizerRegistry {
    pub const PRIORITY: i32 = -2;

    pub fn new(schema: impl Into<Arc<Schema>>, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            schema: schema.into(),
            config: Arc::new(config),
            randomizers: Mutex::new(HashMap::new()),
            builders: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The builder randomizer for message type `type_name`.
    pub fn builder_randomizer(&self, type_name: &str) -> Option<Arc<MessageBuilderRandomizer>> {
        if !self.schema.contains_message(type_name) {
            return None;
        }
        let mut builders = self.builders.lock().unwrap_or_else(PoisonError::into_inner);
        let randomizer = builders.entry(type_name.to_string()).or_insert_with(|| {
            debug!(message_type = type_name, "created builder randomizer");
            Arc::new(MessageBuilderRandomizer {
                type_name: type_name.to_string(),
                generator: self.generator(),
            })
        });
        Some(Arc::clone(randomizer))
    }

    fn generator(&self) -> MessageGenerator {
        MessageGenerator::from_parts(Arc::clone(&self.schema), Arc::clone(&self.config))
    }

    fn create(&self, key: &TypeKey) -> Option<Arc<dyn Randomizer>> {
        match key {
            TypeKey::Scalar(ScalarKind::Bytes) => {
                Some(Arc::new(BytesRandomizer::new(self.config.seed)))
            }
            TypeKey::Message(name) if self.schema.contains_message(name) => {
                Some(Arc::new(MessageRandomizer {
                    type_name: name.clone(),
                    generator: self.generator(),
                }))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for ProtobufRandomizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtobufRandomizerRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RandomizerRegistry for ProtobufRandomizerRegistry {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn randomizer_for_type(&self, key: &TypeKey) -> Option<Arc<dyn Randomizer>> {
        let mut randomizers = self.randomizers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(randomizer) = randomizers.get(key) {
            return Some(Arc::clone(randomizer));
        }
        let randomizer = self.create(key)?;
        debug!(key = %key, "created randomizer");
        randomizers.insert(key.clone(), Arc::clone(&randomizer));
        Some(randomizer)
    }
}

/// Runs a configured override on a private stream.
struct OverrideRandomizer {
    generator: Arc<dyn ValueGenerator>,
    stream: Mutex<RandomStream>,
}

impl Randomizer for OverrideRandomizer {
    fn random_value(&self) -> Result<Value, Error> {
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.generator.generate(&mut stream))
    }
}

/// Exposes the overrides of a [`Config`] to the host.
///
/// Each override type resolves to one randomizer, so repeated resolutions
/// continue the same stream.
pub struct CustomRandomizerRegistry {
    config: Arc<Config>,
    randomizers: Mutex<HashMap<TypeKey, Arc<dyn Randomizer>>>,
}

impl CustomRandomizerRegistry {
    pub const PRIORITY: i32 = -1;

    pub fn new(config: impl Into<Arc<Config>>) -> Self {
        Self {
            config: config.into(),
            randomizers: Mutex::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for CustomRandomizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRandomizerRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RandomizerRegistry for CustomRandomizerRegistry {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn randomizer_for_type(&self, key: &TypeKey) -> Option<Arc<dyn Randomizer>> {
        let generator = self.config.override_for(key)?;
        let mut randomizers = self.randomizers.lock().unwrap_or_else(PoisonError::into_inner);
        let randomizer = randomizers.entry(key.clone()).or_insert_with(|| {
            debug!(key = %key, "created override randomizer");
            let randomizer: Arc<dyn Randomizer> = Arc::new(OverrideRandomizer {
                generator: Arc::clone(generator),
                stream: Mutex::new(RandomStream::new(self.config.seed)),
            });
            randomizer
        });
        Some(Arc::clone(randomizer))
    }
}

/// An ordered set of registries.
#[derive(Default)]
pub struct RandomizerProvider {
    registries: Vec<Arc<dyn RandomizerRegistry>>,
}

impl RandomizerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The protobuf and override registries for `schema` under `config`.
    pub fn protobuf(schema: impl Into<Arc<Schema>>, config: Config) -> Result<Self, Error> {
        let protobuf = ProtobufRandomizerRegistry::new(schema, config)?;
        let custom = CustomRandomizerRegistry::new(Arc::clone(protobuf.config()));
        let mut provider = Self::new();
        provider.register(Arc::new(protobuf)).register(Arc::new(custom));
        Ok(provider)
    }

    /// Add a registry. Registries of equal priority keep insertion order.
    pub fn register(&mut self, registry: Arc<dyn RandomizerRegistry>) -> &mut Self {
        self.registries.push(registry);
        self.registries
            .sort_by_key(|registry| std::cmp::Reverse(registry.priority()));
        self
    }

    pub fn randomizer_for_type(&self, key: &TypeKey) -> Option<Arc<dyn Randomizer>> {
        self.registries
            .iter()
            .find_map(|registry| registry.randomizer_for_type(key))
    }

    pub fn randomizer_for_field(&self, field: &FieldDescriptor) -> Option<Arc<dyn Randomizer>> {
        self.registries
            .iter()
            .find_map(|registry| registry.randomizer_for_field(field))
    }
}

impl fmt::Debug for RandomizerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<_> = self.registries.iter().map(|r| r.priority()).collect();
        f.debug_struct("RandomizerProvider")
            .field("priorities", &priorities)
            .finish()
    }
}
