//! Configuration for message generation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::random::RandomStream;
use crate::schema::{FieldKind, ScalarKind};
use crate::value::Value;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 123;

/// Identifies the type an override applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Scalar(ScalarKind),
    /// Fully-qualified enum name.
    Enum(String),
    /// Fully-qualified message name.
    Message(String),
}

impl TypeKey {
    pub fn message(name: impl Into<String>) -> Self {
        TypeKey::Message(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        TypeKey::Enum(name.into())
    }

    /// The key for values stored into a field of `kind`. Groups have none.
    pub fn for_kind(kind: &FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Scalar(scalar) => Some(TypeKey::Scalar(*scalar)),
            FieldKind::Enum(name) => Some(TypeKey::Enum(name.clone())),
            FieldKind::Message(name) => Some(TypeKey::Message(name.clone())),
            FieldKind::Group => None,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Scalar(scalar) => write!(f, "{scalar}"),
            TypeKey::Enum(name) => write!(f, "enum {name}"),
            TypeKey::Message(name) => write!(f, "message {name}"),
        }
    }
}

/// A user supplied generator that replaces the built-in one for a type.
///
/// The generator is opaque to the engine: it may draw any amount of
/// randomness from the stream it is handed, or none at all. Its output is
/// type-checked when it is stored into a field.
pub trait ValueGenerator: Send + Sync {
    fn generate(&self, stream: &mut RandomStream) -> Value;
}

impl<F> ValueGenerator for F
where
    F: Fn(&mut RandomStream) -> Value + Send + Sync,
{
    fn generate(&self, stream: &mut RandomStream) -> Value {
        self(stream)
    }
}

/// An inclusive `[min, max]` range of sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// A range that always yields `size`.
    pub const fn exactly(size: usize) -> Self {
        Self::new(size, size)
    }

    pub fn validate(&self, what: &'static str) -> Result<(), Error> {
        if self.min > self.max {
            return Err(Error::InvalidSizeRange {
                what,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Draw a size. A constant range never touches the stream.
    pub fn draw(&self, stream: &mut RandomStream) -> usize {
        stream.int_in_range(self.min..=self.max)
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

/// Configuration for message generation.
///
/// ```
/// use protorand::{Config, ScalarKind, TypeKey, Value};
///
/// let mut config = Config::new();
/// config
///     .seed(42)
///     .collection_size_range(2, 2)
///     .object_pool_size(1)
///     .randomize_with_value(TypeKey::Scalar(ScalarKind::Int32), Value::Int32(7));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Config {
    /// Seed of the random stream.
    pub(crate) seed: u64,

    /// Length of every repeated and map field.
    pub(crate) collection_size: SizeRange,

    /// Length of every generated string.
    pub(crate) string_length: SizeRange,

    /// Maximum number of independently populated instances per message type.
    pub(crate) object_pool_size: usize,

    /// Per-type generators, consulted before the built-in dispatch.
    pub(crate) overrides: HashMap<TypeKey, Arc<dyn ValueGenerator>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            collection_size: SizeRange::new(1, 10),
            string_length: SizeRange::new(1, 32),
            object_pool_size: 1,
            overrides: HashMap::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overrides: Vec<_> = self.overrides.keys().map(ToString::to_string).collect();
        overrides.sort_unstable();
        f.debug_struct("Config")
            .field("seed", &self.seed)
            .field("collection_size", &self.collection_size)
            .field("string_length", &self.string_length)
            .field("object_pool_size", &self.object_pool_size)
            .field("overrides", &overrides)
            .finish()
    }
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed of the random stream.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Set the inclusive size range of repeated and map fields.
    pub fn collection_size_range(&mut self, min: usize, max: usize) -> &mut Self {
        self.collection_size = SizeRange::new(min, max);
        self
    }

    /// Set the inclusive length range of string fields.
    pub fn string_length_range(&mut self, min: usize, max: usize) -> &mut Self {
        self.string_length = SizeRange::new(min, max);
        self
    }

    /// Set how many instances of one message type are populated before
    /// pooled instances are reused.
    pub fn object_pool_size(&mut self, size: usize) -> &mut Self {
        self.object_pool_size = size;
        self
    }

    /// Use `generator` for every value of type `key`, including nested
    /// occurrences and the top-level message itself.
    pub fn randomize(
        &mut self,
        key: TypeKey,
        generator: impl ValueGenerator + 'static,
    ) -> &mut Self {
        self.overrides.insert(key, Arc::new(generator));
        self
    }

    /// Always use `value` for type `key`.
    pub fn randomize_with_value(&mut self, key: TypeKey, value: Value) -> &mut Self {
        self.randomize(key, move |_: &mut RandomStream| value.clone())
    }

    pub fn override_for(&self, key: &TypeKey) -> Option<&Arc<dyn ValueGenerator>> {
        self.overrides.get(key)
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&TypeKey, &Arc<dyn ValueGenerator>)> {
        self.overrides.iter()
    }

    pub fn seed_value(&self) -> u64 {
        self.seed
    }

    pub fn collection_size(&self) -> SizeRange {
        self.collection_size
    }

    pub fn string_length(&self) -> SizeRange {
        self.string_length
    }

    pub fn pool_size(&self) -> usize {
        self.object_pool_size
    }

    /// Check the configuration for fatal errors.
    pub fn validate(&self) -> Result<(), Error> {
        self.collection_size.validate("collection size")?;
        self.string_length.validate("string length")?;
        if self.object_pool_size == 0 {
            return Err(Error::InvalidPoolSize(self.object_pool_size));
        }
        Ok(())
    }
}
