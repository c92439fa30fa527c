//! Thread-safe top-level entry point.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::{Config, TypeKey};
use crate::engine::Populator;
use crate::error::Error;
use crate::random::RandomStream;
use crate::scalar::ScalarTable;
use crate::schema::Schema;
use crate::value::{MessageBuilder, MessageValue, Value};

/// Generates random instances of the messages of a [`Schema`].
///
/// One random stream, seeded from the configuration, is shared by every
/// call. A call holds it for the whole population, so concurrent callers
/// interleave one message at a time and the sequence of messages produced
/// by sequential calls is reproducible from the seed. Each call populates
/// over its own fresh object pool.
///
/// ```
/// use protorand::{
///     Config, FieldDescriptor, FieldKind, MessageDescriptor, MessageGenerator, ScalarKind,
///     Schema,
/// };
///
/// let schema = Schema::builder()
///     .message(
///         MessageDescriptor::new("demo.User")
///             .field(FieldDescriptor::singular("id", 1, FieldKind::Scalar(ScalarKind::Uint64)))
///             .field(FieldDescriptor::repeated("tags", 2, FieldKind::Scalar(ScalarKind::String))),
///     )
///     .build()?;
///
/// let mut config = Config::new();
/// config.collection_size_range(3, 3);
/// let generator = MessageGenerator::new(schema, config)?;
///
/// let user = generator.generate("demo.User")?;
/// assert_eq!(user.get("tags").unwrap().len(), 3);
/// # Ok::<(), protorand::Error>(())
/// ```
#[derive(Debug)]
pub struct MessageGenerator {
    schema: Arc<Schema>,
    config: Arc<Config>,
    scalars: ScalarTable,
    stream: Mutex<RandomStream>,
}

impl MessageGenerator {
    /// Create a generator, failing if `config` is invalid.
    pub fn new(schema: impl Into<Arc<Schema>>, config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::from_parts(schema.into(), Arc::new(config)))
    }

    /// Requires a validated `config`.
    pub(crate) fn from_parts(schema: Arc<Schema>, config: Arc<Config>) -> Self {
        let stream = Mutex::new(RandomStream::new(config.seed));
        Self {
            schema,
            config,
            scalars: ScalarTable::default(),
            stream,
        }
    }

    /// Replace the scalar generator table.
    pub fn with_scalars(mut self, scalars: ScalarTable) -> Self {
        self.scalars = scalars;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Generate a random instance of the message type `type_name`.
    ///
    /// An override configured for the message type itself takes precedence
    /// over population, just as it does for nested occurrences.
    pub fn generate(&self, type_name: &str) -> Result<MessageValue, Error> {
        self.generate_shared(type_name).map(Arc::unwrap_or_clone)
    }

    /// Generate an instance and return it as a builder for further edits.
    pub fn generate_builder(&self, type_name: &str) -> Result<MessageBuilder, Error> {
        Ok(self.generate(type_name)?.to_builder())
    }

    pub(crate) fn generate_shared(&self, type_name: &str) -> Result<Arc<MessageValue>, Error> {
        self.schema.message(type_name)?;

        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(generator) = self.config.override_for(&TypeKey::message(type_name)) {
            let message = match generator.generate(&mut stream) {
                Value::Message(message) if message.type_name() == type_name => message,
                other => {
                    return Err(Error::TypeMismatch {
                        field: type_name.to_string(),
                        expected: format!("message {type_name}"),
                        actual: other.describe(),
                    });
                }
            };
            debug!(message_type = type_name, "generated message from override");
            return Ok(message);
        }

        let mut populator = Populator::new(&self.schema, &self.config, &self.scalars, &mut stream);
        let message = populator.populate(type_name)?;
        debug!(
            message_type = type_name,
            instances = populator.pool().populated(),
            "generated message"
        );
        Ok(message)
    }
}
