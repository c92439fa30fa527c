//! The recursive message population engine.
//!
//! A [`Populator`] owns the object pool of one top-level call and borrows
//! everything else. For each message type it either reuses a pooled
//! instance or reserves a slot, populates plain fields in declaration order,
//! picks one candidate per oneof group, and freezes the slot.

use std::sync::Arc;

use tracing::trace;

use crate::config::{Config, TypeKey};
use crate::error::Error;
use crate::pool::{Acquired, ObjectPool, SlotId};
use crate::random::RandomStream;
use crate::scalar::ScalarTable;
use crate::schema::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor, Schema};
use crate::value::{EnumValue, MessageValue, Value};

pub(crate) struct Populator<'a> {
    schema: &'a Schema,
    config: &'a Config,
    scalars: &'a ScalarTable,
    stream: &'a mut RandomStream,
    pool: ObjectPool,
}

impl<'a> Populator<'a> {
    pub(crate) fn new(
        schema: &'a Schema,
        config: &'a Config,
        scalars: &'a ScalarTable,
        stream: &'a mut RandomStream,
    ) -> Self {
        Self {
            schema,
            config,
            scalars,
            stream,
            pool: ObjectPool::new(config.object_pool_size),
        }
    }

    /// The pool built up so far by this populator.
    pub(crate) fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    /// Produce an instance of the message type `type_name`.
    pub(crate) fn populate(&mut self, type_name: &str) -> Result<Arc<MessageValue>, Error> {
        let descriptor = Arc::clone(self.schema.message(type_name)?);

        let slot = match self.pool.acquire(&descriptor, self.stream) {
            Acquired::Reused(message) => return Ok(message),
            Acquired::Reserved(slot) => slot,
        };

        for field in &descriptor.fields {
            self.populate_field(&slot, &descriptor, field)?;
        }
        for oneof in &descriptor.oneofs {
            let chosen = &oneof.fields[self.stream.index(oneof.fields.len())];
            trace!(
                message_type = %descriptor.name,
                oneof = %oneof.name,
                field = %chosen.name,
                "chose oneof member"
            );
            self.populate_field(&slot, &descriptor, chosen)?;
        }

        Ok(self.pool.complete(slot))
    }

    fn populate_field(
        &mut self,
        slot: &SlotId,
        owner: &MessageDescriptor,
        field: &FieldDescriptor,
    ) -> Result<(), Error> {
        match field.cardinality {
            Cardinality::Singular => {
                let value = self.single_value(field)?;
                self.pool.builder_mut(slot).set(&field.name, value)?;
            }
            Cardinality::Repeated => {
                self.pool.builder_mut(slot).touch(field);
                let count = self.config.collection_size.draw(self.stream);
                for _ in 0..count {
                    let value = self.single_value(field)?;
                    self.pool.builder_mut(slot).push(&field.name, value)?;
                }
            }
            Cardinality::Map => {
                let entry = owner.map_entry_for(field).ok_or_else(|| {
                    Error::InvalidSchema(format!("map field '{}' has no entry type", field.name))
                })?;
                let (Some(key_field), Some(value_field)) = (entry.map_key(), entry.map_value())
                else {
                    return Err(Error::InvalidSchema(format!(
                        "map entry '{}' lacks a key or value field",
                        entry.name
                    )));
                };

                self.pool.builder_mut(slot).touch(field);
                let count = self.config.collection_size.draw(self.stream);
                for _ in 0..count {
                    let key = self.single_value(key_field)?;
                    let value = self.single_value(value_field)?;
                    self.pool.builder_mut(slot).insert(&field.name, key, value)?;
                }
            }
        }
        Ok(())
    }

    /// One value for `field`, ignoring its cardinality.
    fn single_value(&mut self, field: &FieldDescriptor) -> Result<Value, Error> {
        let config = self.config;
        if let Some(generator) = TypeKey::for_kind(&field.kind)
            .as_ref()
            .and_then(|key| config.override_for(key))
        {
            return Ok(generator.generate(self.stream));
        }

        match &field.kind {
            FieldKind::Scalar(kind) => {
                self.scalars
                    .generate(&field.name, *kind, self.stream, self.config)
            }
            FieldKind::Enum(name) => {
                let descriptor = self.schema.enumeration(name)?;
                let index = self.stream.index(descriptor.values.len());
                EnumValue::from_descriptor(descriptor, index)
                    .map(Value::Enum)
                    .ok_or_else(|| Error::InvalidSchema(format!("enum '{name}' has no values")))
            }
            FieldKind::Message(name) => Ok(Value::Message(self.populate(name)?)),
            FieldKind::Group => Err(Error::UnsupportedFieldKind {
                field: field.name.clone(),
                kind: field.kind.label(),
            }),
        }
    }
}
