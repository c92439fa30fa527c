//! Cycle-breaking object pool.
//!
//! A message type that can reach itself (directly, `Node.next: Node`, or
//! through other types) would recurse forever if every occurrence were
//! populated from scratch. The pool caps the number of independently
//! populated instances of each type at its capacity. Once a type has used up
//! its slots, further requests are answered with one of the pooled instances
//! instead of recursing.
//!
//! Population is a two-phase protocol:
//!
//! 1. [`ObjectPool::acquire`] either returns a pooled instance, or *reserves*
//!    an empty slot holding a fresh builder. Reservation happens before any
//!    field is populated, so a nested request for the same type already sees
//!    the slot as taken.
//! 2. The engine populates the reserved builder in place through
//!    [`ObjectPool::builder_mut`] and finally calls [`ObjectPool::complete`],
//!    which freezes it.
//!
//! Reusing a slot that is still reserved yields a snapshot of the fields
//! populated so far. Slots are never released.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::random::RandomStream;
use crate::schema::MessageDescriptor;
use crate::value::{MessageBuilder, MessageValue};

/// State of one pool slot.
#[derive(Debug)]
pub enum Slot {
    Empty,
    /// Population is in progress.
    Reserved(MessageBuilder),
    /// Population finished.
    Populated(Arc<MessageValue>),
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Handle to a reserved slot.
///
/// Only the pool creates handles and [`ObjectPool::complete`] consumes them,
/// so a live handle always refers to a reserved slot.
#[derive(Debug, PartialEq, Eq)]
pub struct SlotId(usize);

/// Outcome of [`ObjectPool::acquire`].
#[derive(Debug)]
pub enum Acquired {
    /// The type is exhausted, use this pooled instance.
    Reused(Arc<MessageValue>),
    /// A slot was reserved for a new instance.
    Reserved(SlotId),
}

/// Per-type bounded pool of message instances.
#[derive(Debug)]
pub struct ObjectPool {
    capacity: usize,
    /// Every slot of every type.
    slots: Vec<Slot>,
    /// Message type name -> indices into `slots`, exactly `capacity` each.
    by_type: HashMap<String, Vec<usize>>,
}

impl ObjectPool {
    /// Create a pool holding up to `capacity` instances per type.
    ///
    /// `capacity` must be positive, which [`Config::validate`] ensures.
    ///
    /// [`Config::validate`]: crate::Config::validate
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of reserved or populated slots for `type_name`.
    pub fn len(&self, type_name: &str) -> usize {
        self.occupied(type_name).count()
    }

    /// Returns whether every slot for `type_name` is taken.
    pub fn is_exhausted(&self, type_name: &str) -> bool {
        self.len(type_name) >= self.capacity
    }

    /// Reuse a pooled instance if the type is exhausted, otherwise reserve a
    /// slot for a new one.
    pub fn acquire(
        &mut self,
        descriptor: &Arc<MessageDescriptor>,
        stream: &mut RandomStream,
    ) -> Acquired {
        if let Some(reused) = self.reuse(&descriptor.name, stream) {
            return Acquired::Reused(reused);
        }
        match self.reserve(descriptor) {
            Some(slot) => Acquired::Reserved(slot),
            // `reuse` returns `None` only while a slot is free.
            None => unreachable!("pool for '{}' is full but not reusable", descriptor.name),
        }
    }

    /// Reserve an empty slot for `descriptor`'s type with a fresh builder.
    ///
    /// Returns `None` if the type is exhausted.
    pub fn reserve(&mut self, descriptor: &Arc<MessageDescriptor>) -> Option<SlotId> {
        let capacity = self.capacity;
        let slots = &mut self.slots;
        let indices = self
            .by_type
            .entry(descriptor.name.clone())
            .or_insert_with(|| {
                let start = slots.len();
                slots.extend((0..capacity).map(|_| Slot::Empty));
                (start..start + capacity).collect()
            });

        let index = *indices.iter().find(|&&i| slots[i].is_empty())?;
        slots[index] = Slot::Reserved(MessageBuilder::new(Arc::clone(descriptor)));
        trace!(message_type = %descriptor.name, slot = index, "reserved pool slot");
        Some(SlotId(index))
    }

    /// A pooled instance of `type_name`, if the type is exhausted.
    ///
    /// With more than one slot the instance is chosen uniformly at random,
    /// which draws from `stream`; a single slot is returned without a draw.
    pub fn reuse(&self, type_name: &str, stream: &mut RandomStream) -> Option<Arc<MessageValue>> {
        if !self.is_exhausted(type_name) {
            return None;
        }

        let occupied: Vec<&Slot> = self.occupied(type_name).collect();
        let choice = if occupied.len() > 1 {
            stream.index(occupied.len())
        } else {
            0
        };
        trace!(message_type = type_name, choice, "reusing pooled instance");

        match occupied.get(choice)? {
            Slot::Reserved(builder) => Some(Arc::new(builder.snapshot())),
            Slot::Populated(message) => Some(Arc::clone(message)),
            Slot::Empty => None,
        }
    }

    /// The builder of a reserved slot.
    pub fn builder_mut(&mut self, slot: &SlotId) -> &mut MessageBuilder {
        match &mut self.slots[slot.0] {
            Slot::Reserved(builder) => builder,
            _ => unreachable!("slot {} is not reserved", slot.0),
        }
    }

    /// Freeze a reserved slot and return the finished message.
    pub fn complete(&mut self, slot: SlotId) -> Arc<MessageValue> {
        let state = std::mem::replace(&mut self.slots[slot.0], Slot::Empty);
        let message = match state {
            Slot::Reserved(builder) => Arc::new(builder.build()),
            _ => unreachable!("slot {} is not reserved", slot.0),
        };
        self.slots[slot.0] = Slot::Populated(Arc::clone(&message));
        message
    }

    /// Number of slots, across all types, that finished population.
    pub fn populated(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Populated(_)))
            .count()
    }

    fn occupied(&self, type_name: &str) -> impl Iterator<Item = &Slot> {
        self.by_type
            .get(type_name)
            .into_iter()
            .flatten()
            .map(|&i| &self.slots[i])
            .filter(|slot| !slot.is_empty())
    }
}
