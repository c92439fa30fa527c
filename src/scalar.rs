//! Built-in generators for scalar fields.
//!
//! Each generator draws exactly what its representation needs: one 32-bit
//! draw for 32-bit kinds, one 64-bit draw for 64-bit kinds, one draw for a
//! float, double or bool, [`BYTES_LEN`] bytes for a bytes field, and a
//! length draw followed by one draw per character for a string.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use rand::RngCore;

use crate::config::Config;
use crate::error::Error;
use crate::random::RandomStream;
use crate::schema::ScalarKind;
use crate::value::Value;

/// Length of every generated bytes value.
pub const BYTES_LEN: usize = 32;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Signature of a scalar generator.
pub type ScalarFn = fn(&mut RandomStream, &Config) -> Value;

/// Maps each scalar kind to its generator.
///
/// [`ScalarTable::default`] covers every [`ScalarKind`]. Entries can be
/// replaced or removed; generating a kind with no entry fails with
/// [`Error::UnsupportedFieldKind`].
#[derive(Clone)]
pub struct ScalarTable {
    generators: BTreeMap<ScalarKind, ScalarFn>,
}

impl Default for ScalarTable {
    fn default() -> Self {
        let generators = ScalarKind::ALL
            .iter()
            .map(|kind| (*kind, standard_generator(*kind)))
            .collect();
        Self { generators }
    }
}

impl fmt::Debug for ScalarTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.generators.keys()).finish()
    }
}

impl ScalarTable {
    /// A table with no generators.
    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Install `generator` for `kind`, returning the one it replaces.
    pub fn insert(&mut self, kind: ScalarKind, generator: ScalarFn) -> Option<ScalarFn> {
        self.generators.insert(kind, generator)
    }

    pub fn remove(&mut self, kind: ScalarKind) -> Option<ScalarFn> {
        self.generators.remove(&kind)
    }

    pub fn get(&self, kind: ScalarKind) -> Option<ScalarFn> {
        self.generators.get(&kind).copied()
    }

    /// Generate a value of `kind` for the field named `field`.
    pub fn generate(
        &self,
        field: &str,
        kind: ScalarKind,
        stream: &mut RandomStream,
        config: &Config,
    ) -> Result<Value, Error> {
        let generator = self
            .get(kind)
            .ok_or_else(|| Error::unsupported_scalar(field, kind))?;
        Ok(generator(stream, config))
    }
}

fn standard_generator(kind: ScalarKind) -> ScalarFn {
    match kind {
        ScalarKind::Int32 => |s, _| Value::Int32(s.next_u32() as i32),
        ScalarKind::Int64 => |s, _| Value::Int64(s.next_u64() as i64),
        ScalarKind::Uint32 => |s, _| Value::Uint32(s.next_u32()),
        ScalarKind::Uint64 => |s, _| Value::Uint64(s.next_u64()),
        ScalarKind::Sint32 => |s, _| Value::Sint32(s.next_u32() as i32),
        ScalarKind::Sint64 => |s, _| Value::Sint64(s.next_u64() as i64),
        ScalarKind::Bool => |s, _| Value::Bool(s.next_bool()),
        ScalarKind::Fixed32 => |s, _| Value::Fixed32(s.next_u32()),
        ScalarKind::Sfixed32 => |s, _| Value::Sfixed32(s.next_u32() as i32),
        ScalarKind::Float => |s, _| Value::Float(s.next_f32()),
        ScalarKind::Fixed64 => |s, _| Value::Fixed64(s.next_u64()),
        ScalarKind::Sfixed64 => |s, _| Value::Sfixed64(s.next_u64() as i64),
        ScalarKind::Double => |s, _| Value::Double(s.next_f64()),
        ScalarKind::String => random_string,
        ScalarKind::Bytes => |s, _| Value::Bytes(random_bytes(s)),
    }
}

fn random_string(stream: &mut RandomStream, config: &Config) -> Value {
    let len = config.string_length.draw(stream);
    let s = (0..len)
        .map(|_| char::from(ALPHABET[stream.index(ALPHABET.len())]))
        .collect();
    Value::String(s)
}

/// [`BYTES_LEN`] random bytes.
pub fn random_bytes(stream: &mut RandomStream) -> Bytes {
    let mut buf = [0u8; BYTES_LEN];
    stream.fill_bytes(&mut buf);
    Bytes::copy_from_slice(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_generates_its_own_variant() {
        let table = ScalarTable::default();
        let config = Config::new();
        let mut stream = RandomStream::new(99);

        for kind in ScalarKind::ALL {
            let value = table.generate("f", kind, &mut stream, &config).unwrap();
            assert_eq!(value.scalar_kind(), Some(kind), "{kind}");
        }
    }

    #[test]
    fn test_bytes_are_fixed_length() {
        let mut stream = RandomStream::new(5);
        let a = random_bytes(&mut stream);
        let b = random_bytes(&mut stream);
        assert_eq!(a.len(), BYTES_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn test_string_length_follows_config() {
        let table = ScalarTable::default();
        let mut config = Config::new();
        config.string_length_range(4, 4);
        let mut stream = RandomStream::new(5);

        for _ in 0..8 {
            let value = table
                .generate("name", ScalarKind::String, &mut stream, &config)
                .unwrap();
            let s = value.as_str().unwrap();
            assert_eq!(s.len(), 4);
            assert!(s.bytes().all(|b| b.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_one_draw_per_integer() {
        let table = ScalarTable::default();
        let config = Config::new();
        let mut stream = RandomStream::new(11);
        let mut mirror = RandomStream::new(11);

        let value = table
            .generate("n", ScalarKind::Uint32, &mut stream, &config)
            .unwrap();
        assert_eq!(value, Value::Uint32(mirror.next_u32()));
        assert_eq!(stream.next_u64(), mirror.next_u64());
    }

    #[test]
    fn test_missing_kind_is_fatal() {
        let mut table = ScalarTable::default();
        table.remove(ScalarKind::Double);
        let config = Config::new();
        let mut stream = RandomStream::new(1);

        assert_eq!(
            table.generate("ratio", ScalarKind::Double, &mut stream, &config),
            Err(Error::UnsupportedFieldKind {
                field: "ratio".to_string(),
                kind: "double",
            })
        );
    }

    #[test]
    fn test_replaced_generator() {
        let mut table = ScalarTable::default();
        table.insert(ScalarKind::Bool, |_, _| Value::Bool(false));
        let config = Config::new();
        let mut stream = RandomStream::new(1);

        for _ in 0..4 {
            assert_eq!(
                table.generate("flag", ScalarKind::Bool, &mut stream, &config),
                Ok(Value::Bool(false))
            );
        }
    }
}
