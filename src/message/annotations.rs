//! Message-annotations section - a described map keyed by symbols or ulongs.
//!
//! Annotations carry broker- and client-side metadata that travels with the
//! message (e.g. routing hints). Keys are kept as [`AmqpValue`] because the
//! grammar allows both symbol and ulong keys.

use bytes::BytesMut;

use super::write_section_prefix;
use crate::codec::formats::{sections, SECTION_PREFIX_SIZE};
use crate::codec::{encode_map, map_encoded_size, AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Message-annotations section codec and container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    entries: Vec<(AmqpValue, AmqpValue)>,
}

impl Annotations {
    /// Create an empty annotations map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair, replacing any existing entry with the same key.
    pub fn insert(&mut self, key: AmqpValue, value: AmqpValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Insert under a symbol key (the common case).
    pub fn insert_symbol(&mut self, key: &str, value: AmqpValue) {
        self.insert(AmqpValue::Symbol(key.to_string()), value);
    }

    /// Look up a value by key.
    pub fn get(&self, key: &AmqpValue) -> Option<&AmqpValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a value by symbol key.
    pub fn get_symbol(&self, key: &str) -> Option<&AmqpValue> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, AmqpValue::Symbol(s) if s == key))
            .map(|(_, v)| v)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &(AmqpValue, AmqpValue)> {
        self.entries.iter()
    }

    /// Encoded size of the full section (prefix + map).
    pub fn size(&self) -> usize {
        SECTION_PREFIX_SIZE + map_encoded_size(&self.entries)
    }

    /// Append the section to `buf`, returning the number of bytes written.
    pub fn write(&self, buf: &mut BytesMut) -> usize {
        let start = buf.len();
        write_section_prefix(buf, sections::MESSAGE_ANNOTATIONS);
        encode_map(buf, &self.entries);
        buf.len() - start
    }

    /// Decode the section body (descriptor already consumed by the caller).
    pub fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        match AmqpValue::decode(reader)? {
            AmqpValue::Map(entries) => Ok(Self { entries }),
            AmqpValue::Null => Ok(Self::default()),
            other => Err(StreamError::Codec(format!(
                "annotations body must be a map, got {other:?}"
            ))),
        }
    }
}
