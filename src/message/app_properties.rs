//! Application-properties section - a described map with string keys.
//!
//! Application properties are the user-facing key/value headers of a message;
//! keys are strings on the wire, values any simple AMQP value.

use bytes::BytesMut;

use super::write_section_prefix;
use crate::codec::formats::{sections, SECTION_PREFIX_SIZE};
use crate::codec::{compound_size, encode_map, variable_size, AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Application-properties section codec and container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationProperties {
    entries: Vec<(String, AmqpValue)>,
}

impl ApplicationProperties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair, replacing any existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: AmqpValue) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&AmqpValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
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
    pub fn iter(&self) -> impl Iterator<Item = &(String, AmqpValue)> {
        self.entries.iter()
    }

    /// Encoded size of the full section (prefix + map).
    pub fn size(&self) -> usize {
        let elements: usize = self
            .entries
            .iter()
            .map(|(k, v)| variable_size(k.len()) + v.encoded_size())
            .sum();
        SECTION_PREFIX_SIZE + compound_size(elements, self.entries.len() * 2)
    }

    /// Append the section to `buf`, returning the number of bytes written.
    pub fn write(&self, buf: &mut BytesMut) -> usize {
        let start = buf.len();
        write_section_prefix(buf, sections::APPLICATION_PROPERTIES);
        let pairs: Vec<(AmqpValue, AmqpValue)> = self
            .entries
            .iter()
            .map(|(k, v)| (AmqpValue::String(k.clone()), v.clone()))
            .collect();
        encode_map(buf, &pairs);
        buf.len() - start
    }

    /// Decode the section body (descriptor already consumed by the caller).
    pub fn decode_body(reader: &mut ByteReader<'_>) -> Result<Self> {
        let pairs = match AmqpValue::decode(reader)? {
            AmqpValue::Map(pairs) => pairs,
            AmqpValue::Null => return Ok(Self::default()),
            other => {
                return Err(StreamError::Codec(format!(
                    "application-properties body must be a map, got {other:?}"
                )))
            }
        };

        let mut entries = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let key = match key {
                AmqpValue::String(s) | AmqpValue::Symbol(s) => s,
                other => {
                    return Err(StreamError::Codec(format!(
                        "application-properties key must be a string, got {other:?}"
                    )))
                }
            };
            entries.push((key, value));
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::read_section_descriptor;

    #[test]
    fn test_insert_replace_get() {
        let mut props = ApplicationProperties::new();
        props.insert("region", AmqpValue::String("eu-west".to_string()));
        props.insert("attempt", AmqpValue::Uint(1));
        props.insert("attempt", AmqpValue::Uint(2));

        assert_eq!(props.len(), 2);
        assert_eq!(props.get("attempt"), Some(&AmqpValue::Uint(2)));
        assert_eq!(props.get("missing"), None);
    }

    #[test]
    fn test_write_matches_size_and_roundtrips() {
        let mut props = ApplicationProperties::new();
        props.insert("id", AmqpValue::Ulong(99));
        props.insert("tag", AmqpValue::String("alpha".to_string()));
        props.insert("flag", AmqpValue::Bool(false));

        let mut buf = BytesMut::new();
        let written = props.write(&mut buf);
        assert_eq!(written, props.size());
        assert_eq!(written, buf.len());

        let mut reader = ByteReader::new(&buf);
        assert_eq!(
            read_section_descriptor(&mut reader).unwrap(),
            sections::APPLICATION_PROPERTIES
        );
        let decoded = ApplicationProperties::decode_body(&mut reader).unwrap();
        assert_eq!(decoded, props);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_large_map_size_agreement() {
        let mut props = ApplicationProperties::new();
        for i in 0..64 {
            props.insert(format!("key-{i}"), AmqpValue::String("v".repeat(8)));
        }
        let mut buf = BytesMut::new();
        assert_eq!(props.write(&mut buf), props.size());
    }

    #[test]
    fn test_non_string_key_rejected() {
        let mut buf = BytesMut::new();
        AmqpValue::Map(vec![(AmqpValue::Uint(1), AmqpValue::Null)]).encode(&mut buf);
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(
            ApplicationProperties::decode_body(&mut reader),
            Err(StreamError::Codec(_))
        ));
    }
}
