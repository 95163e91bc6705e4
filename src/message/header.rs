//! Header section - transport-level delivery metadata.
//!
//! Decode only: the write path deliberately omits this section, but a broker
//! may deliver it, so the decoder must understand it. Like
//! [`Properties`](super::Properties), this codec parses its own leading tag.

use super::{optional_bool, optional_ubyte, optional_uint, read_section_descriptor};
use crate::codec::formats::sections;
use crate::codec::{AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// AMQP default priority when the field is absent.
const DEFAULT_PRIORITY: u8 = 4;

/// Decoded header section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// True if the message survives broker restarts.
    pub durable: bool,
    /// Relative priority, 0-9.
    pub priority: u8,
    /// Time to live in milliseconds.
    pub ttl: Option<u32>,
    /// True if this receiver is the first to acquire the message.
    pub first_acquirer: bool,
    /// Number of prior unsuccessful delivery attempts.
    pub delivery_count: u32,
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self {
            durable: false,
            priority: DEFAULT_PRIORITY,
            ttl: None,
            first_acquirer: false,
            delivery_count: 0,
        }
    }
}

impl MessageHeader {
    /// Decode a full header section, including its leading tag.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let descriptor = read_section_descriptor(reader)?;
        if descriptor != sections::HEADER {
            return Err(StreamError::Codec(format!(
                "expected header descriptor 0x70, got 0x{descriptor:02x}"
            )));
        }

        let fields = match AmqpValue::decode(reader)? {
            AmqpValue::List(fields) => fields,
            AmqpValue::Null => Vec::new(),
            other => {
                return Err(StreamError::Codec(format!(
                    "header body must be a list, got {other:?}"
                )))
            }
        };

        let mut it = fields.into_iter();
        Ok(Self {
            durable: optional_bool(it.next(), "durable")?.unwrap_or(false),
            priority: optional_ubyte(it.next(), "priority")?.unwrap_or(DEFAULT_PRIORITY),
            ttl: optional_uint(it.next(), "ttl")?,
            first_acquirer: optional_bool(it.next(), "first-acquirer")?.unwrap_or(false),
            delivery_count: optional_uint(it.next(), "delivery-count")?.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::write_section_prefix;
    use bytes::BytesMut;

    fn encode_header_fields(fields: Vec<AmqpValue>) -> BytesMut {
        let mut buf = BytesMut::new();
        write_section_prefix(&mut buf, sections::HEADER);
        AmqpValue::List(fields).encode(&mut buf);
        buf
    }

    #[test]
    fn test_decode_all_fields() {
        let buf = encode_header_fields(vec![
            AmqpValue::Bool(true),
            AmqpValue::Ubyte(7),
            AmqpValue::Uint(30_000),
            AmqpValue::Bool(true),
            AmqpValue::Uint(2),
        ]);
        let mut reader = ByteReader::new(&buf);
        let header = MessageHeader::decode(&mut reader).unwrap();

        assert!(header.durable);
        assert_eq!(header.priority, 7);
        assert_eq!(header.ttl, Some(30_000));
        assert!(header.first_acquirer);
        assert_eq!(header.delivery_count, 2);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_decode_empty_list_uses_defaults() {
        let buf = encode_header_fields(vec![]);
        let mut reader = ByteReader::new(&buf);
        let header = MessageHeader::decode(&mut reader).unwrap();
        assert_eq!(header, MessageHeader::default());
        assert_eq!(header.priority, DEFAULT_PRIORITY);
    }

    #[test]
    fn test_decode_partial_list() {
        let buf = encode_header_fields(vec![AmqpValue::Bool(true)]);
        let mut reader = ByteReader::new(&buf);
        let header = MessageHeader::decode(&mut reader).unwrap();
        assert!(header.durable);
        assert_eq!(header.ttl, None);
        assert_eq!(header.delivery_count, 0);
    }

    #[test]
    fn test_wrong_descriptor_rejected() {
        let mut buf = BytesMut::new();
        write_section_prefix(&mut buf, sections::FOOTER);
        AmqpValue::List(vec![]).encode(&mut buf);
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(
            MessageHeader::decode(&mut reader),
            Err(StreamError::Codec(_))
        ));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let buf = encode_header_fields(vec![AmqpValue::Uint(1)]);
        let mut reader = ByteReader::new(&buf);
        assert!(matches!(
            MessageHeader::decode(&mut reader),
            Err(StreamError::Codec(_))
        ));
    }
}
