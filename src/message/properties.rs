//! Properties section - the standard 13-field described list.
//!
//! Field order on the wire: message-id, user-id, to, subject, reply-to,
//! correlation-id, content-type, content-encoding, absolute-expiry-time,
//! creation-time, group-id, group-sequence, reply-to-group-id.
//!
//! Unlike the map-shaped sections, this codec parses its own leading tag:
//! [`Properties::decode`] expects the reader positioned at the described
//! constructor, and the message codec rewinds before calling it.

use bytes::{Bytes, BytesMut};

use super::{
    optional_binary, optional_string, optional_timestamp, optional_uint, optional_value,
    read_section_descriptor, write_section_prefix,
};
use crate::codec::formats::{sections, SECTION_PREFIX_SIZE};
use crate::codec::{encode_list, list_encoded_size, AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Standard properties section.
///
/// All fields are optional; absent trailing fields are trimmed from the wire
/// encoding, absent interior fields encode as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    /// Application message identifier (any simple value).
    pub message_id: Option<AmqpValue>,
    /// Creating user identity.
    pub user_id: Option<Bytes>,
    /// Destination node address.
    pub to: Option<String>,
    /// Message subject.
    pub subject: Option<String>,
    /// Address for replies.
    pub reply_to: Option<String>,
    /// Correlation identifier (any simple value).
    pub correlation_id: Option<AmqpValue>,
    /// MIME content type (symbol on the wire).
    pub content_type: Option<String>,
    /// MIME content encoding (symbol on the wire).
    pub content_encoding: Option<String>,
    /// Absolute expiry time, milliseconds since the epoch.
    pub absolute_expiry_time: Option<i64>,
    /// Creation time, milliseconds since the epoch.
    pub creation_time: Option<i64>,
    /// Group this message belongs to.
    pub group_id: Option<String>,
    /// Position of this message within its group.
    pub group_sequence: Option<u32>,
    /// Group for reply messages.
    pub reply_to_group_id: Option<String>,
}

impl Properties {
    /// Create an empty properties section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire field list with trailing nulls trimmed.
    fn to_fields(&self) -> Vec<AmqpValue> {
        let opt = |v: &Option<AmqpValue>| v.clone().unwrap_or(AmqpValue::Null);
        let string = |v: &Option<String>| {
            v.clone().map(AmqpValue::String).unwrap_or(AmqpValue::Null)
        };
        let symbol = |v: &Option<String>| {
            v.clone().map(AmqpValue::Symbol).unwrap_or(AmqpValue::Null)
        };
        let timestamp =
            |v: &Option<i64>| v.map(AmqpValue::Timestamp).unwrap_or(AmqpValue::Null);

        let mut fields = vec![
            opt(&self.message_id),
            self.user_id
                .clone()
                .map(AmqpValue::Binary)
                .unwrap_or(AmqpValue::Null),
            string(&self.to),
            string(&self.subject),
            string(&self.reply_to),
            opt(&self.correlation_id),
            symbol(&self.content_type),
            symbol(&self.content_encoding),
            timestamp(&self.absolute_expiry_time),
            timestamp(&self.creation_time),
            string(&self.group_id),
            self.group_sequence
                .map(AmqpValue::Uint)
                .unwrap_or(AmqpValue::Null),
            string(&self.reply_to_group_id),
        ];
        while fields.last() == Some(&AmqpValue::Null) {
            fields.pop();
        }
        fields
    }

    /// Encoded size of the full section (prefix + list).
    pub fn size(&self) -> usize {
        SECTION_PREFIX_SIZE + list_encoded_size(&self.to_fields())
    }

    /// Append the section to `buf`, returning the number of bytes written.
    pub fn write(&self, buf: &mut BytesMut) -> usize {
        let start = buf.len();
        write_section_prefix(buf, sections::PROPERTIES);
        encode_list(buf, &self.to_fields());
        buf.len() - start
    }

    /// Decode a full properties section, including its leading tag.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let descriptor = read_section_descriptor(reader)?;
        if descriptor != sections::PROPERTIES {
            return Err(StreamError::Codec(format!(
                "expected properties descriptor 0x73, got 0x{descriptor:02x}"
            )));
        }

        let fields = match AmqpValue::decode(reader)? {
            AmqpValue::List(fields) => fields,
            AmqpValue::Null => Vec::new(),
            other => {
                return Err(StreamError::Codec(format!(
                    "properties body must be a list, got {other:?}"
                )))
            }
        };

        let mut it = fields.into_iter();
        Ok(Self {
            message_id: optional_value(it.next()),
            user_id: optional_binary(it.next(), "user-id")?,
            to: optional_string(it.next(), "to")?,
            subject: optional_string(it.next(), "subject")?,
            reply_to: optional_string(it.next(), "reply-to")?,
            correlation_id: optional_value(it.next()),
            content_type: optional_string(it.next(), "content-type")?,
            content_encoding: optional_string(it.next(), "content-encoding")?,
            absolute_expiry_time: optional_timestamp(it.next(), "absolute-expiry-time")?,
            creation_time: optional_timestamp(it.next(), "creation-time")?,
            group_id: optional_string(it.next(), "group-id")?,
            group_sequence: optional_uint(it.next(), "group-sequence")?,
            reply_to_group_id: optional_string(it.next(), "reply-to-group-id")?,
        })
    }
}
