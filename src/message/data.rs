//! Data body section - an opaque binary payload.
//!
//! On the wire: described constructor + data descriptor (0x75) followed by
//! an AMQP binary value. This is the only body form the encoder emits.

use bytes::{Bytes, BytesMut};

use super::write_section_prefix;
use crate::codec::formats::{sections, SECTION_PREFIX_SIZE};
use crate::codec::{variable_size, AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Codec for the data body section.
///
/// Stateless marker struct; the payload lives on the [`Message`](super::Message).
pub struct Data;

impl Data {
    /// Encoded size of a data section carrying `payload`.
    #[inline]
    pub fn encoded_size(payload: &[u8]) -> usize {
        SECTION_PREFIX_SIZE + variable_size(payload.len())
    }

    /// Append the section to `buf`, returning the number of bytes written.
    pub fn write(buf: &mut BytesMut, payload: &[u8]) -> usize {
        let start = buf.len();
        write_section_prefix(buf, sections::DATA);
        AmqpValue::Binary(Bytes::copy_from_slice(payload)).encode(buf);
        buf.len() - start
    }

    /// Decode the section body (descriptor already consumed by the caller).
    pub fn decode_body(reader: &mut ByteReader<'_>) -> Result<Bytes> {
        match AmqpValue::decode(reader)? {
            AmqpValue::Binary(b) => Ok(b),
            other => Err(StreamError::Codec(format!(
                "data section body must be binary, got {other:?}"
            ))),
        }
    }
}
