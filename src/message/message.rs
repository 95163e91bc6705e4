//! The Message composite - section assembly, total size, and the wire codec.
//!
//! Write order is fixed: Properties, ApplicationProperties, Annotations, Data.
//! Decode is order-agnostic and accumulates whichever sections appear; a
//! repeated section overwrites the previous one (current behavior, not
//! validated). An unrecognized section descriptor fails the whole decode call
//! with [`StreamError::MalformedSection`] - there is no partial result.
//!
//! # Example
//!
//! ```
//! use streamwire_client::message::Message;
//! use bytes::BytesMut;
//!
//! let msg = Message::new(&b"payload"[..]);
//! let mut buf = BytesMut::new();
//! let written = msg.write(&mut buf);
//! assert_eq!(written, msg.size());
//!
//! let decoded = Message::decode(&buf, written as u32).unwrap();
//! assert_eq!(decoded.data(), b"payload");
//! ```

use bytes::{Bytes, BytesMut};

use super::{
    read_section_descriptor, Annotations, ApplicationProperties, Data, LeasedBuffer,
    MessageHeader, Properties,
};
use crate::codec::formats::sections;
use crate::codec::{AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Storage behind the data body: either plain bytes or an exclusive lease.
#[derive(Debug)]
enum Body {
    Inline(Bytes),
    Leased(LeasedBuffer),
}

/// A structured protocol message.
#[derive(Debug)]
pub struct Message {
    /// Header section (broker-delivered only; never written).
    pub header: Option<MessageHeader>,
    /// Message-annotations section.
    pub annotations: Option<Annotations>,
    /// Standard properties section.
    pub properties: Option<Properties>,
    /// Application-properties section.
    pub application_properties: Option<ApplicationProperties>,
    /// Alternative opaque body, populated when decoding an amqp-value-bodied
    /// message. Never written.
    pub amqp_value: Option<AmqpValue>,
    body: Body,
    offset: u64,
}

impl Message {
    /// Create a message from raw payload bytes.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_body(Body::Inline(data.into()))
    }

    /// Create a message wrapping a pre-leased buffer.
    ///
    /// The message becomes the exclusive owner of the lease and releases it
    /// via [`release`](Self::release) or, as a last resort, on drop.
    pub fn from_lease(lease: LeasedBuffer) -> Self {
        Self::with_body(Body::Leased(lease))
    }

    fn with_body(body: Body) -> Self {
        Self {
            header: None,
            annotations: None,
            properties: None,
            application_properties: None,
            amqp_value: None,
            body,
            offset: 0,
        }
    }

    /// The data body payload. Empty after [`release`](Self::release).
    pub fn data(&self) -> &[u8] {
        match &self.body {
            Body::Inline(bytes) => bytes,
            Body::Leased(lease) => lease.bytes(),
        }
    }

    /// Stream offset this message was consumed at (consumer bookkeeping).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Record the stream offset this message was consumed at.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Total encoded size, recomputed from the currently-set sections so it
    /// always reflects the most recent mutation.
    pub fn size(&self) -> usize {
        let mut size = 0;
        if let Some(p) = &self.properties {
            size += p.size();
        }
        if let Some(ap) = &self.application_properties {
            size += ap.size();
        }
        if let Some(a) = &self.annotations {
            size += a.size();
        }
        size + Data::encoded_size(self.data())
    }

    /// Append the message to `buf` in fixed section order - Properties,
    /// ApplicationProperties, Annotations, Data - writing only the sections
    /// that are present. Returns the number of bytes written, which always
    /// equals [`size`](Self::size).
    pub fn write(&self, buf: &mut BytesMut) -> usize {
        let start = buf.len();
        if let Some(p) = &self.properties {
            p.write(buf);
        }
        if let Some(ap) = &self.application_properties {
            ap.write(buf);
        }
        if let Some(a) = &self.annotations {
            a.write(buf);
        }
        Data::write(buf, self.data());

        let written = buf.len() - start;
        debug_assert_eq!(written, self.size());
        written
    }

    /// Decode a message from `declared_len` bytes of `buf`.
    ///
    /// Section constructors are read sequentially until exactly
    /// `declared_len` bytes have been consumed. Properties and header
    /// sections are re-read from their start because those codecs parse
    /// their own leading tag.
    pub fn decode(buf: &[u8], declared_len: u32) -> Result<Self> {
        let declared = declared_len as usize;
        if buf.len() < declared {
            return Err(StreamError::UnexpectedEof);
        }

        let mut reader = ByteReader::new(&buf[..declared]);
        let mut header = None;
        let mut annotations = None;
        let mut properties = None;
        let mut application_properties = None;
        let mut amqp_value = None;
        let mut data: Option<Bytes> = None;

        while !reader.is_empty() {
            let section_start = reader.position();
            let descriptor = read_section_descriptor(&mut reader)?;
            match descriptor {
                sections::DATA => {
                    data = Some(Data::decode_body(&mut reader)?);
                }
                sections::MESSAGE_ANNOTATIONS => {
                    annotations = Some(Annotations::decode_body(&mut reader)?);
                }
                sections::PROPERTIES => {
                    reader.seek(section_start);
                    properties = Some(Properties::decode(&mut reader)?);
                }
                sections::APPLICATION_PROPERTIES => {
                    application_properties =
                        Some(ApplicationProperties::decode_body(&mut reader)?);
                }
                sections::HEADER => {
                    reader.seek(section_start);
                    header = Some(MessageHeader::decode(&mut reader)?);
                }
                sections::AMQP_VALUE => {
                    amqp_value = Some(AmqpValue::decode(&mut reader)?);
                }
                other => return Err(StreamError::MalformedSection(other)),
            }
        }

        Ok(Self {
            header,
            annotations,
            properties,
            application_properties,
            amqp_value,
            body: Body::Inline(data.unwrap_or_default()),
            offset: 0,
        })
    }

    /// Release the leased buffer backing the data body, if any.
    ///
    /// The lease is returned to its pool exactly once; afterwards
    /// [`data`](Self::data) reads as empty. A message with an inline body is
    /// unaffected. Dropping an unreleased message releases the lease as a
    /// defensive fallback.
    pub fn release(&mut self) {
        if let Body::Leased(lease) = &mut self.body {
            lease.release();
            self.body = Body::Inline(Bytes::new());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::formats::{codes, DESCRIBED};
    use crate::message::{write_section_prefix, BufferPool};
    use bytes::BufMut;

    fn sample_properties() -> Properties {
        Properties {
            message_id: Some(AmqpValue::Ulong(1)),
            subject: Some("evt".to_string()),
            ..Default::default()
        }
    }

    fn sample_app_properties() -> ApplicationProperties {
        let mut ap = ApplicationProperties::new();
        ap.insert("k", AmqpValue::String("v".to_string()));
        ap
    }

    fn sample_annotations() -> Annotations {
        let mut ann = Annotations::new();
        ann.insert_symbol("x-tag", AmqpValue::Uint(9));
        ann
    }

    #[test]
    fn test_data_only_roundtrip() {
        let msg = Message::new(&b"hello stream"[..]);
        let mut buf = BytesMut::new();
        let written = msg.write(&mut buf);
        assert_eq!(written, msg.size());

        let decoded = Message::decode(&buf, written as u32).unwrap();
        assert_eq!(decoded.data(), b"hello stream");
        assert!(decoded.properties.is_none());
        assert!(decoded.annotations.is_none());
    }

    #[test]
    fn test_size_write_agreement_all_section_combinations() {
        for mask in 0u8..8 {
            let mut msg = Message::new(&b"body"[..]);
            if mask & 1 != 0 {
                msg.properties = Some(sample_properties());
            }
            if mask & 2 != 0 {
                msg.application_properties = Some(sample_app_properties());
            }
            if mask & 4 != 0 {
                msg.annotations = Some(sample_annotations());
            }

            let mut buf = BytesMut::new();
            let written = msg.write(&mut buf);
            assert_eq!(written, msg.size(), "combination mask {mask}");
            assert_eq!(written, buf.len());

            let decoded = Message::decode(&buf, written as u32).unwrap();
            assert_eq!(decoded.data(), b"body");
            assert_eq!(decoded.properties.is_some(), mask & 1 != 0);
            assert_eq!(decoded.application_properties.is_some(), mask & 2 != 0);
            assert_eq!(decoded.annotations.is_some(), mask & 4 != 0);
        }
    }

    #[test]
    fn test_full_message_roundtrip() {
        let mut msg = Message::new(&b"payload"[..]);
        msg.properties = Some(sample_properties());
        msg.application_properties = Some(sample_app_properties());
        msg.annotations = Some(sample_annotations());

        let mut buf = BytesMut::new();
        let written = msg.write(&mut buf);

        let decoded = Message::decode(&buf, written as u32).unwrap();
        assert_eq!(decoded.data(), b"payload");
        assert_eq!(decoded.properties, msg.properties);
        assert_eq!(decoded.application_properties, msg.application_properties);
        assert_eq!(decoded.annotations, msg.annotations);
    }

    #[test]
    fn test_size_reflects_mutation() {
        let mut msg = Message::new(&b"x"[..]);
        let before = msg.size();
        msg.application_properties = Some(sample_app_properties());
        assert!(msg.size() > before);
        msg.application_properties = None;
        assert_eq!(msg.size(), before);
    }

    #[test]
    fn test_decode_is_order_agnostic() {
        // Write sections in a different order than the encoder uses:
        // Data first, then Properties.
        let mut buf = BytesMut::new();
        Data::write(&mut buf, b"first");
        sample_properties().write(&mut buf);

        let decoded = Message::decode(&buf, buf.len() as u32).unwrap();
        assert_eq!(decoded.data(), b"first");
        assert_eq!(decoded.properties, Some(sample_properties()));
    }

    #[test]
    fn test_repeated_section_overwrites() {
        let mut buf = BytesMut::new();
        Data::write(&mut buf, b"old");
        Data::write(&mut buf, b"new");

        let decoded = Message::decode(&buf, buf.len() as u32).unwrap();
        assert_eq!(decoded.data(), b"new");
    }

    #[test]
    fn test_decode_header_and_amqp_value_sections() {
        let mut buf = BytesMut::new();
        write_section_prefix(&mut buf, sections::HEADER);
        AmqpValue::List(vec![AmqpValue::Bool(true)]).encode(&mut buf);
        write_section_prefix(&mut buf, sections::AMQP_VALUE);
        AmqpValue::String("alt body".to_string()).encode(&mut buf);

        let decoded = Message::decode(&buf, buf.len() as u32).unwrap();
        assert!(decoded.header.as_ref().unwrap().durable);
        assert_eq!(
            decoded.amqp_value,
            Some(AmqpValue::String("alt body".to_string()))
        );
        assert!(decoded.data().is_empty());
    }

    #[test]
    fn test_unknown_section_is_malformed() {
        // delivery-annotations is a real section this decoder does not handle
        let mut buf = BytesMut::new();
        write_section_prefix(&mut buf, sections::DELIVERY_ANNOTATIONS);
        AmqpValue::Map(vec![]).encode(&mut buf);

        let err = Message::decode(&buf, buf.len() as u32).unwrap_err();
        assert!(matches!(
            err,
            StreamError::MalformedSection(code) if code == sections::DELIVERY_ANNOTATIONS
        ));
    }

    #[test]
    fn test_footer_section_is_malformed() {
        let mut buf = BytesMut::new();
        write_section_prefix(&mut buf, sections::FOOTER);
        AmqpValue::Map(vec![]).encode(&mut buf);
        assert!(Message::decode(&buf, buf.len() as u32).is_err());
    }

    #[test]
    fn test_declared_len_bounds_the_decode() {
        let mut buf = BytesMut::new();
        let msg = Message::new(&b"data"[..]);
        let written = msg.write(&mut buf);
        // Trailing garbage beyond declared_len must be ignored
        buf.put_slice(&[0xFF; 8]);

        let decoded = Message::decode(&buf, written as u32).unwrap();
        assert_eq!(decoded.data(), b"data");
    }

    #[test]
    fn test_declared_len_longer_than_buffer_is_eof() {
        let buf = [DESCRIBED, codes::SMALL_ULONG];
        assert!(matches!(
            Message::decode(&buf, 100),
            Err(StreamError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_leased_body_release() {
        let pool = BufferPool::new(1024);
        let mut msg = Message::from_lease(pool.lease_from(b"leased payload"));
        assert_eq!(msg.data(), b"leased payload");

        msg.release();
        assert!(msg.data().is_empty());
        assert_eq!(pool.free_count(), 1);

        // Second release is a no-op
        msg.release();
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_dropping_leased_message_returns_buffer() {
        let pool = BufferPool::new(1024);
        {
            let _msg = Message::from_lease(pool.lease_from(b"data"));
        }
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_offset_bookkeeping() {
        let mut msg = Message::new(&b"x"[..]);
        assert_eq!(msg.offset(), 0);
        msg.set_offset(12345);
        assert_eq!(msg.offset(), 12345);
    }
}
