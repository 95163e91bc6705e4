//! Message module - bare-message section codecs and the [`Message`] composite.
//!
//! Each section codec is a self-contained encode/decode unit for one protocol
//! section; [`Message`] composes them and owns section order and total size:
//!
//! - [`Data`] - binary body section
//! - [`Annotations`] - message-annotations section
//! - [`ApplicationProperties`] - application-properties section
//! - [`Properties`] - standard properties section
//! - [`MessageHeader`] - header section (decode only)
//! - [`BufferPool`] / [`LeasedBuffer`] - scoped ownership of pooled payload buffers

mod annotations;
mod app_properties;
mod data;
mod header;
mod lease;
#[allow(clippy::module_inception)]
mod message;
mod properties;

pub use annotations::Annotations;
pub use app_properties::ApplicationProperties;
pub use data::Data;
pub use header::MessageHeader;
pub use lease::{BufferPool, LeasedBuffer};
pub use message::Message;
pub use properties::Properties;

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::formats::{codes, DESCRIBED};
use crate::codec::{AmqpValue, ByteReader};
use crate::error::{Result, StreamError};

/// Write a described-section prefix: `0x00` constructor + smallulong descriptor.
///
/// All section descriptors fit in one byte, so the prefix is always
/// [`SECTION_PREFIX_SIZE`](crate::codec::formats::SECTION_PREFIX_SIZE) bytes.
pub(crate) fn write_section_prefix(buf: &mut BytesMut, descriptor: u64) {
    debug_assert!(descriptor <= 0xFF);
    buf.put_u8(DESCRIBED);
    buf.put_u8(codes::SMALL_ULONG);
    buf.put_u8(descriptor as u8);
}

/// Read a described-section constructor and return the descriptor code.
///
/// Accepts any ulong width for the descriptor.
pub(crate) fn read_section_descriptor(reader: &mut ByteReader<'_>) -> Result<u64> {
    let constructor = reader.read_u8()?;
    if constructor != DESCRIBED {
        return Err(StreamError::Codec(format!(
            "expected described constructor 0x00, got 0x{constructor:02x}"
        )));
    }
    match AmqpValue::decode(reader)? {
        AmqpValue::Ulong(code) => Ok(code),
        other => Err(StreamError::Codec(format!(
            "section descriptor must be a ulong, got {other:?}"
        ))),
    }
}

// Field coercion helpers shared by the list-shaped sections (properties,
// header). `None` and wire null both map to an absent field.

pub(crate) fn optional_value(field: Option<AmqpValue>) -> Option<AmqpValue> {
    match field {
        None | Some(AmqpValue::Null) => None,
        Some(v) => Some(v),
    }
}

pub(crate) fn optional_string(field: Option<AmqpValue>, name: &str) -> Result<Option<String>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::String(s)) | Some(AmqpValue::Symbol(s)) => Ok(Some(s)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be a string, got {other:?}"
        ))),
    }
}

pub(crate) fn optional_binary(field: Option<AmqpValue>, name: &str) -> Result<Option<Bytes>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Binary(b)) => Ok(Some(b)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be binary, got {other:?}"
        ))),
    }
}

pub(crate) fn optional_timestamp(field: Option<AmqpValue>, name: &str) -> Result<Option<i64>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Timestamp(t)) => Ok(Some(t)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be a timestamp, got {other:?}"
        ))),
    }
}

pub(crate) fn optional_uint(field: Option<AmqpValue>, name: &str) -> Result<Option<u32>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Uint(v)) => Ok(Some(v)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be a uint, got {other:?}"
        ))),
    }
}

pub(crate) fn optional_ubyte(field: Option<AmqpValue>, name: &str) -> Result<Option<u8>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Ubyte(v)) => Ok(Some(v)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be a ubyte, got {other:?}"
        ))),
    }
}

pub(crate) fn optional_bool(field: Option<AmqpValue>, name: &str) -> Result<Option<bool>> {
    match field {
        None | Some(AmqpValue::Null) => Ok(None),
        Some(AmqpValue::Bool(v)) => Ok(Some(v)),
        Some(other) => Err(StreamError::Codec(format!(
            "field {name} must be a boolean, got {other:?}"
        ))),
    }
}
