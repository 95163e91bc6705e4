//! AMQP 1.0 primitive values.
//!
//! [`AmqpValue`] is the dynamic value type the section codecs are built on:
//! described lists (properties, header), described maps (annotations,
//! application-properties) and the opaque amqp-value body all bottom out here.
//!
//! The encoder always picks the smallest legal width for a value
//! (`uint0`/`smalluint`/`uint` and so on); the decoder accepts every width.
//! [`AmqpValue::encoded_size`] and [`AmqpValue::encode`] agree byte-for-byte,
//! which is what lets `Message::size` promise an exact `write` length.
//!
//! # Example
//!
//! ```
//! use streamwire_client::codec::AmqpValue;
//! use bytes::BytesMut;
//!
//! let value = AmqpValue::String("hello".to_string());
//! let mut buf = BytesMut::new();
//! let written = value.encode(&mut buf);
//! assert_eq!(written, value.encoded_size());
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::formats::codes;
use super::reader::ByteReader;
use crate::error::{Result, StreamError};

/// A dynamically typed AMQP 1.0 value.
#[derive(Debug, Clone, PartialEq)]
pub enum AmqpValue {
    Null,
    Bool(bool),
    Ubyte(u8),
    Ushort(u16),
    Uint(u32),
    Ulong(u64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Uuid([u8; 16]),
    Binary(Bytes),
    String(String),
    Symbol(String),
    List(Vec<AmqpValue>),
    /// Key/value pairs in wire order. Keys are not deduplicated here.
    Map(Vec<(AmqpValue, AmqpValue)>),
}

impl AmqpValue {
    /// Exact number of bytes [`encode`](Self::encode) will produce.
    pub fn encoded_size(&self) -> usize {
        match self {
            AmqpValue::Null => 1,
            AmqpValue::Bool(_) => 1,
            AmqpValue::Ubyte(_) => 2,
            AmqpValue::Ushort(_) => 3,
            AmqpValue::Uint(v) => match v {
                0 => 1,
                1..=255 => 2,
                _ => 5,
            },
            AmqpValue::Ulong(v) => match v {
                0 => 1,
                1..=255 => 2,
                _ => 9,
            },
            AmqpValue::Byte(_) => 2,
            AmqpValue::Short(_) => 3,
            AmqpValue::Int(v) => {
                if i8::try_from(*v).is_ok() {
                    2
                } else {
                    5
                }
            }
            AmqpValue::Long(v) => {
                if i8::try_from(*v).is_ok() {
                    2
                } else {
                    9
                }
            }
            AmqpValue::Float(_) => 5,
            AmqpValue::Double(_) => 9,
            AmqpValue::Timestamp(_) => 9,
            AmqpValue::Uuid(_) => 17,
            AmqpValue::Binary(b) => variable_size(b.len()),
            AmqpValue::String(s) => variable_size(s.len()),
            AmqpValue::Symbol(s) => variable_size(s.len()),
            AmqpValue::List(items) => list_encoded_size(items),
            AmqpValue::Map(pairs) => map_encoded_size(pairs),
        }
    }

    /// Append this value to `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut BytesMut) -> usize {
        let start = buf.len();
        match self {
            AmqpValue::Null => buf.put_u8(codes::NULL),
            AmqpValue::Bool(true) => buf.put_u8(codes::BOOLEAN_TRUE),
            AmqpValue::Bool(false) => buf.put_u8(codes::BOOLEAN_FALSE),
            AmqpValue::Ubyte(v) => {
                buf.put_u8(codes::UBYTE);
                buf.put_u8(*v);
            }
            AmqpValue::Ushort(v) => {
                buf.put_u8(codes::USHORT);
                buf.put_u16(*v);
            }
            AmqpValue::Uint(v) => match v {
                0 => buf.put_u8(codes::UINT0),
                1..=255 => {
                    buf.put_u8(codes::SMALL_UINT);
                    buf.put_u8(*v as u8);
                }
                _ => {
                    buf.put_u8(codes::UINT);
                    buf.put_u32(*v);
                }
            },
            AmqpValue::Ulong(v) => match v {
                0 => buf.put_u8(codes::ULONG0),
                1..=255 => {
                    buf.put_u8(codes::SMALL_ULONG);
                    buf.put_u8(*v as u8);
                }
                _ => {
                    buf.put_u8(codes::ULONG);
                    buf.put_u64(*v);
                }
            },
            AmqpValue::Byte(v) => {
                buf.put_u8(codes::BYTE);
                buf.put_i8(*v);
            }
            AmqpValue::Short(v) => {
                buf.put_u8(codes::SHORT);
                buf.put_i16(*v);
            }
            AmqpValue::Int(v) => {
                if let Ok(small) = i8::try_from(*v) {
                    buf.put_u8(codes::SMALL_INT);
                    buf.put_i8(small);
                } else {
                    buf.put_u8(codes::INT);
                    buf.put_i32(*v);
                }
            }
            AmqpValue::Long(v) => {
                if let Ok(small) = i8::try_from(*v) {
                    buf.put_u8(codes::SMALL_LONG);
                    buf.put_i8(small);
                } else {
                    buf.put_u8(codes::LONG);
                    buf.put_i64(*v);
                }
            }
            AmqpValue::Float(v) => {
                buf.put_u8(codes::FLOAT);
                buf.put_u32(v.to_bits());
            }
            AmqpValue::Double(v) => {
                buf.put_u8(codes::DOUBLE);
                buf.put_u64(v.to_bits());
            }
            AmqpValue::Timestamp(v) => {
                buf.put_u8(codes::TIMESTAMP);
                buf.put_i64(*v);
            }
            AmqpValue::Uuid(v) => {
                buf.put_u8(codes::UUID);
                buf.put_slice(v);
            }
            AmqpValue::Binary(b) => encode_variable(buf, codes::VBIN8, codes::VBIN32, b),
            AmqpValue::String(s) => encode_variable(buf, codes::STR8, codes::STR32, s.as_bytes()),
            AmqpValue::Symbol(s) => encode_variable(buf, codes::SYM8, codes::SYM32, s.as_bytes()),
            AmqpValue::List(items) => {
                encode_list(buf, items);
            }
            AmqpValue::Map(pairs) => {
                encode_map(buf, pairs);
            }
        }
        buf.len() - start
    }

    /// Decode a single value from the reader.
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let code = reader.read_u8()?;
        let value = match code {
            codes::NULL => AmqpValue::Null,
            codes::BOOLEAN_TRUE => AmqpValue::Bool(true),
            codes::BOOLEAN_FALSE => AmqpValue::Bool(false),
            codes::BOOLEAN => AmqpValue::Bool(reader.read_u8()? != 0),
            codes::UINT0 => AmqpValue::Uint(0),
            codes::ULONG0 => AmqpValue::Ulong(0),
            codes::UBYTE => AmqpValue::Ubyte(reader.read_u8()?),
            codes::USHORT => AmqpValue::Ushort(reader.read_u16()?),
            codes::SMALL_UINT => AmqpValue::Uint(reader.read_u8()? as u32),
            codes::UINT => AmqpValue::Uint(reader.read_u32()?),
            codes::SMALL_ULONG => AmqpValue::Ulong(reader.read_u8()? as u64),
            codes::ULONG => AmqpValue::Ulong(reader.read_u64()?),
            codes::BYTE => AmqpValue::Byte(reader.read_i8()?),
            codes::SHORT => AmqpValue::Short(reader.read_i16()?),
            codes::SMALL_INT => AmqpValue::Int(reader.read_i8()? as i32),
            codes::INT => AmqpValue::Int(reader.read_i32()?),
            codes::SMALL_LONG => AmqpValue::Long(reader.read_i8()? as i64),
            codes::LONG => AmqpValue::Long(reader.read_i64()?),
            codes::FLOAT => AmqpValue::Float(reader.read_f32()?),
            codes::DOUBLE => AmqpValue::Double(reader.read_f64()?),
            codes::TIMESTAMP => AmqpValue::Timestamp(reader.read_i64()?),
            codes::UUID => {
                let bytes = reader.read_bytes(16)?;
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(bytes);
                AmqpValue::Uuid(uuid)
            }
            codes::VBIN8 => {
                let len = reader.read_u8()? as usize;
                AmqpValue::Binary(Bytes::copy_from_slice(reader.read_bytes(len)?))
            }
            codes::VBIN32 => {
                let len = reader.read_u32()? as usize;
                AmqpValue::Binary(Bytes::copy_from_slice(reader.read_bytes(len)?))
            }
            codes::STR8 => {
                let len = reader.read_u8()? as usize;
                AmqpValue::String(decode_utf8(reader.read_bytes(len)?)?)
            }
            codes::STR32 => {
                let len = reader.read_u32()? as usize;
                AmqpValue::String(decode_utf8(reader.read_bytes(len)?)?)
            }
            codes::SYM8 => {
                let len = reader.read_u8()? as usize;
                AmqpValue::Symbol(decode_utf8(reader.read_bytes(len)?)?)
            }
            codes::SYM32 => {
                let len = reader.read_u32()? as usize;
                AmqpValue::Symbol(decode_utf8(reader.read_bytes(len)?)?)
            }
            codes::LIST0 => AmqpValue::List(Vec::new()),
            codes::LIST8 => {
                let _size = reader.read_u8()?;
                let count = reader.read_u8()? as usize;
                Self::decode_list(reader, count)?
            }
            codes::LIST32 => {
                let _size = reader.read_u32()?;
                let count = reader.read_u32()? as usize;
                Self::decode_list(reader, count)?
            }
            codes::MAP8 => {
                let _size = reader.read_u8()?;
                let count = reader.read_u8()? as usize;
                Self::decode_map(reader, count)?
            }
            codes::MAP32 => {
                let _size = reader.read_u32()?;
                let count = reader.read_u32()? as usize;
                Self::decode_map(reader, count)?
            }
            other => {
                return Err(StreamError::Codec(format!(
                    "unsupported format code 0x{other:02x}"
                )))
            }
        };
        Ok(value)
    }

    fn decode_list(reader: &mut ByteReader<'_>, count: usize) -> Result<Self> {
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(AmqpValue::decode(reader)?);
        }
        Ok(AmqpValue::List(items))
    }

    fn decode_map(reader: &mut ByteReader<'_>, count: usize) -> Result<Self> {
        if count % 2 != 0 {
            return Err(StreamError::Codec(format!(
                "map element count {count} is odd"
            )));
        }
        let pairs = count / 2;
        let mut map = Vec::with_capacity(pairs.min(64));
        for _ in 0..pairs {
            let key = AmqpValue::decode(reader)?;
            let value = AmqpValue::decode(reader)?;
            map.push((key, value));
        }
        Ok(AmqpValue::Map(map))
    }
}

/// Encoded size of a non-empty list as [`encode_list`] produces it.
pub(crate) fn list_encoded_size(items: &[AmqpValue]) -> usize {
    if items.is_empty() {
        return 1; // list0
    }
    let elements: usize = items.iter().map(|v| v.encoded_size()).sum();
    compound_size(elements, items.len())
}

/// Append a list value, returning the number of bytes written.
pub(crate) fn encode_list(buf: &mut BytesMut, items: &[AmqpValue]) -> usize {
    let start = buf.len();
    if items.is_empty() {
        buf.put_u8(codes::LIST0);
    } else {
        let elements: usize = items.iter().map(|v| v.encoded_size()).sum();
        encode_compound_prefix(buf, codes::LIST8, codes::LIST32, elements, items.len());
        for item in items {
            item.encode(buf);
        }
    }
    buf.len() - start
}

/// Encoded size of a map as [`encode_map`] produces it.
pub(crate) fn map_encoded_size(pairs: &[(AmqpValue, AmqpValue)]) -> usize {
    let elements: usize = pairs
        .iter()
        .map(|(k, v)| k.encoded_size() + v.encoded_size())
        .sum();
    compound_size(elements, pairs.len() * 2)
}

/// Append a map value, returning the number of bytes written.
pub(crate) fn encode_map(buf: &mut BytesMut, pairs: &[(AmqpValue, AmqpValue)]) -> usize {
    let start = buf.len();
    let elements: usize = pairs
        .iter()
        .map(|(k, v)| k.encoded_size() + v.encoded_size())
        .sum();
    encode_compound_prefix(buf, codes::MAP8, codes::MAP32, elements, pairs.len() * 2);
    for (k, v) in pairs {
        k.encode(buf);
        v.encode(buf);
    }
    buf.len() - start
}

/// Encoded size of a variable-width value (binary/string/symbol).
#[inline]
pub(crate) fn variable_size(len: usize) -> usize {
    if len <= 255 {
        2 + len
    } else {
        5 + len
    }
}

fn encode_variable(buf: &mut BytesMut, small_code: u8, large_code: u8, data: &[u8]) {
    if data.len() <= 255 {
        buf.put_u8(small_code);
        buf.put_u8(data.len() as u8);
    } else {
        buf.put_u8(large_code);
        buf.put_u32(data.len() as u32);
    }
    buf.put_slice(data);
}

/// Encoded size of a non-empty list/map: format code + size field + count
/// field + elements. The size field covers the count field plus elements.
#[inline]
pub(crate) fn compound_size(elements: usize, count: usize) -> usize {
    if elements + 1 <= 255 && count <= 255 {
        3 + elements
    } else {
        9 + elements
    }
}

fn encode_compound_prefix(
    buf: &mut BytesMut,
    small_code: u8,
    large_code: u8,
    elements: usize,
    count: usize,
) {
    if elements + 1 <= 255 && count <= 255 {
        buf.put_u8(small_code);
        buf.put_u8((elements + 1) as u8);
        buf.put_u8(count as u8);
    } else {
        buf.put_u8(large_code);
        buf.put_u32((elements + 4) as u32);
        buf.put_u32(count as u32);
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| StreamError::Codec("invalid utf-8 in string value".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: AmqpValue) {
        let mut buf = BytesMut::new();
        let written = value.encode(&mut buf);
        assert_eq!(written, value.encoded_size(), "size mismatch for {value:?}");
        assert_eq!(written, buf.len());

        let mut reader = ByteReader::new(&buf);
        let decoded = AmqpValue::decode(&mut reader).unwrap();
        assert_eq!(decoded, value);
        assert!(reader.is_empty(), "trailing bytes after {value:?}");
    }

    #[test]
    fn test_scalar_roundtrips() {
        roundtrip(AmqpValue::Null);
        roundtrip(AmqpValue::Bool(true));
        roundtrip(AmqpValue::Bool(false));
        roundtrip(AmqpValue::Ubyte(200));
        roundtrip(AmqpValue::Ushort(40_000));
        roundtrip(AmqpValue::Byte(-100));
        roundtrip(AmqpValue::Short(-30_000));
        roundtrip(AmqpValue::Float(3.25));
        roundtrip(AmqpValue::Double(-1.0e100));
        roundtrip(AmqpValue::Timestamp(1_700_000_000_000));
        roundtrip(AmqpValue::Uuid([7u8; 16]));
    }

    #[test]
    fn test_uint_width_selection() {
        assert_eq!(AmqpValue::Uint(0).encoded_size(), 1);
        assert_eq!(AmqpValue::Uint(255).encoded_size(), 2);
        assert_eq!(AmqpValue::Uint(256).encoded_size(), 5);
        roundtrip(AmqpValue::Uint(0));
        roundtrip(AmqpValue::Uint(255));
        roundtrip(AmqpValue::Uint(u32::MAX));
    }

    #[test]
    fn test_ulong_width_selection() {
        assert_eq!(AmqpValue::Ulong(0).encoded_size(), 1);
        assert_eq!(AmqpValue::Ulong(1).encoded_size(), 2);
        assert_eq!(AmqpValue::Ulong(1000).encoded_size(), 9);
        roundtrip(AmqpValue::Ulong(0));
        roundtrip(AmqpValue::Ulong(200));
        roundtrip(AmqpValue::Ulong(u64::MAX));
    }

    #[test]
    fn test_int_long_small_encodings() {
        assert_eq!(AmqpValue::Int(-128).encoded_size(), 2);
        assert_eq!(AmqpValue::Int(128).encoded_size(), 5);
        assert_eq!(AmqpValue::Long(127).encoded_size(), 2);
        assert_eq!(AmqpValue::Long(-129).encoded_size(), 9);
        roundtrip(AmqpValue::Int(-128));
        roundtrip(AmqpValue::Int(i32::MIN));
        roundtrip(AmqpValue::Long(-1));
        roundtrip(AmqpValue::Long(i64::MAX));
    }

    #[test]
    fn test_binary_small_and_large() {
        roundtrip(AmqpValue::Binary(Bytes::from_static(b"payload")));
        roundtrip(AmqpValue::Binary(Bytes::from(vec![0xAB; 300])));
        assert_eq!(
            AmqpValue::Binary(Bytes::from(vec![0; 255])).encoded_size(),
            257
        );
        assert_eq!(
            AmqpValue::Binary(Bytes::from(vec![0; 256])).encoded_size(),
            261
        );
    }

    #[test]
    fn test_string_and_symbol() {
        roundtrip(AmqpValue::String("hello".to_string()));
        roundtrip(AmqpValue::String("x".repeat(500)));
        roundtrip(AmqpValue::Symbol("application/json".to_string()));
        // Symbols and strings are distinct wire types
        let mut buf = BytesMut::new();
        AmqpValue::Symbol("a".to_string()).encode(&mut buf);
        assert_eq!(buf[0], codes::SYM8);
    }

    #[test]
    fn test_empty_list_is_list0() {
        let v = AmqpValue::List(Vec::new());
        assert_eq!(v.encoded_size(), 1);
        let mut buf = BytesMut::new();
        v.encode(&mut buf);
        assert_eq!(&buf[..], &[codes::LIST0]);
        roundtrip(v);
    }

    #[test]
    fn test_list_roundtrip() {
        roundtrip(AmqpValue::List(vec![
            AmqpValue::Null,
            AmqpValue::Uint(42),
            AmqpValue::String("item".to_string()),
        ]));
    }

    #[test]
    fn test_large_list_uses_list32() {
        let items: Vec<AmqpValue> = (0..300).map(AmqpValue::Uint).collect();
        let v = AmqpValue::List(items);
        let mut buf = BytesMut::new();
        v.encode(&mut buf);
        assert_eq!(buf[0], codes::LIST32);
        roundtrip(v);
    }

    #[test]
    fn test_map_roundtrip() {
        roundtrip(AmqpValue::Map(vec![
            (
                AmqpValue::String("key".to_string()),
                AmqpValue::Long(12345),
            ),
            (
                AmqpValue::Symbol("x-route".to_string()),
                AmqpValue::String("orders".to_string()),
            ),
        ]));
    }

    #[test]
    fn test_empty_map() {
        let v = AmqpValue::Map(Vec::new());
        assert_eq!(v.encoded_size(), 3);
        roundtrip(v);
    }

    #[test]
    fn test_nested_compound() {
        roundtrip(AmqpValue::Map(vec![(
            AmqpValue::Symbol("meta".to_string()),
            AmqpValue::List(vec![AmqpValue::Bool(true), AmqpValue::Uint(9)]),
        )]));
    }

    #[test]
    fn test_odd_map_count_rejected() {
        // map8 with count = 1 (one key, no value)
        let data = [codes::MAP8, 0x02, 0x01, codes::NULL];
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            AmqpValue::decode(&mut reader),
            Err(StreamError::Codec(_))
        ));
    }

    #[test]
    fn test_unknown_format_code_rejected() {
        let data = [0xEE];
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            AmqpValue::decode(&mut reader),
            Err(StreamError::Codec(_))
        ));
    }

    #[test]
    fn test_truncated_value_is_eof() {
        let data = [codes::UINT, 0x00, 0x01]; // needs 4 payload bytes
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            AmqpValue::decode(&mut reader),
            Err(StreamError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_boolean_wide_form_decodes() {
        let data = [codes::BOOLEAN, 0x01];
        let mut reader = ByteReader::new(&data);
        assert_eq!(
            AmqpValue::decode(&mut reader).unwrap(),
            AmqpValue::Bool(true)
        );
    }
}
