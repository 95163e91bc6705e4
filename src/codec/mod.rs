//! Codec module - the AMQP 1.0 type system the section codecs build on.
//!
//! This module provides:
//!
//! - [`formats`] - format codes and section descriptor constants
//! - [`ByteReader`] - bounds-checked Big Endian reader
//! - [`AmqpValue`] - dynamic value with exact-size encode/decode

pub mod formats;
mod reader;
mod value;

pub use reader::ByteReader;
pub use value::AmqpValue;

pub(crate) use value::{
    compound_size, encode_list, encode_map, list_encoded_size, map_encoded_size, variable_size,
};
