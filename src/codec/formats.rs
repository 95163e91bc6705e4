//! AMQP 1.0 format codes and section descriptors.
//!
//! Every encoded value starts with a one-byte format code identifying its
//! type and width. Described types (all message sections) start with the
//! `0x00` constructor followed by a ulong descriptor.

/// Constructor byte introducing a described type.
pub const DESCRIBED: u8 = 0x00;

/// Format codes for AMQP primitive types.
///
/// Multi-width types have one code per width; the encoder always picks the
/// smallest legal width, the decoder accepts all of them.
pub mod codes {
    pub const NULL: u8 = 0x40;
    pub const BOOLEAN_TRUE: u8 = 0x41;
    pub const BOOLEAN_FALSE: u8 = 0x42;
    pub const BOOLEAN: u8 = 0x56;
    pub const UINT0: u8 = 0x43;
    pub const ULONG0: u8 = 0x44;
    pub const LIST0: u8 = 0x45;
    pub const UBYTE: u8 = 0x50;
    pub const BYTE: u8 = 0x51;
    pub const SMALL_UINT: u8 = 0x52;
    pub const SMALL_ULONG: u8 = 0x53;
    pub const SMALL_INT: u8 = 0x54;
    pub const SMALL_LONG: u8 = 0x55;
    pub const USHORT: u8 = 0x60;
    pub const SHORT: u8 = 0x61;
    pub const UINT: u8 = 0x70;
    pub const INT: u8 = 0x71;
    pub const FLOAT: u8 = 0x72;
    pub const ULONG: u8 = 0x80;
    pub const LONG: u8 = 0x81;
    pub const DOUBLE: u8 = 0x82;
    pub const TIMESTAMP: u8 = 0x83;
    pub const UUID: u8 = 0x98;
    pub const VBIN8: u8 = 0xA0;
    pub const STR8: u8 = 0xA1;
    pub const SYM8: u8 = 0xA3;
    pub const VBIN32: u8 = 0xB0;
    pub const STR32: u8 = 0xB1;
    pub const SYM32: u8 = 0xB3;
    pub const LIST8: u8 = 0xC0;
    pub const MAP8: u8 = 0xC1;
    pub const LIST32: u8 = 0xD0;
    pub const MAP32: u8 = 0xD1;
}

/// Descriptor codes for bare-message sections (amqp:*:list / map / binary).
pub mod sections {
    /// message-header section.
    pub const HEADER: u64 = 0x70;
    /// delivery-annotations section (unsupported, decode failure).
    pub const DELIVERY_ANNOTATIONS: u64 = 0x71;
    /// message-annotations section.
    pub const MESSAGE_ANNOTATIONS: u64 = 0x72;
    /// properties section.
    pub const PROPERTIES: u64 = 0x73;
    /// application-properties section.
    pub const APPLICATION_PROPERTIES: u64 = 0x74;
    /// data body section.
    pub const DATA: u64 = 0x75;
    /// amqp-sequence body section (unsupported, decode failure).
    pub const AMQP_SEQUENCE: u64 = 0x76;
    /// amqp-value body section.
    pub const AMQP_VALUE: u64 = 0x77;
    /// footer section (unsupported, decode failure).
    pub const FOOTER: u64 = 0x78;
}

/// Size in bytes of a described-section prefix as this crate writes it:
/// `0x00` constructor + smallulong descriptor (`0x53` + code byte).
pub const SECTION_PREFIX_SIZE: usize = 3;
