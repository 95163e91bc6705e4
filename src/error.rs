//! Error types for streamwire-client.

use thiserror::Error;

/// Main error type for all streamwire operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Unknown described-section descriptor encountered during message decode.
    ///
    /// Fatal for that decode call - there is no partial-message recovery.
    #[error("malformed protocol section: unknown descriptor 0x{0:02x}")]
    MalformedSection(u64),

    /// Buffer ended before a complete value could be read.
    #[error("unexpected end of buffer while decoding")]
    UnexpectedEof,

    /// A value decoded fine but does not fit where the grammar expects it
    /// (e.g. a map key that is not a string, a non-list properties body).
    #[error("codec error: {0}")]
    Codec(String),
}

/// Result type alias using StreamError.
pub type Result<T> = std::result::Result<T, StreamError>;
