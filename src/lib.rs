//! Client-side engine for a stream-message protocol with an AMQP 1.0
//! message format.
//!
//! Two halves:
//!
//! - **Message codec** ([`message`], [`codec`]): builds and parses the bare
//!   message body carried inside publish and deliver frames. Encoded sizes
//!   are exact, so frame headers can be written before payloads.
//! - **Confirmation pipeline** ([`confirm`]): tracks every in-flight
//!   publishing identifier and delivers exactly one terminal outcome per
//!   publish through a single-concurrency callback, with timeout sweeping
//!   and bounded-queue backpressure.
//!
//! # Example
//!
//! ```
//! use streamwire_client::{AmqpValue, ApplicationProperties, Message, Properties};
//! use bytes::BytesMut;
//!
//! let mut message = Message::new(&b"order created"[..]);
//!
//! let mut properties = Properties::new();
//! properties.message_id = Some(AmqpValue::Ulong(42));
//! message.properties = Some(properties);
//!
//! let mut app = ApplicationProperties::new();
//! app.insert("region", AmqpValue::String("eu-west".to_string()));
//! message.application_properties = Some(app);
//!
//! let mut buf = BytesMut::new();
//! let written = message.write(&mut buf);
//! assert_eq!(written, message.size());
//!
//! let decoded = Message::decode(&buf, buf.len() as u32).unwrap();
//! assert_eq!(decoded.data(), b"order created");
//! ```

pub mod codec;
pub mod confirm;
pub mod error;
pub mod message;

pub use codec::AmqpValue;
pub use confirm::{ConfirmationPipe, ConfirmationStatus, MessagesConfirmation, PipeConfig};
pub use error::{Result, StreamError};
pub use message::{Annotations, ApplicationProperties, BufferPool, Message, Properties};
