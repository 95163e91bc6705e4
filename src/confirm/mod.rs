//! Publish confirmation tracking.
//!
//! [`ConfirmationPipe`] owns the full lifecycle of an in-flight publish:
//! registration under a producer-chosen publishing identifier, resolution
//! from the broker reply path or the timeout sweeper, and exactly-once
//! delivery of a [`MessagesConfirmation`] to the user callback.

mod pipe;
mod status;

pub use pipe::{
    ConfirmationPipe, MessagesConfirmation, PipeConfig, DEFAULT_MAX_IN_FLIGHT,
    DEFAULT_MESSAGE_TIMEOUT,
};
pub use status::ConfirmationStatus;
