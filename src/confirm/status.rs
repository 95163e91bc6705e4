//! Terminal outcomes for a publish identifier.

/// Outcome of one publish, delivered through the confirmation callback.
///
/// Every outcome - success or failure - arrives through the same channel;
/// application code branches on this status rather than on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmationStatus {
    /// Non-terminal: registered, no broker reply yet.
    WaitForConfirmation,
    /// Broker acknowledged the publish.
    Confirmed,
    /// No broker reply arrived within the configured message timeout.
    ClientTimeoutError,
    /// The target stream is not available.
    StreamNotAvailable,
    /// Broker-side internal error.
    InternalError,
    /// The broker refused access to the stream.
    AccessRefused,
    /// A broker precondition failed.
    PreconditionFailed,
    /// The publisher is unknown to the broker.
    PublisherDoesNotExist,
    /// Any error code this client does not recognize.
    UndefinedError,
}

impl ConfirmationStatus {
    /// True for every status except [`WaitForConfirmation`](Self::WaitForConfirmation).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationStatus::WaitForConfirmation)
    }

    /// True only for [`Confirmed`](Self::Confirmed).
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ConfirmationStatus::Confirmed)
    }

    /// Map a broker response code from a publish-error frame.
    pub fn from_response_code(code: u16) -> Self {
        match code {
            0x01 => ConfirmationStatus::Confirmed,
            0x06 => ConfirmationStatus::StreamNotAvailable,
            0x0F => ConfirmationStatus::InternalError,
            0x10 => ConfirmationStatus::AccessRefused,
            0x11 => ConfirmationStatus::PreconditionFailed,
            0x12 => ConfirmationStatus::PublisherDoesNotExist,
            _ => ConfirmationStatus::UndefinedError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminality() {
        assert!(!ConfirmationStatus::WaitForConfirmation.is_terminal());
        assert!(ConfirmationStatus::Confirmed.is_terminal());
        assert!(ConfirmationStatus::ClientTimeoutError.is_terminal());
        assert!(ConfirmationStatus::UndefinedError.is_terminal());
    }

    #[test]
    fn test_is_confirmed() {
        assert!(ConfirmationStatus::Confirmed.is_confirmed());
        assert!(!ConfirmationStatus::AccessRefused.is_confirmed());
    }

    #[test]
    fn test_response_code_mapping() {
        assert_eq!(
            ConfirmationStatus::from_response_code(0x01),
            ConfirmationStatus::Confirmed
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x06),
            ConfirmationStatus::StreamNotAvailable
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x0F),
            ConfirmationStatus::InternalError
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x10),
            ConfirmationStatus::AccessRefused
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x11),
            ConfirmationStatus::PreconditionFailed
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x12),
            ConfirmationStatus::PublisherDoesNotExist
        );
        assert_eq!(
            ConfirmationStatus::from_response_code(0x99),
            ConfirmationStatus::UndefinedError
        );
    }
}
