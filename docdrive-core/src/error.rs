//! Error types for driver operations.

use std::io;
use thiserror::Error;

/// The main error type for driver operations.
///
/// Each variant is a distinct failure kind so that callers can tell a local
/// input problem from a topology problem from a failed round-trip.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A value or key could not be represented on the wire. Not retryable.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Bytes received from the wire could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The read preference found no node that qualifies for the operation.
    #[error("no eligible node: {0}")]
    NoEligibleNode(String),

    /// The transport to the selected node failed.
    #[error("network error: {0}")]
    Network(String),

    /// The node answered with a failure or an unexpected message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The operation did not complete within its deadline.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// Configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Returns `true` if repeating the operation may succeed without the
    /// caller changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoEligibleNode(_) | Self::Network(_) | Self::Timeout(_) | Self::Io(_)
        )
    }
}

/// A specialized `Result` type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_error_display() {
        let err = DriverError::Encoding("key contains a NUL byte".to_string());
        assert_eq!(err.to_string(), "encoding error: key contains a NUL byte");
    }

    #[test]
    fn test_no_eligible_node_display() {
        let err = DriverError::NoEligibleNode("no primary available".to_string());
        assert_eq!(err.to_string(), "no eligible node: no primary available");
    }

    #[test]
    fn test_network_error_display() {
        let err = DriverError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "network error: connection reset");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = DriverError::Protocol("unexpected op code 7".to_string());
        assert_eq!(err.to_string(), "protocol error: unexpected op code 7");
    }

    #[test]
    fn test_timeout_error_display() {
        let err = DriverError::Timeout("read timed out after 5s".to_string());
        assert_eq!(err.to_string(), "timeout error: read timed out after 5s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err: DriverError = io_err.into();
        assert!(matches!(err, DriverError::Io(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(DriverError::NoEligibleNode(String::new()).is_retryable());
        assert!(DriverError::Network(String::new()).is_retryable());
        assert!(DriverError::Timeout(String::new()).is_retryable());
        assert!(DriverError::from(io::Error::from(io::ErrorKind::BrokenPipe)).is_retryable());

        assert!(!DriverError::Encoding(String::new()).is_retryable());
        assert!(!DriverError::Serialization(String::new()).is_retryable());
        assert!(!DriverError::Protocol(String::new()).is_retryable());
        assert!(!DriverError::Configuration(String::new()).is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DriverError>();
    }
}
