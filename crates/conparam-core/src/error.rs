//! Error types for the parameter sync client
//!
//! Network-level failures inside the client are logged and swallowed. The
//! variants here surface from construction, configuration and programming
//! errors (reserved names, values that cannot be serialized).

use thiserror::Error;

/// Result type alias for parameter sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the parameter sync client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload was not valid UTF-8 text
    #[error("Invalid UTF-8 payload: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A transport operation did not complete in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A name reserved by the wire protocol was used as a parameter
    #[error("Reserved parameter name: {0}")]
    ReservedName(String),

    /// Encoded payload does not fit into a single datagram
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Encoded size in bytes
        size: usize,
        /// Configured datagram bound
        max: usize,
    },

    /// A parameter did not appear before the caller's deadline
    #[error("Parameter '{0}' never arrived")]
    ParameterUnavailable(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a reserved-name error
    pub fn reserved_name(name: impl Into<String>) -> Self {
        Self::ReservedName(name.into())
    }

    /// Create a "parameter never arrived" error
    pub fn parameter_unavailable(name: impl Into<String>) -> Self {
        Self::ParameterUnavailable(name.into())
    }

    /// Whether this error is a timeout-class transport failure
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Network(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(Error::timeout("send").is_timeout());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(Error::from(io).is_timeout());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
        assert!(!Error::from(io).is_timeout());
        assert!(!Error::reserved_name("__namespace__").is_timeout());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::PayloadTooLarge { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "Payload too large: 2048 bytes (max 1024)");

        let err = Error::parameter_unavailable("gain");
        assert_eq!(err.to_string(), "Parameter 'gain' never arrived");
    }
}
