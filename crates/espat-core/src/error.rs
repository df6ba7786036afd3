//! Error types for the AT command engine.
//!
//! Timeouts are not errors here: every engine call reports a deadline expiry
//! as a regular outcome value. The variants below cover misconfiguration,
//! buffer misuse, malformed device replies and transport failures.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AtError>;

/// Errors that can occur while driving the AT command engine.
#[derive(Debug, thiserror::Error)]
pub enum AtError {
    /// Ring buffer capacity is not a power of two (or is too small).
    #[error("Invalid ring buffer capacity {capacity}: must be a power of two >= 2")]
    InvalidCapacity { capacity: usize },

    /// Some other configuration value is out of range.
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// Formatted command line exceeds the configured limit.
    #[error("Command too long: {len} bytes exceeds limit of {limit}")]
    CommandTooLong { len: usize, limit: usize },

    /// Write attempted on a full ring buffer.
    #[error("Ring buffer full ({capacity} slots)")]
    BufferFull { capacity: usize },

    /// Read attempted on an empty ring buffer.
    #[error("Ring buffer empty")]
    BufferEmpty,

    /// Bulk operation asked for more bytes than are stored (or free).
    #[error("Insufficient data: requested {requested}, available {available}")]
    InsufficientData { requested: usize, available: usize },

    /// Inbound data header could not be parsed.
    #[error("Malformed inbound header: {message}")]
    MalformedHeader { message: String },

    /// Device answered with something other than what the caller required.
    #[error("Unexpected response: expected {expected}, got {found}")]
    UnexpectedResponse { expected: String, found: String },

    /// Transport-specific failure that is not an `io::Error`.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Generic I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AtError {
    /// Create a new invalid capacity error.
    pub fn invalid_capacity(capacity: usize) -> Self {
        Self::InvalidCapacity { capacity }
    }

    /// Create a new configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a new insufficient data error.
    pub fn insufficient(requested: usize, available: usize) -> Self {
        Self::InsufficientData {
            requested,
            available,
        }
    }

    /// Create a new malformed header error.
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Create a new unexpected response error.
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True for errors caused by setup rather than by the device.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidCapacity { .. } | Self::InvalidConfig { .. } | Self::CommandTooLong { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_capacity_error() {
        let error = AtError::invalid_capacity(500);
        assert!(matches!(error, AtError::InvalidCapacity { capacity: 500 }));
        assert_eq!(
            error.to_string(),
            "Invalid ring buffer capacity 500: must be a power of two >= 2"
        );
        assert!(error.is_config());
    }

    #[test]
    fn test_malformed_header_error() {
        let error = AtError::malformed_header("port is not a number");
        assert_eq!(
            error.to_string(),
            "Malformed inbound header: port is not a number"
        );
        assert!(!error.is_config());
    }

    #[test]
    fn test_unexpected_response_error() {
        let error = AtError::unexpected("OK", "ERROR");
        assert_eq!(error.to_string(), "Unexpected response: expected OK, got ERROR");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let error: AtError = io.into();
        assert!(matches!(error, AtError::Io(_)));
    }
}
