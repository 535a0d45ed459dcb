//! Error types for the CRPT client.

use thiserror::Error;

/// Why a waiting acquire was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller-supplied cancellation signal resolved first.
    Signal,
    /// The limiter was closed while the caller was waiting.
    LimiterClosed,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Signal => write!(f, "cancellation signal received"),
            CancelReason::LimiterClosed => write!(f, "rate limiter closed"),
        }
    }
}

/// Main error type for CRPT client operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A wait for a rate limit slot was abandoned
    #[error("Operation cancelled: {0}")]
    Cancelled(CancelReason),

    /// Network or transport failure while talking to the registry
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry answered with a non-success status
    #[error("Registry returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Document serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrptError {
    /// Returns `true` if this error is a cancelled wait.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CrptError::Cancelled(_))
    }
}

/// Result type alias for CRPT client operations.
pub type Result<T> = std::result::Result<T, CrptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_keeps_reason() {
        let err = CrptError::Cancelled(CancelReason::LimiterClosed);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Operation cancelled: rate limiter closed");
    }

    #[test]
    fn test_status_error_message() {
        let err = CrptError::Status {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert!(!err.is_cancelled());
        assert_eq!(err.to_string(), "Registry returned status 403: forbidden");
    }
}
