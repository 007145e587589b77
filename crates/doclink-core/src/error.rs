//! Error types for DocLink

use thiserror::Error;

/// Core error type for DocLink operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocLinkError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("Connection failed after {attempts} attempt(s): {message}")]
    ConnectionFailed { attempts: u32, message: String },

    /// The driver reported that its client connection was dropped.
    ///
    /// This is the only error class the operation guard reconnects on.
    #[error("Client disconnected: {0}")]
    Disconnected(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cancelled")]
    Cancelled,
}

impl DocLinkError {
    /// Whether this error carries the driver's disconnect signature.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, DocLinkError::Disconnected(_))
    }

    /// Whether this error came out of an exhausted connect loop.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, DocLinkError::ConnectionFailed { .. })
    }

    /// Whether retrying the same connect request can never succeed.
    pub fn is_fatal_for_connect(&self) -> bool {
        matches!(
            self,
            DocLinkError::InvalidConfiguration(_) | DocLinkError::Cancelled
        )
    }
}

impl From<bson::ser::Error> for DocLinkError {
    fn from(err: bson::ser::Error) -> Self {
        DocLinkError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for DocLinkError {
    fn from(err: bson::de::Error) -> Self {
        DocLinkError::Serialization(err.to_string())
    }
}

/// Result type alias for DocLink operations
pub type Result<T> = std::result::Result<T, DocLinkError>;
