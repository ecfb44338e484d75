//! Error types for the driver runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the Playwright driver.
#[derive(Debug, Error)]
pub enum Error {
    /// Playwright driver was not found on this machine.
    #[error("Playwright driver not found. Install with: npm install playwright")]
    DriverNotFound,

    /// Failed to launch the driver process.
    #[error("Failed to launch Playwright driver: {0}. Check that Node.js is installed.")]
    LaunchFailed(String),

    /// Transport-level error (stdio framing).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed or unexpected message).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the driver with full context.
    #[error("{name}: {message}")]
    Remote {
        /// Error type name (e.g. "TimeoutError", "TargetClosedError")
        name: String,
        /// Human-readable error message
        message: String,
        /// JavaScript stack trace from the driver, if available
        stack: Option<String>,
    },

    /// Object not found in the connection registry.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Connection closed while a request was in flight.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Timeout waiting for the driver.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Browser installation step failed.
    #[error("Browser install failed: {0}")]
    InstallFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Remote { name, .. } => name == "TimeoutError",
            _ => false,
        }
    }
}
