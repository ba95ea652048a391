//! Session subsystem errors.

/// Errors raised while minting session credentials.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The minter is misconfigured (empty signing secret). Startup-fatal.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Signing a token failed.
    #[error("Failed to encode session token: {message}")]
    Encoding {
        /// Description of the encoding failure.
        message: String,
    },
}

impl SessionError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}
