//! Identity provider error types.
//!
//! Every bridge operation reports failures through [`IdpError`]. Absence of a
//! user is deliberately *not* an error: lookups that may miss return
//! `Option`, so callers branch on presence instead of catching a not-found
//! failure.

/// Errors that can occur while talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    /// The supplied credentials were rejected.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has not completed confirmation.
    #[error("User not confirmed")]
    UserNotConfirmed,

    /// The named user does not exist in the pool. Presence probes convert
    /// this into `None` before it reaches a caller.
    #[error("User not found")]
    UserNotFound,

    /// An account with the same identifier already exists.
    #[error("Duplicate account: {message}")]
    DuplicateAccount {
        /// Description from the provider.
        message: String,
    },

    /// A refresh token or authorization code was invalid, expired, or
    /// revoked. Callers must treat this as a forced re-login.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description from the provider.
        message: String,
    },

    /// The client id/secret pair was rejected by the token endpoint.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description from the provider.
        message: String,
    },

    /// A submitted value (password policy, confirmation code, phone format)
    /// was rejected by the provider.
    #[error("Rejected parameter: {message}")]
    InvalidParameter {
        /// Description from the provider.
        message: String,
    },

    /// The bridge is misconfigured. Raised during startup validation, never
    /// per request.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The provider returned an unexpected failure or was unreachable.
    #[error("Identity provider error: {message}")]
    Upstream {
        /// Description of the upstream failure.
        message: String,
    },
}

impl IdpError {
    /// Creates a new `DuplicateAccount` error.
    #[must_use]
    pub fn duplicate_account(message: impl Into<String>) -> Self {
        Self::DuplicateAccount {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Upstream` error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Whether this failure must invalidate the caller's session state.
    #[must_use]
    pub fn forces_relogin(&self) -> bool {
        matches!(self, Self::InvalidGrant { .. } | Self::InvalidClient { .. })
    }
}

impl From<reqwest::Error> for IdpError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream {
            message: err.to_string(),
        }
    }
}

/// Result type for identity provider operations.
pub type IdpResult<T> = Result<T, IdpError>;
