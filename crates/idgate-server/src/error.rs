//! HTTP error taxonomy.
//!
//! Every handler failure flows through [`ApiError`], which maps onto a
//! status code and a small JSON body. Authentication failures deliberately
//! carry one generic message: responses never reveal which factor failed or
//! whether an account exists.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use idgate_idp::IdpError;
use idgate_session::SessionError;
use idgate_store::StorageError;

/// The message used for every credential failure.
pub const GENERIC_AUTH_MESSAGE: &str = "Authentication failed";

/// Gateway-level request errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request payload is missing or malformed (400).
    #[error("{message}")]
    Validation {
        /// User-facing description.
        message: String,
    },

    /// Credentials or grants were rejected (401).
    #[error("{message}")]
    Authentication {
        /// User-facing description. Generic by design.
        message: String,
    },

    /// The request conflicts with existing state (409).
    #[error("{message}")]
    Conflict {
        /// User-facing description.
        message: String,
    },

    /// The referenced entity does not exist (404).
    #[error("{message}")]
    NotFound {
        /// User-facing description.
        message: String,
    },

    /// The IdP or the store failed unexpectedly (500).
    #[error("{message}")]
    Upstream {
        /// User-facing description.
        message: String,
    },
}

impl ApiError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates the generic `Authentication` error.
    #[must_use]
    pub fn authentication() -> Self {
        Self::Authentication {
            message: GENERIC_AUTH_MESSAGE.to_string(),
        }
    }

    /// Creates an `Authentication` error with a session-oriented message.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::Authentication {
            message: "Session invalid. Please sign in again.".to_string(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
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

    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            Self::Validation { message } => (StatusCode::BAD_REQUEST, "validation_error", message),
            Self::Authentication { message } => {
                (StatusCode::UNAUTHORIZED, "authentication_error", message)
            }
            Self::Conflict { message } => (StatusCode::CONFLICT, "conflict", message),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, "not_found", message),
            Self::Upstream { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error", message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(%code, message, "request failed");
        } else {
            tracing::debug!(%code, message, "request rejected");
        }
        let body = json!({ "error": code, "message": message });
        (status, Json(body)).into_response()
    }
}

impl From<IdpError> for ApiError {
    fn from(err: IdpError) -> Self {
        match err {
            IdpError::InvalidCredentials | IdpError::UserNotFound => Self::authentication(),
            IdpError::InvalidGrant { .. } | IdpError::InvalidClient { .. } => {
                Self::session_expired()
            }
            IdpError::UserNotConfirmed => {
                Self::validation("Account not confirmed. Please verify your email.")
            }
            IdpError::DuplicateAccount { .. } => Self::conflict("Email already registered."),
            IdpError::InvalidParameter { message } => Self::validation(message),
            IdpError::Configuration { message } => {
                // Should have been caught at startup; never echo details.
                tracing::error!(%message, "configuration error reached request path");
                Self::upstream("Server configuration error")
            }
            IdpError::Upstream { message } => Self::upstream(message),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::upstream(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        Self::upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_message() {
        let from_missing_user: ApiError = IdpError::UserNotFound.into();
        let from_bad_password: ApiError = IdpError::InvalidCredentials.into();
        assert_eq!(from_missing_user.to_string(), from_bad_password.to_string());
        assert_eq!(from_missing_user.to_string(), GENERIC_AUTH_MESSAGE);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::validation("x").parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::authentication().parts().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::conflict("x").parts().0, StatusCode::CONFLICT);
        assert_eq!(ApiError::not_found("x").parts().0, StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::upstream("x").parts().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_account_maps_to_conflict() {
        let err: ApiError = IdpError::duplicate_account("exists").into();
        assert!(matches!(err, ApiError::Conflict { .. }));
    }
}
