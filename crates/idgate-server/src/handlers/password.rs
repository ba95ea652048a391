//! Password reset and signup-code verification.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use idgate_idp::{IdpError, PoolKind};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /auth/reset-password`
///
/// Always acknowledges with the same 200 body whether or not the account
/// exists — a distinguishable response would let callers enumerate
/// registered emails. Only transport-level failures surface.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let Some(email) = &request.email else {
        return Err(ApiError::validation("Email is required"));
    };

    let pool = state.registry.require(PoolKind::Customer)?;
    match state.provider.initiate_password_reset(pool, email).await {
        Ok(()) => {}
        Err(IdpError::UserNotFound) => {
            tracing::debug!("password reset requested for unknown email");
        }
        Err(err) => return Err(err.into()),
    }

    let body = json!({
        "message": "If the account exists, a reset code has been sent to its email.",
    });
    Ok(Json(body).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResetRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// `POST /auth/confirm-reset`
///
/// Verifies the emailed code and sets the new password in one step; the
/// provider has no code-only check. Wrong and expired codes are 400, and an
/// unknown email is indistinguishable from a wrong code.
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(request): Json<ConfirmResetRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(code), Some(new_password)) =
        (&request.email, &request.code, &request.new_password)
    else {
        return Err(ApiError::validation(
            "Email, code, and newPassword are required",
        ));
    };

    state
        .provider
        .confirm_password_reset(state.registry.require(PoolKind::Customer)?, email, code, new_password)
        .await
        .map_err(|err| match err {
            IdpError::InvalidGrant { .. } | IdpError::UserNotFound => {
                ApiError::validation("Invalid or expired code")
            }
            other => other.into(),
        })?;

    Ok(Json(json!({ "message": "Password has been reset successfully" })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// `POST /auth/verify-code`
///
/// Confirms a signup with the emailed verification code. Any provider
/// rejection surfaces as an upstream failure.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(code)) = (&request.email, &request.code) else {
        return Err(ApiError::validation("Email and code are required"));
    };

    state
        .provider
        .confirm_sign_up(state.registry.require(PoolKind::Customer)?, email, code)
        .await
        .map_err(|err| ApiError::upstream(format!("Failed to verify code: {err}")))?;

    Ok(Json(json!({ "message": "Email verified successfully" })).into_response())
}
