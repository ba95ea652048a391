//! Account existence probe.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use idgate_idp::PoolKind;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckUserRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /auth/check-user`
///
/// Presence probe of the customer pool, used by the signup frontend to
/// steer between signin and signup.
pub async fn check_user(
    State(state): State<AppState>,
    Json(request): Json<CheckUserRequest>,
) -> Result<Response, ApiError> {
    let Some(email) = &request.email else {
        return Err(ApiError::validation("Email is required"));
    };

    let pool = state.registry.require(PoolKind::Customer)?;
    let exists = state.provider.fetch_attributes(pool, email).await?.is_some();
    Ok(Json(json!({ "exists": exists })).into_response())
}
