//! Password signin against the customer pool.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use idgate_idp::PoolKind;

use crate::error::ApiError;
use crate::handlers::{UserView, with_cookies};
use crate::pipeline::establish_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /auth/signin`
///
/// Every credential failure — wrong password, unknown account — maps to the
/// same 401 so the response never reveals which factor failed. No cookies
/// are set on failure.
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (&request.email, &request.password) else {
        return Err(ApiError::validation("Email and password are required"));
    };

    let pool = state.registry.require(PoolKind::Customer)?;
    let tokens = state
        .provider
        .authenticate_password(pool, email, password)
        .await?;
    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .ok_or_else(ApiError::authentication)?;

    let attributes = state
        .provider
        .fetch_attributes(pool, email)
        .await?
        .ok_or_else(ApiError::authentication)?;

    let session =
        establish_session(&state, PoolKind::Customer, &attributes, None, refresh_token).await?;

    let body = json!({
        "message": "Login successful",
        "isLoggedIn": true,
        "user": UserView::from(&session.principal),
    });
    let jar = with_cookies(jar, session.cookies);
    Ok((jar, Json(body)).into_response())
}
