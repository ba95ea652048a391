//! Password signup against the customer pool.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use idgate_idp::{PoolKind, UserAttributes, attributes::keys, format_phone_e164};

use crate::error::ApiError;
use crate::handlers::{UserView, with_cookies};
use crate::pipeline::establish_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub usage_type: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// `POST /auth/signup`
///
/// Creates the account, admin-confirms it, signs the user straight in and
/// establishes a session. A request without `usageType` is answered with
/// `202` so the frontend can ask whether the account is personal or team
/// use before committing attributes.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(password), Some(name)) =
        (&request.email, &request.password, &request.name)
    else {
        return Err(ApiError::validation("Name, email and password are required"));
    };

    let Some(usage_type) = &request.usage_type else {
        let body = json!({
            "message": "Please confirm if this account is for personal or team use.",
            "requireUsageType": true,
        });
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    };

    let is_team = usage_type == "team";
    let mut pairs = vec![
        (keys::EMAIL.to_string(), email.clone()),
        (keys::NAME.to_string(), name.clone()),
        (keys::GIVEN_NAME.to_string(), name.clone()),
        (keys::ACCOUNT_TYPE.to_string(), usage_type.clone()),
        (
            keys::TIMEZONE.to_string(),
            request.timezone.clone().unwrap_or_else(|| "UTC".into()),
        ),
        (
            keys::ROLE.to_string(),
            if is_team { "owner" } else { "individual" }.to_string(),
        ),
    ];
    if let Some(phone) = &request.phone {
        pairs.push((keys::PHONE.to_string(), format_phone_e164(phone)));
    }
    if is_team {
        pairs.push((keys::ORGANIZATION_ID.to_string(), "pending".to_string()));
    }
    let seed = UserAttributes::from_pairs(pairs);

    let pool = state.registry.require(PoolKind::Customer)?;
    let subject = state
        .provider
        .sign_up(pool, email, password, &seed)
        .await?;
    state.provider.force_confirm(pool, email).await?;

    let tokens = state
        .provider
        .authenticate_password(pool, email, password)
        .await?;
    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .ok_or_else(|| ApiError::upstream("Registration succeeded but sign-in was incomplete"))?;

    let attributes = state
        .provider
        .fetch_attributes(pool, email)
        .await?
        .ok_or_else(|| ApiError::upstream("Registered account is missing from the pool"))?;

    tracing::info!(%subject, "account registered");

    let session =
        establish_session(&state, PoolKind::Customer, &attributes, None, refresh_token).await?;

    let body = json!({
        "user": UserView::from(&session.principal),
        "isRegistered": true,
        "isLoggedIn": true,
    });
    let jar = with_cookies(jar, session.cookies);
    Ok((StatusCode::CREATED, jar, Json(body)).into_response())
}
