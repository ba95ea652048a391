//! Seller registration against the seller pool.

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

/// Group sellers join when the pool does not configure its own.
const DEFAULT_SELLER_GROUP: &str = "sellers";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSellerRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
}

/// `POST /auth/register-seller`
///
/// Same shape as customer signup, but in the seller pool: create, confirm,
/// join the sellers group, authenticate, and establish a session.
pub async fn register_seller(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterSellerRequest>,
) -> Result<Response, ApiError> {
    let (Some(first_name), Some(last_name), Some(email), Some(phone), Some(password)) = (
        &request.first_name,
        &request.last_name,
        &request.email,
        &request.phone,
        &request.password,
    ) else {
        return Err(ApiError::validation(
            "firstName, lastName, email, phone and password are required",
        ));
    };

    let pool = state.registry.require(PoolKind::Seller)?;

    let mut pairs = vec![
        (keys::EMAIL.to_string(), email.clone()),
        (keys::GIVEN_NAME.to_string(), first_name.clone()),
        (keys::FAMILY_NAME.to_string(), last_name.clone()),
        (keys::PHONE.to_string(), format_phone_e164(phone)),
        (keys::ROLE.to_string(), "seller".to_string()),
    ];
    if let Some(business_name) = &request.business_name {
        pairs.push((keys::BUSINESS_NAME.to_string(), business_name.clone()));
    }
    let seed = UserAttributes::from_pairs(pairs);

    let subject = state.provider.sign_up(pool, email, password, &seed).await?;
    state.provider.force_confirm(pool, email).await?;

    let group = pool.group.as_deref().unwrap_or(DEFAULT_SELLER_GROUP);
    state.provider.add_to_group(pool, email, group).await?;

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

    tracing::info!(%subject, "seller account registered");

    let session =
        establish_session(&state, PoolKind::Seller, &attributes, None, refresh_token).await?;

    let body = json!({
        "message": "Seller account created and logged in",
        "user": UserView::from(&session.principal),
        "isLoggedIn": true,
    });
    let jar = with_cookies(jar, session.cookies);
    Ok((StatusCode::CREATED, jar, Json(body)).into_response())
}
