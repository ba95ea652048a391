//! Social login: authorization-code processing and signup completion.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use idgate_idp::{
    PoolKind, ResolveOutcome, attributes::keys, format_phone_e164, resolve,
};

use crate::error::ApiError;
use crate::handlers::{UserView, with_cookies};
use crate::pipeline::establish_session;
use crate::state::AppState;

/// Provider tag used when the identity token carries no federation link.
const DEFAULT_PROVIDER: &str = "Google";

/// The pool whose hosted domain performs the social code exchange.
const SOCIAL_POOL: PoolKind = PoolKind::Customer;

#[derive(Debug, Deserialize)]
pub struct ProcessSocialLoginRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// `POST /auth/process-social-login`
///
/// Exchanges the authorization code once, verifies the identity token
/// against the issuing pool's published keys, then resolves which account
/// pool the federated subject belongs to. A subject unknown to every pool
/// gets a signup-choice prompt and **no cookies**; a resolved subject gets
/// a full session directly.
pub async fn process_social_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<ProcessSocialLoginRequest>,
) -> Result<Response, ApiError> {
    let Some(code) = &request.code else {
        return Err(ApiError::validation("Authorization code is required"));
    };

    let social_pool = state.registry.require(SOCIAL_POOL)?;
    let tokens = state
        .provider
        .exchange_authorization_code(social_pool, code, &state.social.redirect_url)
        .await?;
    let claims = state.verifier.verify(social_pool, &tokens.id_token).await?;
    let provider_tag = claims
        .provider_tag()
        .unwrap_or(DEFAULT_PROVIDER)
        .to_string();

    match resolve(&state.registry, state.provider.as_ref(), &claims.sub).await? {
        ResolveOutcome::NoAccount => {
            let body = json!({
                "needsSignupChoice": true,
                "email": claims.email,
                "subject": claims.sub,
                "provider": provider_tag,
                "name": claims.name,
                "givenName": claims.given_name,
                "familyName": claims.family_name,
            });
            Ok(Json(body).into_response())
        }
        ResolveOutcome::SingleMatch { kind, attributes }
        | ResolveOutcome::AmbiguousMatch {
            kind, attributes, ..
        } => {
            let refresh_token = tokens
                .refresh_token
                .as_deref()
                .ok_or_else(|| ApiError::upstream("Code exchange returned no refresh token"))?;
            let session = establish_session(
                &state,
                kind,
                &attributes,
                Some(provider_tag),
                refresh_token,
            )
            .await?;
            let body = json!({
                "isLoggedIn": true,
                "user": UserView::from(&session.principal),
                "redirectTo": "/",
            });
            let jar = with_cookies(jar, session.cookies);
            Ok((jar, Json(body)).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSocialSignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /auth/complete-social-signup`
///
/// Invoked only after a signup-choice prompt. Fills in the attributes the
/// federated identity lacked, assigns the chosen account type's group, and
/// mints. Attribute writes are idempotent, so repeating the call is safe
/// and simply re-mints.
pub async fn complete_social_signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<CompleteSocialSignupRequest>,
) -> Result<Response, ApiError> {
    let (Some(_email), Some(subject), Some(provider_tag), Some(phone), Some(account_type)) = (
        &request.email,
        &request.subject,
        &request.provider,
        &request.phone,
        &request.account_type,
    ) else {
        return Err(ApiError::validation("Missing required signup fields"));
    };

    let social_pool = state.registry.require(SOCIAL_POOL)?;

    let mut updates = vec![
        (keys::PHONE.to_string(), format_phone_e164(phone)),
        (keys::ACCOUNT_TYPE.to_string(), account_type.clone()),
    ];
    if let Some(name) = &request.name {
        updates.push((keys::NAME.to_string(), name.clone()));
    }
    state
        .provider
        .update_attributes(social_pool, subject, &updates)
        .await
        .map_err(|err| match err {
            idgate_idp::IdpError::UserNotFound => {
                ApiError::not_found("No pending social signup for this subject")
            }
            other => other.into(),
        })?;

    let chosen = account_type_pool(account_type);
    if let Some(group) = state
        .registry
        .get(chosen)
        .and_then(|pool| pool.group.clone())
    {
        state
            .provider
            .add_to_group(social_pool, subject, &group)
            .await?;
    }

    let attributes = state
        .provider
        .fetch_attributes(social_pool, subject)
        .await?
        .ok_or_else(|| ApiError::not_found("No pending social signup for this subject"))?;

    // No IdP refresh grant exists for this flow; the subject is stored so a
    // later refresh fails closed into a clean re-login.
    let session = establish_session(
        &state,
        SOCIAL_POOL,
        &attributes,
        Some(provider_tag.clone()),
        subject,
    )
    .await?;

    let body = json!({
        "isLoggedIn": true,
        "user": UserView::from(&session.principal),
        "message": "Signup complete",
        "redirectTo": "/",
    });
    let jar = with_cookies(jar, session.cookies);
    Ok((jar, Json(body)).into_response())
}

/// Maps a requested account type onto the pool whose group it joins.
fn account_type_pool(account_type: &str) -> PoolKind {
    PoolKind::parse(account_type).unwrap_or(PoolKind::Customer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_types_map_to_pools() {
        assert_eq!(account_type_pool("seller"), PoolKind::Seller);
        assert_eq!(account_type_pool("customer"), PoolKind::Customer);
        assert_eq!(account_type_pool("personal"), PoolKind::Customer);
        assert_eq!(account_type_pool("team"), PoolKind::Customer);
    }
}
