//! Session refresh via the IdP's refresh grant.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use cookie::Cookie;
use serde_json::json;

use idgate_idp::{PoolKind, UserAttributes};
use idgate_session::{REFRESH_COOKIE, decode_refresh};

use crate::error::ApiError;
use crate::handlers::{UserView, with_cookies};
use crate::pipeline::establish_session;
use crate::state::AppState;

/// `POST /auth/refresh`
///
/// Authenticated by the refresh cookie alone. On success all three cookies
/// rotate together; on any failure all three are cleared together, so the
/// client never retries with a credential the IdP has already rejected.
/// Whatever refresh token the IdP returns is the one persisted — after a
/// provider-side rotation the old token is dead.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    match refresh_inner(&state, &jar).await {
        Ok((cookies, body)) => {
            let jar = with_cookies(jar, cookies);
            (jar, Json(body)).into_response()
        }
        Err(err) => {
            let jar = with_cookies(jar, state.cookies.clear());
            (jar, err).into_response()
        }
    }
}

async fn refresh_inner(
    state: &AppState,
    jar: &CookieJar,
) -> Result<([Cookie<'static>; 3], serde_json::Value), ApiError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(Cookie::value)
        .ok_or_else(ApiError::session_expired)?
        .to_string();

    let (tag, refresh_token) = decode_refresh(&presented);
    let kind = tag
        .and_then(PoolKind::parse)
        .unwrap_or(PoolKind::Customer);
    let pool = state.registry.require(kind)?;

    let tokens = state.provider.refresh_session(pool, refresh_token).await?;

    // Persist the rotated token when the IdP issued one; the presented
    // token stays valid otherwise.
    let persisted = tokens
        .refresh_token
        .as_deref()
        .unwrap_or(refresh_token)
        .to_string();

    let claims = state.verifier.verify(pool, &tokens.id_token).await?;
    let attributes: UserAttributes = state
        .provider
        .fetch_attributes(pool, &claims.sub)
        .await?
        .ok_or_else(ApiError::session_expired)?;

    let session = establish_session(state, kind, &attributes, None, &persisted).await?;

    let body = json!({
        "message": "Token refreshed successfully",
        "user": UserView::from(&session.principal),
    });
    Ok((session.cookies, body))
}
