//! Signout: best-effort revoke, unconditional cookie clearing.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use cookie::Cookie;
use serde_json::json;

use idgate_idp::PoolKind;
use idgate_session::{REFRESH_COOKIE, decode_refresh};

use crate::handlers::with_cookies;
use crate::state::AppState;

/// `POST /auth/signout`
///
/// A destructive operation on whatever credentials the client presents:
/// no session validation, a best-effort server-side revoke of the refresh
/// token, and all three cookies cleared regardless of the revoke outcome.
/// Always answers 200.
pub async fn signout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(presented) = jar.get(REFRESH_COOKIE).map(Cookie::value) {
        let presented = presented.to_string();
        let (tag, refresh_token) = decode_refresh(&presented);
        let kind = tag
            .and_then(PoolKind::parse)
            .unwrap_or(PoolKind::Customer);
        match state.registry.require(kind) {
            Ok(pool) => {
                if let Err(err) = state.provider.revoke_refresh_token(pool, refresh_token).await {
                    tracing::warn!(error = %err, pool = %kind, "refresh token revocation failed");
                } else {
                    tracing::debug!(pool = %kind, "refresh token revoked");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "refresh cookie references an unconfigured pool");
            }
        }
    }

    let jar = with_cookies(jar, state.cookies.clear());
    (jar, Json(json!({ "message": "Logged out successfully" }))).into_response()
}
