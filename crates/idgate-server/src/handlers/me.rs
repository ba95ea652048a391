//! Current-session introspection.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use cookie::Cookie;
use serde_json::json;

use idgate_session::{MIRROR_COOKIE, SESSION_COOKIE};

use crate::error::ApiError;
use crate::handlers::with_cookies;
use crate::state::AppState;

/// `GET /auth/me`
///
/// Verified statelessly from the session token. Exactly one carrier is
/// trusted per request, in fixed precedence: session cookie, then mirror
/// cookie, then `Authorization: Bearer`. A present-but-invalid token
/// invalidates the whole session, so all three cookies are cleared on
/// that 401.
pub async fn me(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap) -> Response {
    let token = jar
        .get(SESSION_COOKIE)
        .or_else(|| jar.get(MIRROR_COOKIE))
        .map(Cookie::value)
        .map(String::from)
        .or_else(|| bearer_token(&headers));

    let Some(token) = token else {
        return ApiError::authentication().into_response();
    };

    match state.minter.verify(&token) {
        Some(claims) => {
            let body = json!({
                "isLoggedIn": true,
                "user": {
                    "id": claims.sub,
                    "email": claims.email,
                    "name": claims.name,
                    "organizationId": claims.org,
                    "role": claims.role,
                },
            });
            Json(body).into_response()
        }
        None => {
            let jar = with_cookies(jar, state.cookies.clear());
            (jar, ApiError::authentication()).into_response()
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(String::from)
}
