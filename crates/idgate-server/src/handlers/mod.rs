//! HTTP handlers for the auth surface.

pub mod check_user;
pub mod me;
pub mod password;
pub mod refresh;
pub mod seller;
pub mod signin;
pub mod signout;
pub mod signup;
pub mod social;

use axum::Router;
use axum::routing::{get, post};
use axum_extra::extract::cookie::CookieJar;
use cookie::Cookie;
use serde::Serialize;

use idgate_session::Principal;

use crate::state::AppState;

/// Builds the `/auth` route set.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(signup::signup))
        .route("/auth/signin", post(signin::signin))
        .route("/auth/refresh", post(refresh::refresh))
        .route("/auth/signout", post(signout::signout))
        .route("/auth/me", get(me::me))
        .route(
            "/auth/process-social-login",
            post(social::process_social_login),
        )
        .route(
            "/auth/complete-social-signup",
            post(social::complete_social_signup),
        )
        .route("/auth/reset-password", post(password::reset_password))
        .route("/auth/confirm-reset", post(password::confirm_reset))
        .route("/auth/verify-code", post(password::verify_code))
        .route("/auth/register-seller", post(seller::register_seller))
        .route("/auth/check-user", post(check_user::check_user))
        .with_state(state)
}

/// The user object returned by session-establishing endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    pub permissions: Vec<String>,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub pool: String,
}

impl From<&Principal> for UserView {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.subject.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            phone: principal.phone.clone(),
            organization_id: principal.organization_id.clone(),
            organization_name: principal.organization_name.clone(),
            role: principal.role.clone(),
            account_type: principal.account_type.clone(),
            permissions: principal.permissions.clone(),
            timezone: principal.timezone.clone(),
            provider: principal.provider.clone(),
            pool: principal.pool.clone(),
        }
    }
}

/// Adds a cookie triple to the jar.
pub(crate) fn with_cookies(jar: CookieJar, cookies: [Cookie<'static>; 3]) -> CookieJar {
    cookies.into_iter().fold(jar, CookieJar::add)
}
