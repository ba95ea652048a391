//! Session credentials for IdGate.
//!
//! The gateway's own credential layer: the [`Principal`] type, the HS256
//! session minter, and the cookie transport that carries session and refresh
//! credentials with deployment-appropriate attributes.

pub mod cookies;
pub mod error;
pub mod minter;
pub mod principal;

pub use cookies::{
    CookieEnvironment, CookiePolicy, MIRROR_COOKIE, REFRESH_COOKIE, REFRESH_PATH, SESSION_COOKIE,
    decode_refresh, encode_refresh,
};
pub use error::SessionError;
pub use minter::{SessionClaims, SessionMinter};
pub use principal::Principal;
