//! Gateway configuration.
//!
//! Settings come from a TOML file plus `IDGATE__`-prefixed environment
//! overrides (e.g. `IDGATE__SERVER__PORT=9090`). Everything is validated
//! once at startup; a failed validation terminates the process before it
//! binds a socket. Secrets (signing secret, client secrets, store password)
//! normally arrive via the environment.
//!
//! # Example (TOML)
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [idp]
//! region = "us-east-1"
//! auth_domain = "auth.example.com"
//! redirect_url = "https://app.example.com/social/callback"
//!
//! [idp.customer_pool]
//! pool_id = "us-east-1_Customers"
//! issuer = "https://idp.us-east-1.example.com/us-east-1_Customers"
//! client_id = "abc123"
//! confidential = true
//!
//! [session]
//! token_ttl = "1h"
//! refresh_ttl = "30d"
//! environment = "production"
//! cookie_domain = ".example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use idgate_idp::{PoolConfig, PoolKind, SigningCredentials};
use idgate_session::CookieEnvironment;

/// Root gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Identity provider settings.
    pub idp: IdpSettings,
    /// Session credential settings.
    pub session: SessionSettings,
    /// Relational store settings.
    pub storage: StorageSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// CORS settings.
    pub cors: CorsConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpSettings {
    /// Provider region, used to derive the directory endpoint.
    pub region: String,

    /// Explicit directory endpoint override (tests, private deployments).
    pub endpoint: Option<String>,

    /// Hosted authorization domain for the social code exchange.
    pub auth_domain: String,

    /// Redirect URL the social frontend used when obtaining the code.
    pub redirect_url: String,

    /// Redirect URLs the deployment accepts. When non-empty,
    /// `redirect_url` must be on this list.
    pub allowed_redirect_urls: Vec<String>,

    /// Access key for signing admin directory calls.
    pub access_key_id: Option<String>,

    /// Secret key for signing admin directory calls.
    pub secret_access_key: Option<String>,

    /// Customer pool (primary; password signup/signin operate here).
    pub customer_pool: Option<PoolSettings>,

    /// Seller pool.
    pub seller_pool: Option<PoolSettings>,
}

impl IdpSettings {
    /// Signing credentials for admin calls, when configured.
    #[must_use]
    pub fn signing_credentials(&self) -> Option<SigningCredentials> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(SigningCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            _ => None,
        }
    }

    /// The configured pools as registry input, priority handled by the
    /// registry itself.
    #[must_use]
    pub fn pool_entries(&self) -> Vec<(PoolKind, PoolConfig)> {
        let mut entries = Vec::new();
        if let Some(pool) = &self.customer_pool {
            entries.push((PoolKind::Customer, pool.to_pool_config()));
        }
        if let Some(pool) = &self.seller_pool {
            entries.push((PoolKind::Seller, pool.to_pool_config()));
        }
        entries
    }
}

/// Settings for one identity pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Pool identifier at the provider.
    pub pool_id: String,
    /// Issuer URL for tokens signed by this pool.
    pub issuer: String,
    /// App client id.
    pub client_id: String,
    /// App client secret (required when `confidential`).
    pub client_secret: Option<String>,
    /// Whether the app client is confidential.
    pub confidential: bool,
    /// Provider-side group for this pool's account type.
    pub group: Option<String>,
}

impl PoolSettings {
    fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            pool_id: self.pool_id.clone(),
            issuer: self.issuer.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            confidential: self.confidential,
            group: self.group.clone(),
        }
    }
}

/// Session credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Process-wide signing secret for session tokens. Required.
    pub signing_secret: String,

    /// Session token lifetime.
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,

    /// Refresh cookie lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: Duration,

    /// Shared parent domain for production cookies.
    pub cookie_domain: Option<String>,

    /// Deployment topology: "development" or "production".
    pub environment: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            token_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(30 * 24 * 3600),
            cookie_domain: None,
            environment: "development".to_string(),
        }
    }
}

impl SessionSettings {
    /// The parsed cookie environment.
    #[must_use]
    pub fn cookie_environment(&self) -> CookieEnvironment {
        if self.environment.eq_ignore_ascii_case("production") {
            CookieEnvironment::Production
        } else {
            CookieEnvironment::Development
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter ("trace" .. "error", "off").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// CORS settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway with credentials.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Validates the configuration.
    ///
    /// Failures here are startup-fatal by design: a missing signing secret
    /// or a confidential pool without its client secret must never make it
    /// to request handling.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.session.signing_secret.trim().is_empty() {
            return Err("session.signing_secret is required".into());
        }
        let environment = self.session.environment.to_ascii_lowercase();
        if !["development", "production"].contains(&environment.as_str()) {
            return Err("session.environment must be 'development' or 'production'".into());
        }
        if self.session.cookie_environment() == CookieEnvironment::Production
            && self.session.cookie_domain.is_none()
        {
            return Err("session.cookie_domain is required in production".into());
        }

        let pools = self.idp.pool_entries();
        if pools.is_empty() {
            return Err("at least one identity pool must be configured".into());
        }
        for (kind, pool) in &pools {
            if pool.pool_id.is_empty() || pool.client_id.is_empty() || pool.issuer.is_empty() {
                return Err(format!(
                    "idp.{kind}_pool requires pool_id, issuer and client_id"
                ));
            }
            if pool.confidential && pool.client_secret.is_none() {
                return Err(format!(
                    "idp.{kind}_pool is confidential but has no client_secret"
                ));
            }
        }
        if self.idp.signing_credentials().is_none() {
            return Err("idp.access_key_id and idp.secret_access_key are required".into());
        }
        if !self.idp.allowed_redirect_urls.is_empty()
            && !self
                .idp
                .allowed_redirect_urls
                .contains(&self.idp.redirect_url)
        {
            return Err("idp.redirect_url is not on idp.allowed_redirect_urls".into());
        }

        if self.storage.url.is_empty() {
            return Err("storage.url is required".into());
        }
        if self.storage.max_connections == 0 {
            return Err("storage.max_connections must be > 0".into());
        }

        let level = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&level.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Loads and validates the configuration from an optional TOML file and
    /// `IDGATE__`-prefixed environment overrides.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("idgate.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("IDGATE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.session.signing_secret = "secret".into();
        config.storage.url = "postgres://localhost/idgate".into();
        config.idp.region = "us-east-1".into();
        config.idp.access_key_id = Some("AKIDEXAMPLE".into());
        config.idp.secret_access_key = Some("key".into());
        config.idp.customer_pool = Some(PoolSettings {
            pool_id: "us-east-1_Customers".into(),
            issuer: "https://idp.example.com/us-east-1_Customers".into(),
            client_id: "client-1".into(),
            client_secret: None,
            confidential: false,
            group: None,
        });
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_signing_secret_fails() {
        let mut config = valid_config();
        config.session.signing_secret = "   ".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("signing_secret"));
    }

    #[test]
    fn confidential_pool_without_secret_fails() {
        let mut config = valid_config();
        config.idp.customer_pool.as_mut().unwrap().confidential = true;
        let err = config.validate().unwrap_err();
        assert!(err.contains("client_secret"));
    }

    #[test]
    fn no_pools_fails() {
        let mut config = valid_config();
        config.idp.customer_pool = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("identity pool"));
    }

    #[test]
    fn production_requires_cookie_domain() {
        let mut config = valid_config();
        config.session.environment = "production".into();
        let err = config.validate().unwrap_err();
        assert!(err.contains("cookie_domain"));
    }

    #[test]
    fn redirect_url_must_be_allowed_when_list_is_set() {
        let mut config = valid_config();
        config.idp.redirect_url = "https://rogue.example.com/cb".into();
        config.idp.allowed_redirect_urls = vec!["https://app.example.com/cb".into()];
        let err = config.validate().unwrap_err();
        assert!(err.contains("redirect_url"));
    }

    #[test]
    fn default_lifetimes() {
        let session = SessionSettings::default();
        assert_eq!(session.token_ttl, Duration::from_secs(3600));
        assert_eq!(session.refresh_ttl, Duration::from_secs(30 * 24 * 3600));
        assert_eq!(session.cookie_environment(), CookieEnvironment::Development);
    }
}
