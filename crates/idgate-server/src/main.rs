use std::env;
use std::sync::Arc;

use idgate_idp::{HttpIdentityProvider, JwksTokenVerifier, PoolRegistry};
use idgate_session::{CookiePolicy, SessionMinter};
use idgate_server::config::loader::load_config;
use idgate_server::state::{AppState, SocialSettings};
use idgate_store::PostgresEnricher;
use url::Url;

#[tokio::main]
async fn main() {
    // Optional .env for local development; absence is not an error.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    let config_path = env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .or_else(|| env::var("IDGATE_CONFIG").ok());

    let cfg = match load_config(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    idgate_server::observability::init_tracing(&cfg.logging.level);
    tracing::info!(
        path = config_path.as_deref().unwrap_or("idgate.toml"),
        "Configuration loaded"
    );

    // Everything below is startup-fatal on failure: a gateway with a bad
    // pool registry, signing secret or store connection must not serve.
    let registry = match PoolRegistry::new(cfg.idp.pool_entries()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Pool registry error: {e}");
            std::process::exit(2);
        }
    };

    let endpoint = cfg
        .idp
        .endpoint
        .as_deref()
        .map(Url::parse)
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("Invalid idp.endpoint: {e}");
            std::process::exit(2);
        });

    let provider = match HttpIdentityProvider::new(
        cfg.idp.region.clone(),
        cfg.idp.auth_domain.clone(),
        cfg.idp.signing_credentials(),
        endpoint,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Identity provider error: {e}");
            std::process::exit(2);
        }
    };

    let minter = match SessionMinter::new(&cfg.session.signing_secret) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Session minter error: {e}");
            std::process::exit(2);
        }
    };

    let pool = match idgate_store::connect(&cfg.storage.url, cfg.storage.max_connections).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Store connection error: {e}");
            std::process::exit(2);
        }
    };

    let cookies = CookiePolicy::new(
        cfg.session.cookie_environment(),
        cfg.session.cookie_domain.clone(),
        time::Duration::seconds(cfg.session.token_ttl.as_secs() as i64),
        time::Duration::seconds(cfg.session.refresh_ttl.as_secs() as i64),
    );

    let state = AppState {
        provider: Arc::new(provider),
        verifier: Arc::new(JwksTokenVerifier::new()),
        registry: Arc::new(registry),
        minter: Arc::new(minter),
        cookies: Arc::new(cookies),
        enricher: Arc::new(PostgresEnricher::new(pool)),
        social: SocialSettings {
            redirect_url: cfg.idp.redirect_url.clone(),
        },
    };

    let app = idgate_server::app(state, &cfg.cors);
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(%addr, "IdGate listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
