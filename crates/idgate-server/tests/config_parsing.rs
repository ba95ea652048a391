use std::{env, fs};

use idgate_server::config::loader::load_config;

#[test]
fn config_parsing_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("idgate.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081

[idp]
region = "us-east-1"
auth_domain = "auth.example.com"
redirect_url = "https://app.example.com/social/callback"
access_key_id = "AKIDEXAMPLE"
secret_access_key = "test-secret-key"

[idp.customer_pool]
pool_id = "us-east-1_Customers"
issuer = "https://idp.example.com/us-east-1_Customers"
client_id = "client-1"

[session]
signing_secret = "test-signing-secret"
token_ttl = "30m"
refresh_ttl = "14d"

[storage]
url = "postgres://localhost/idgate"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses.
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.session.token_ttl.as_secs(), 30 * 60);
    assert_eq!(cfg.session.refresh_ttl.as_secs(), 14 * 24 * 3600);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.idp.customer_pool.is_some());
    assert!(cfg.idp.seller_pool.is_none());

    // 2) Environment override wins over the file.
    unsafe {
        env::set_var("IDGATE__SERVER__PORT", "9099");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse with env overrides");
    assert_eq!(cfg_env.server.port, 9099);
    unsafe {
        env::remove_var("IDGATE__SERVER__PORT");
    }

    // 3) A missing signing secret is a startup-fatal validation error.
    let invalid_path = dir.path().join("invalid.toml");
    let invalid = toml_content.replace("signing_secret = \"test-signing-secret\"", "");
    fs::write(&invalid_path, invalid).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("signing_secret"));

    // 4) A confidential pool without its secret refuses to start.
    let confidential_path = dir.path().join("confidential.toml");
    let confidential = toml_content.replace(
        "client_id = \"client-1\"",
        "client_id = \"client-1\"\nconfidential = true",
    );
    fs::write(&confidential_path, confidential).expect("write toml");
    let err = load_config(confidential_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("client_secret"));
}
