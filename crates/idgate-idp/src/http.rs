//! HTTP implementation of the identity provider bridge.
//!
//! The directory speaks a JSON action protocol: every operation is a POST to
//! one regional endpoint with the operation named in an `X-Amz-Target`
//! header and an `application/x-amz-json-1.1` body. Admin operations carry a
//! SigV4 signature. Token operations (refresh grant, social code exchange)
//! use the standard OAuth2 form-encoded endpoints instead.
//!
//! The wire protocol is spoken directly over reqwest; there is no vendor SDK
//! in the dependency tree.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use time::OffsetDateTime;
use url::Url;

use crate::attributes::UserAttributes;
use crate::error::{IdpError, IdpResult};
use crate::pool::PoolConfig;
use crate::provider::{IdentityProvider, IdpTokens};
use crate::sigv4::{self, SignableRequest, SigningCredentials};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const ACTION_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const SIGNING_SERVICE: &str = "cognito-idp";

/// Bridge to the external identity provider over HTTP.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    region: String,
    auth_domain: String,
    credentials: Option<SigningCredentials>,
}

impl HttpIdentityProvider {
    /// Creates the bridge.
    ///
    /// `auth_domain` is the hosted authorization domain used for the social
    /// code exchange. `credentials` are required for admin operations and
    /// validated at startup by the caller. `endpoint` overrides the default
    /// regional directory endpoint (used by tests and private deployments).
    ///
    /// # Errors
    ///
    /// Returns [`IdpError::Configuration`] when the endpoint URL is invalid.
    pub fn new(
        region: impl Into<String>,
        auth_domain: impl Into<String>,
        credentials: Option<SigningCredentials>,
        endpoint: Option<Url>,
    ) -> IdpResult<Self> {
        let region = region.into();
        let endpoint = match endpoint {
            Some(url) => url,
            None => Url::parse(&format!("https://cognito-idp.{region}.amazonaws.com/"))
                .map_err(|e| IdpError::configuration(format!("invalid directory endpoint: {e}")))?,
        };
        let host = endpoint
            .host_str()
            .ok_or_else(|| IdpError::configuration("directory endpoint has no host"))?
            .to_string();
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            host,
            region,
            auth_domain: auth_domain.into(),
            credentials,
        })
    }

    fn require_credentials(&self) -> IdpResult<&SigningCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| IdpError::configuration("admin signing credentials not configured"))
    }

    /// Issues one directory action call and parses the JSON response.
    async fn action(&self, target: &str, body: &Value, signed: bool) -> IdpResult<Value> {
        let target = format!("{TARGET_PREFIX}.{target}");
        let payload = serde_json::to_string(body)
            .map_err(|e| IdpError::upstream(format!("request encoding failed: {e}")))?;

        let mut request = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, ACTION_CONTENT_TYPE)
            .header("x-amz-target", target.clone());

        if signed {
            let credentials = self.require_credentials()?;
            let now = OffsetDateTime::now_utc();
            let (amz_date, _) = sigv4::format_timestamps(now);
            let signable = SignableRequest {
                method: "POST",
                uri: "/",
                query: "",
                headers: vec![
                    ("content-type".into(), ACTION_CONTENT_TYPE.into()),
                    ("host".into(), self.host.clone()),
                    ("x-amz-date".into(), amz_date.clone()),
                    ("x-amz-target".into(), target.clone()),
                ],
                payload: payload.as_bytes(),
            };
            let signature = sigv4::sign(credentials, &self.region, SIGNING_SERVICE, now, &signable);
            request = request
                .header("x-amz-date", signature.amz_date)
                .header("authorization", signature.authorization);
        }

        let response = request.body(payload).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| IdpError::upstream(format!("malformed directory response: {e}")))?
        };

        if status.is_success() {
            return Ok(value);
        }

        let code = value["__type"].as_str().unwrap_or("UnknownError");
        let message = value["message"]
            .as_str()
            .or_else(|| value["Message"].as_str())
            .unwrap_or("directory call failed");
        tracing::debug!(action = %target, %code, "directory action rejected");
        Err(map_directory_error(code, message))
    }

    /// Posts an OAuth2 form to a token endpoint and parses the token set.
    async fn token_request(
        &self,
        url: &str,
        form: &[(&str, &str)],
        basic_auth: Option<(&str, &str)>,
    ) -> IdpResult<IdpTokens> {
        let mut request = self.http.post(url).form(form);
        if let Some((client_id, client_secret)) = basic_auth {
            request = request.basic_auth(client_id, Some(client_secret));
        }
        let response = request.send().await?;
        let status = response.status();
        let value: Value = response
            .json()
            .await
            .map_err(|e| IdpError::upstream(format!("malformed token response: {e}")))?;

        if !status.is_success() {
            let code = value["error"].as_str().unwrap_or("server_error");
            let message = value["error_description"]
                .as_str()
                .unwrap_or(code)
                .to_string();
            tracing::debug!(%code, "token endpoint rejected grant");
            return Err(match code {
                "invalid_grant" | "invalid_token" => IdpError::invalid_grant(message),
                "invalid_client" | "unauthorized_client" => IdpError::invalid_client(message),
                _ => IdpError::upstream(message),
            });
        }

        let id_token = value["id_token"].as_str();
        let access_token = value["access_token"].as_str();
        match (id_token, access_token) {
            (Some(id_token), Some(access_token)) => Ok(IdpTokens {
                id_token: id_token.to_string(),
                access_token: access_token.to_string(),
                refresh_token: value["refresh_token"].as_str().map(String::from),
                expires_in: value["expires_in"].as_u64().unwrap_or(3600),
            }),
            _ => Err(IdpError::upstream(
                "token endpoint replied without the expected tokens",
            )),
        }
    }
}

/// Maps a directory error code onto the bridge taxonomy.
fn map_directory_error(code: &str, message: &str) -> IdpError {
    // Codes may arrive namespaced ("com.example#NotAuthorizedException").
    let code = code.rsplit('#').next().unwrap_or(code);
    match code {
        "NotAuthorizedException" => IdpError::InvalidCredentials,
        "UserNotConfirmedException" => IdpError::UserNotConfirmed,
        "UserNotFoundException" => IdpError::UserNotFound,
        "UsernameExistsException" => IdpError::duplicate_account(message),
        "CodeMismatchException" | "ExpiredCodeException" => IdpError::invalid_grant(message),
        "InvalidPasswordException" | "InvalidParameterException" => {
            IdpError::invalid_parameter(message)
        }
        _ => IdpError::upstream(format!("{code}: {message}")),
    }
}

fn attribute_list(pairs: &[(String, String)]) -> Value {
    Value::Array(
        pairs
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect(),
    )
}

fn parse_attribute_list(value: &Value) -> UserAttributes {
    let pairs = value
        .as_array()
        .map(|attrs| {
            attrs
                .iter()
                .filter_map(|attr| {
                    Some((
                        attr["Name"].as_str()?.to_string(),
                        attr["Value"].as_str()?.to_string(),
                    ))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    UserAttributes::from_pairs(pairs)
}

fn auth_result_tokens(value: &Value) -> IdpResult<IdpTokens> {
    let result = &value["AuthenticationResult"];
    let id_token = result["IdToken"].as_str();
    let access_token = result["AccessToken"].as_str();
    match (id_token, access_token) {
        (Some(id_token), Some(access_token)) => Ok(IdpTokens {
            id_token: id_token.to_string(),
            access_token: access_token.to_string(),
            refresh_token: result["RefreshToken"].as_str().map(String::from),
            expires_in: result["ExpiresIn"].as_u64().unwrap_or(3600),
        }),
        _ => Err(IdpError::upstream(
            "authentication succeeded but the expected tokens are missing",
        )),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn authenticate_password(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
    ) -> IdpResult<IdpTokens> {
        let mut params = json!({
            "USERNAME": email,
            "PASSWORD": password,
        });
        if let Some(hash) = pool.secret_hash(email) {
            params["SECRET_HASH"] = Value::String(hash);
        }
        let response = self
            .action(
                "InitiateAuth",
                &json!({
                    "AuthFlow": "USER_PASSWORD_AUTH",
                    "ClientId": pool.client_id,
                    "AuthParameters": params,
                }),
                false,
            )
            .await?;
        auth_result_tokens(&response)
    }

    async fn sign_up(
        &self,
        pool: &PoolConfig,
        email: &str,
        password: &str,
        attributes: &UserAttributes,
    ) -> IdpResult<String> {
        let mut body = json!({
            "ClientId": pool.client_id,
            "Username": email,
            "Password": password,
            "UserAttributes": attribute_list(&attributes.to_pairs()),
        });
        if let Some(hash) = pool.secret_hash(email) {
            body["SecretHash"] = Value::String(hash);
        }
        let response = self.action("SignUp", &body, false).await?;
        response["UserSub"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| IdpError::upstream("sign-up reply carried no subject id"))
    }

    async fn force_confirm(&self, pool: &PoolConfig, username: &str) -> IdpResult<()> {
        self.action(
            "AdminConfirmSignUp",
            &json!({ "UserPoolId": pool.pool_id, "Username": username }),
            true,
        )
        .await?;
        Ok(())
    }

    async fn confirm_sign_up(&self, pool: &PoolConfig, email: &str, code: &str) -> IdpResult<()> {
        let mut body = json!({
            "ClientId": pool.client_id,
            "Username": email,
            "ConfirmationCode": code,
        });
        if let Some(hash) = pool.secret_hash(email) {
            body["SecretHash"] = Value::String(hash);
        }
        self.action("ConfirmSignUp", &body, false).await?;
        Ok(())
    }

    async fn fetch_attributes(
        &self,
        pool: &PoolConfig,
        subject_or_username: &str,
    ) -> IdpResult<Option<UserAttributes>> {
        let result = self
            .action(
                "AdminGetUser",
                &json!({ "UserPoolId": pool.pool_id, "Username": subject_or_username }),
                true,
            )
            .await;
        match result {
            Ok(response) => Ok(Some(parse_attribute_list(&response["UserAttributes"]))),
            Err(IdpError::UserNotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update_attributes(
        &self,
        pool: &PoolConfig,
        username: &str,
        attributes: &[(String, String)],
    ) -> IdpResult<()> {
        self.action(
            "AdminUpdateUserAttributes",
            &json!({
                "UserPoolId": pool.pool_id,
                "Username": username,
                "UserAttributes": attribute_list(attributes),
            }),
            true,
        )
        .await?;
        Ok(())
    }

    async fn add_to_group(&self, pool: &PoolConfig, username: &str, group: &str) -> IdpResult<()> {
        self.action(
            "AdminAddUserToGroup",
            &json!({
                "UserPoolId": pool.pool_id,
                "Username": username,
                "GroupName": group,
            }),
            true,
        )
        .await?;
        Ok(())
    }

    async fn refresh_session(
        &self,
        pool: &PoolConfig,
        refresh_token: &str,
    ) -> IdpResult<IdpTokens> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", pool.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = pool.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }
        self.token_request(&pool.token_url(), &form, None).await
    }

    async fn revoke_refresh_token(&self, pool: &PoolConfig, refresh_token: &str) -> IdpResult<()> {
        let mut body = json!({
            "Token": refresh_token,
            "ClientId": pool.client_id,
        });
        if let Some(secret) = pool.client_secret.as_deref() {
            body["ClientSecret"] = Value::String(secret.to_string());
        }
        self.action("RevokeToken", &body, false).await?;
        Ok(())
    }

    async fn exchange_authorization_code(
        &self,
        pool: &PoolConfig,
        code: &str,
        redirect_uri: &str,
    ) -> IdpResult<IdpTokens> {
        let url = format!("https://{}/oauth2/token", self.auth_domain);
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", pool.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let basic = pool
            .client_secret
            .as_deref()
            .map(|secret| (pool.client_id.as_str(), secret));
        self.token_request(&url, &form, basic).await
    }

    async fn initiate_password_reset(&self, pool: &PoolConfig, email: &str) -> IdpResult<()> {
        let mut body = json!({
            "ClientId": pool.client_id,
            "Username": email,
        });
        if let Some(hash) = pool.secret_hash(email) {
            body["SecretHash"] = Value::String(hash);
        }
        self.action("ForgotPassword", &body, false).await?;
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        pool: &PoolConfig,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> IdpResult<()> {
        let mut body = json!({
            "ClientId": pool.client_id,
            "Username": email,
            "ConfirmationCode": code,
            "Password": new_password,
        });
        if let Some(hash) = pool.secret_hash(email) {
            body["SecretHash"] = Value::String(hash);
        }
        self.action("ConfirmForgotPassword", &body, false).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_error_mapping() {
        assert!(matches!(
            map_directory_error("NotAuthorizedException", "bad password"),
            IdpError::InvalidCredentials
        ));
        assert!(matches!(
            map_directory_error("UsernameExistsException", "taken"),
            IdpError::DuplicateAccount { .. }
        ));
        assert!(matches!(
            map_directory_error("ExpiredCodeException", "expired"),
            IdpError::InvalidGrant { .. }
        ));
        assert!(matches!(
            map_directory_error("com.amazonaws#UserNotFoundException", "missing"),
            IdpError::UserNotFound
        ));
        assert!(matches!(
            map_directory_error("InternalErrorException", "boom"),
            IdpError::Upstream { .. }
        ));
    }

    #[test]
    fn parses_attribute_list_payload() {
        let value = json!([
            { "Name": "sub", "Value": "u-1" },
            { "Name": "email", "Value": "a@b.c" },
        ]);
        let attrs = parse_attribute_list(&value);
        assert_eq!(attrs.subject, "u-1");
        assert_eq!(attrs.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn auth_result_requires_both_tokens() {
        let ok = json!({
            "AuthenticationResult": {
                "IdToken": "id",
                "AccessToken": "at",
                "RefreshToken": "rt",
                "ExpiresIn": 1800,
            }
        });
        let tokens = auth_result_tokens(&ok).unwrap();
        assert_eq!(tokens.expires_in, 1800);
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));

        let partial = json!({ "AuthenticationResult": { "IdToken": "id" } });
        assert!(auth_result_tokens(&partial).is_err());
    }
}
