//! UAA password-grant authentication
//!
//! Ops Manager fronts its API with a UAA. Tooling logs in with the resource
//! owner password grant as the public `opsman` client (empty secret) and then
//! sends the access token as a bearer token on every API call.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};
use url::Url;

use super::config::OpsManagerConfig;
use super::error::{FetchError, Result};

/// Path of the UAA token endpoint below the Ops Manager base URL
pub const TOKEN_PATH: &str = "uaa/oauth/token";

/// Token issued by the UAA
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Build the HTTP client shared by token and API requests
pub fn build_http_client(config: &OpsManagerConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(config.skip_tls_verification)
        .build()?;
    Ok(client)
}

/// Exchange a username and password for an access token
pub async fn password_grant(
    client: &Client,
    token_url: Url,
    config: &OpsManagerConfig,
) -> Result<AccessToken> {
    debug!("Requesting token from {} for user {}", token_url, config.username);

    let params = [
        ("grant_type", "password"),
        ("username", config.username.as_str()),
        ("password", config.password.as_str()),
        ("client_id", config.client_id.as_str()),
    ];

    let response = client
        .post(token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&params)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(FetchError::Authentication { status, body });
    }

    let token: AccessToken = serde_json::from_str(&body).map_err(|e| {
        FetchError::InvalidTokenResponse {
            reason: e.to_string(),
        }
    })?;

    if token.access_token.is_empty() {
        return Err(FetchError::InvalidTokenResponse {
            reason: "server response missing access_token".to_string(),
        });
    }

    debug!("Token issued (type: {}, expires in: {:?}s)", token.token_type, token.expires_in);
    Ok(token)
}

/// An HTTP client that has logged in to Ops Manager
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: Client,
    token: AccessToken,
}

impl AuthenticatedClient {
    /// Log in with the configured credentials
    pub async fn login(config: &OpsManagerConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let token_url = config.endpoint(TOKEN_PATH)?;
        let token = password_grant(&client, token_url, config).await?;

        info!("Authenticated to Ops Manager at {}", config.url);
        Ok(Self { client, token })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Start a GET request carrying the bearer token
    pub fn get(&self, url: Url) -> RequestBuilder {
        self.client.get(url).bearer_auth(&self.token.access_token)
    }
}
