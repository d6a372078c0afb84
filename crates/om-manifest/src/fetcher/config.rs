//! Configuration for the Ops Manager client

use std::fmt;
use std::time::Duration;
use url::Url;

use super::error::{FetchError, Result};

/// UAA client used by the Ops Manager CLI tooling
pub const DEFAULT_CLIENT_ID: &str = "opsman";

pub const URL_VAR: &str = "OPSMAN_URL";
pub const USERNAME_VAR: &str = "OPSMAN_USERNAME";
pub const PASSWORD_VAR: &str = "OPSMAN_PASSWORD";
pub const SKIP_TLS_VAR: &str = "OPSMAN_SKIP_SSL_VALIDATION";

/// Connection settings for one Ops Manager
#[derive(Clone)]
pub struct OpsManagerConfig {
    /// Base URL, e.g. `https://opsman.example.com`
    pub url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Accept self-signed certificates (Ops Manager ships with one)
    pub skip_tls_verification: bool,
}

impl OpsManagerConfig {
    pub fn new<U, N, P>(url: U, username: N, password: P) -> Self
    where
        U: Into<String>,
        N: Into<String>,
        P: Into<String>,
    {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Load settings from the environment (and a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str, suggestion: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| FetchError::missing_config(key, suggestion))
        };

        let url = required(URL_VAR, "Set OPSMAN_URL to the Ops Manager base URL, e.g. https://opsman.example.com")?;
        let username = required(USERNAME_VAR, "Set OPSMAN_USERNAME to an Ops Manager admin user")?;
        let password = required(PASSWORD_VAR, "Set OPSMAN_PASSWORD in your .env file")?;

        let skip_tls_verification = lookup(SKIP_TLS_VAR)
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self::new(url, username, password).with_skip_tls_verification(skip_tls_verification);
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls_verification(mut self, skip: bool) -> Self {
        self.skip_tls_verification = skip;
        self
    }

    pub fn with_client_credentials<I, S>(mut self, client_id: I, client_secret: S) -> Self
    where
        I: Into<String>,
        S: Into<String>,
    {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// Check that the base URL is an absolute http(s) URL
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url).map_err(|e| match FetchError::from(e) {
            FetchError::InvalidUrl { suggestion, source, .. } => FetchError::InvalidUrl {
                url: self.url.clone(),
                suggestion,
                source,
            },
            other => other,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(FetchError::UnsupportedUrl {
                url: self.url.clone(),
                scheme: scheme.to_string(),
            }),
        }
    }

    /// Absolute URL of an endpoint below the base URL
    ///
    /// The path is appended to whatever path the base URL already has.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.validate()?;
        let joined = format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }
}

impl Default for OpsManagerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: String::new(),
            timeout: Duration::from_secs(30),
            user_agent: format!("om-manifest/{}", env!("CARGO_PKG_VERSION")),
            skip_tls_verification: false,
        }
    }
}

impl fmt::Debug for OpsManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpsManagerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("skip_tls_verification", &self.skip_tls_verification)
            .finish()
    }
}
