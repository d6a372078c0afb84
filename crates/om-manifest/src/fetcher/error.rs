//! Error types for talking to Ops Manager

use reqwest::StatusCode;
use thiserror::Error;

use crate::manifest::ManifestError;

/// Errors raised while authenticating against or fetching from Ops Manager
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level HTTP failure
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The UAA refused to issue a token
    #[error("cannot fetch token: {status}")]
    Authentication { status: StatusCode, body: String },

    /// The UAA answered 2xx but the body was not a usable token
    #[error("invalid token response: {reason}")]
    InvalidTokenResponse { reason: String },

    /// An API call answered with something other than 200
    #[error("unexpected response from '{url}': {status}")]
    UnexpectedStatus {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// No staged product has the requested type
    #[error("could not find a product named {product_type}")]
    ProductNotFound { product_type: String },

    /// The staged manifest response had no `manifest` document
    #[error("staged product '{guid}' returned no manifest")]
    MissingManifest { guid: String },

    /// A URL could not be parsed
    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    /// A URL uses a scheme other than http or https
    #[error("Unsupported URL scheme '{scheme}' in '{url}' (supported: http, https)")]
    UnsupportedUrl { url: String, scheme: String },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        suggestion: Option<String>,
    },

    /// A response body could not be parsed
    #[error("failed to parse {context}")]
    Parse {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest itself could not be loaded
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    pub fn parse_error<S: Into<String>>(context: S, source: serde_yaml::Error) -> Self {
        FetchError::Parse {
            context: context.into(),
            source,
        }
    }

    pub fn missing_config(field: &str, suggestion: &str) -> Self {
        FetchError::Configuration {
            message: format!("{} environment variable not set", field),
            field: Some(field.to_string()),
            suggestion: Some(suggestion.to_string()),
        }
    }

    /// Whether trying the same call again could succeed
    ///
    /// Nothing in this crate retries; this is for callers that want to.
    pub fn is_recoverable(&self) -> bool {
        match self {
            FetchError::HttpRequest { source, .. } => {
                source.status().map_or(true, |status| status.is_server_error())
            }
            FetchError::UnexpectedStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Authentication { status, .. } => status.is_server_error(),
            FetchError::InvalidTokenResponse { .. } => false,
            FetchError::ProductNotFound { .. } => false,
            FetchError::MissingManifest { .. } => false,
            FetchError::InvalidUrl { .. } => false,
            FetchError::UnsupportedUrl { .. } => false,
            FetchError::Configuration { .. } => false,
            FetchError::Parse { .. } => false,
            FetchError::Manifest(_) => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            FetchError::HttpRequest { .. } => "http_request",
            FetchError::Authentication { .. } => "authentication",
            FetchError::InvalidTokenResponse { .. } => "invalid_token_response",
            FetchError::UnexpectedStatus { .. } => "unexpected_status",
            FetchError::ProductNotFound { .. } => "product_not_found",
            FetchError::MissingManifest { .. } => "missing_manifest",
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::UnsupportedUrl { .. } => "unsupported_url",
            FetchError::Configuration { .. } => "configuration",
            FetchError::Parse { .. } => "parse",
            FetchError::Manifest(e) => e.category(),
        }
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            FetchError::Authentication { status, .. } if *status == StatusCode::UNAUTHORIZED => {
                Some("Check OPSMAN_USERNAME and OPSMAN_PASSWORD")
            }
            FetchError::InvalidUrl { suggestion, .. } => Some(suggestion),
            FetchError::UnsupportedUrl { .. } => Some("Use an http:// or https:// Ops Manager URL"),
            FetchError::Configuration { suggestion, .. } => suggestion.as_deref(),
            FetchError::ProductNotFound { .. } => {
                Some("Check the product type against GET /api/v0/staged/products")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        let url = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        FetchError::HttpRequest { url, source: error }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(error: url::ParseError) -> Self {
        let suggestion = match error {
            url::ParseError::EmptyHost => "URL must have a valid hostname",
            url::ParseError::InvalidPort => "Port number must be between 1 and 65535",
            url::ParseError::RelativeUrlWithoutBase => {
                "URL must be absolute (include http:// or https://)"
            }
            _ => "Check URL format and try again",
        }
        .to_string();

        FetchError::InvalidUrl {
            url: "<unparseable>".to_string(),
            suggestion,
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error_display() {
        let err = FetchError::Authentication {
            status: StatusCode::IM_A_TEAPOT,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "cannot fetch token: 418 I'm a teapot");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_server_errors_are_recoverable() {
        let err = FetchError::UnexpectedStatus {
            url: "https://opsman.example.com/api/v0/staged/products".to_string(),
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "unexpected_status");
    }

    #[test]
    fn test_url_parse_error_suggestion() {
        let err: FetchError = url::Url::parse("opsman.example.com").unwrap_err().into();
        assert_eq!(
            err.suggestion(),
            Some("URL must be absolute (include http:// or https://)")
        );
    }

    #[test]
    fn test_manifest_errors_keep_their_category() {
        let err: FetchError = ManifestError::JobNotFound {
            name: "mysql".to_string(),
        }
        .into();
        assert_eq!(err.category(), "job_not_found");
        assert_eq!(err.to_string(), "unable to find job named 'mysql'");
    }
}
