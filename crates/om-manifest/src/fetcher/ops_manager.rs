//! Ops Manager staged-products API client
//!
//! This module retrieves staged product manifests:
//! - Logging in through the UAA (see [`super::oauth`])
//! - Resolving a product type such as `p-mysql` to its staged GUID
//! - Downloading the staged manifest and loading it into a [`Manifest`]
//!
//! Every operation is a plain sequence of requests. Nothing is retried or
//! cached; a failed call is reported to the caller as is.

use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use tracing::{debug, info};

use super::config::OpsManagerConfig;
use super::error::{FetchError, Result};
use super::oauth::AuthenticatedClient;
use crate::manifest::{Manifest, MANIFEST_KEY};

const STAGED_PRODUCTS_PATH: &str = "api/v0/staged/products";

/// A staged product as listed by Ops Manager
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(rename = "type")]
    pub product_type: String,
    pub guid: String,
}

/// Ops Manager API client
#[derive(Debug, Clone)]
pub struct OpsManagerAPI {
    config: OpsManagerConfig,
}

impl OpsManagerAPI {
    /// Create a client, validating the configured URL
    pub fn new(config: OpsManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a client from `OPSMAN_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpsManagerConfig::from_env()?)
    }

    pub fn config(&self) -> &OpsManagerConfig {
        &self.config
    }

    /// Log in and return a client for further API calls
    pub async fn authenticate(&self) -> Result<AuthenticatedClient> {
        AuthenticatedClient::login(&self.config).await
    }

    /// List all staged products
    pub async fn list_staged_products(&self) -> Result<Vec<Product>> {
        let client = self.authenticate().await?;
        self.staged_products_with(&client).await
    }

    /// Resolve a product type (e.g. `p-mysql`) to its staged GUID
    pub async fn get_product_guid(&self, product_type: &str) -> Result<String> {
        let client = self.authenticate().await?;
        self.product_guid_with(&client, product_type).await
    }

    /// Fetch and load the staged manifest of a product type
    pub async fn get_staged_product_manifest(&self, product_type: &str) -> Result<Manifest> {
        info!("Fetching staged manifest for product '{}'", product_type);

        let client = self.authenticate().await?;
        let guid = self.product_guid_with(&client, product_type).await?;
        let bytes = self.manifest_bytes_with(&client, &guid).await?;
        Ok(Manifest::from_slice(&bytes)?)
    }

    /// Fetch and load the staged manifest of a product GUID
    pub async fn get_staged_product_manifest_by_guid(&self, guid: &str) -> Result<Manifest> {
        let client = self.authenticate().await?;
        let bytes = self.manifest_bytes_with(&client, guid).await?;
        Ok(Manifest::from_slice(&bytes)?)
    }

    /// Fetch the staged manifest of a product type as YAML text
    ///
    /// The `manifest` document is extracted from the response envelope and
    /// re-serialized unchanged.
    pub async fn get_raw_staged_product_manifest(&self, product_type: &str) -> Result<String> {
        let client = self.authenticate().await?;
        let guid = self.product_guid_with(&client, product_type).await?;
        let bytes = self.manifest_bytes_with(&client, &guid).await?;

        let envelope: YamlValue = serde_yaml::from_slice(&bytes)
            .map_err(|e| FetchError::parse_error("staged manifest response", e))?;

        match envelope.get(MANIFEST_KEY) {
            Some(manifest @ YamlValue::Mapping(_)) => serde_yaml::to_string(manifest)
                .map_err(|e| FetchError::parse_error("staged manifest", e)),
            _ => Err(FetchError::MissingManifest { guid }),
        }
    }

    async fn staged_products_with(&self, client: &AuthenticatedClient) -> Result<Vec<Product>> {
        let bytes = self.get_bytes(client, STAGED_PRODUCTS_PATH).await?;
        serde_yaml::from_slice(&bytes).map_err(|e| FetchError::parse_error("staged products list", e))
    }

    async fn product_guid_with(&self, client: &AuthenticatedClient, product_type: &str) -> Result<String> {
        let products = self.staged_products_with(client).await?;

        let guid = products
            .into_iter()
            .find(|product| product.product_type == product_type)
            .map(|product| product.guid)
            .ok_or_else(|| FetchError::ProductNotFound {
                product_type: product_type.to_string(),
            })?;

        debug!("Product '{}' has staged GUID {}", product_type, guid);
        Ok(guid)
    }

    async fn manifest_bytes_with(&self, client: &AuthenticatedClient, guid: &str) -> Result<Vec<u8>> {
        let path = format!("{}/{}/manifest", STAGED_PRODUCTS_PATH, guid);
        self.get_bytes(client, &path).await
    }

    /// GET an API path and return the body of a 200 response
    async fn get_bytes(&self, client: &AuthenticatedClient, path: &str) -> Result<Vec<u8>> {
        let url = self.config.endpoint(path)?;
        debug!("Ops Manager request: GET {}", url);

        let response = client.get(url.clone()).send().await?;
        let status = response.status();
        debug!("Ops Manager response: {} from {}", status, url);

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
