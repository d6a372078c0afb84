//! Where a manifest comes from
//!
//! [`ManifestSource`] lets callers load a manifest without caring whether it
//! lives on disk or behind the Ops Manager API.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::error::Result;
use super::ops_manager::OpsManagerAPI;
use crate::manifest::Manifest;

/// Something a [`Manifest`] can be loaded from
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Load the manifest
    async fn load(&self) -> Result<Manifest>;

    /// Human-readable description for logs and error messages
    fn describe(&self) -> String;
}

/// A manifest file on disk, bare or wrapped in `manifest:`
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ManifestSource for FileSource {
    async fn load(&self) -> Result<Manifest> {
        info!("Loading manifest from {}", self.describe());
        Ok(Manifest::from_path(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// The staged manifest of one product type
#[derive(Debug, Clone)]
pub struct OpsManagerSource {
    api: OpsManagerAPI,
    product_type: String,
}

impl OpsManagerSource {
    pub fn new<S: Into<String>>(api: OpsManagerAPI, product_type: S) -> Self {
        Self {
            api,
            product_type: product_type.into(),
        }
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }
}

#[async_trait]
impl ManifestSource for OpsManagerSource {
    async fn load(&self) -> Result<Manifest> {
        self.api.get_staged_product_manifest(&self.product_type).await
    }

    fn describe(&self) -> String {
        format!("staged product '{}' at {}", self.product_type, self.api.config().url)
    }
}
